use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use fairway_bookings::{Booking, BookingDetail};
use fairway_core::{AggregateRoot, BookingId, ExpectedVersion, GolferId, TeeTimeId};
use fairway_golfers::Golfer;
use fairway_teetimes::TeeTime;

use super::{BookingStore, Removal, StoreError, StoreResult, UniqueKey, with_available_slots};

#[derive(Debug, Default)]
struct Tables {
    golfers: HashMap<GolferId, Golfer>,
    tee_times: HashMap<TeeTimeId, TeeTime>,
    bookings: HashMap<BookingId, Booking>,
}

impl Tables {
    fn booked_players(&self, tee_time_id: TeeTimeId) -> u32 {
        self.bookings
            .values()
            .filter(|b| b.tee_time_id() == tee_time_id)
            .map(|b| b.number_of_players().get())
            .sum()
    }

    /// Stored tee time at the expected version.
    fn checked_tee_time(
        &self,
        tee_time_id: TeeTimeId,
        expected: ExpectedVersion,
    ) -> StoreResult<&TeeTime> {
        let current = self
            .tee_times
            .get(&tee_time_id)
            .ok_or(StoreError::NotFound("tee time"))?;
        if !expected.matches(current.version()) {
            return Err(StoreError::Concurrency(format!(
                "tee time {tee_time_id}: expected {expected:?}, found {}",
                current.version()
            )));
        }
        Ok(current)
    }

    /// `tee_time` with its slots re-derived from the current booking set.
    fn derive(&self, tee_time: &TeeTime) -> StoreResult<TeeTime> {
        let booked = self.booked_players(tee_time.id_typed());
        let available = tee_time.capacity().checked_sub(booked).ok_or_else(|| {
            StoreError::Concurrency(format!(
                "tee time {} would be oversubscribed ({booked} booked, capacity {})",
                tee_time.id_typed(),
                tee_time.capacity()
            ))
        })?;
        Ok(with_available_slots(tee_time, available))
    }

    fn start_time_taken(&self, start_time: DateTime<Utc>, except: TeeTimeId) -> bool {
        self.tee_times
            .values()
            .any(|t| t.start_time() == start_time && t.id_typed() != except)
    }

    fn email_taken(&self, golfer: &Golfer) -> bool {
        self.golfers
            .values()
            .any(|g| g.email() == golfer.email() && g.id_typed() != golfer.id_typed())
    }
}

/// In-memory store for tests/dev.
///
/// One lock guards all three tables, and every write runs under a single
/// write guard, so each operation is atomic and serializable.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    tables: RwLock<Tables>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_golfer(&self, golfer: &Golfer) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.email_taken(golfer) {
            return Err(StoreError::UniqueViolation(UniqueKey::GolferEmail));
        }
        if tables.golfers.contains_key(&golfer.id_typed()) {
            return Err(StoreError::Concurrency(format!(
                "golfer {} already exists",
                golfer.id_typed()
            )));
        }
        tables.golfers.insert(golfer.id_typed(), golfer.clone());
        Ok(())
    }

    async fn update_golfer(&self, golfer: &Golfer) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.golfers.contains_key(&golfer.id_typed()) {
            return Err(StoreError::NotFound("golfer"));
        }
        if tables.email_taken(golfer) {
            return Err(StoreError::UniqueViolation(UniqueKey::GolferEmail));
        }
        tables.golfers.insert(golfer.id_typed(), golfer.clone());
        Ok(())
    }

    async fn delete_golfer(&self, golfer_id: GolferId, at: DateTime<Utc>) -> StoreResult<Removal> {
        let mut tables = self.write()?;
        if !tables.golfers.contains_key(&golfer_id) {
            return Err(StoreError::NotFound("golfer"));
        }

        let doomed: Vec<BookingId> = tables
            .bookings
            .values()
            .filter(|b| b.golfer_id() == golfer_id)
            .map(|b| b.id_typed())
            .collect();
        let released: HashSet<TeeTimeId> = doomed
            .iter()
            .filter_map(|id| tables.bookings.get(id))
            .map(|b| b.tee_time_id())
            .collect();

        // Every released tee time is decided before the tables change.
        let mut updated = Vec::with_capacity(released.len());
        for tee_time_id in released {
            let Some(current) = tables.tee_times.get(&tee_time_id) else {
                continue;
            };
            let remaining: u32 = tables
                .bookings
                .values()
                .filter(|b| b.tee_time_id() == tee_time_id && b.golfer_id() != golfer_id)
                .map(|b| b.number_of_players().get())
                .sum();
            updated.push(TeeTime::restore(
                current.id_typed(),
                current.start_time(),
                current.course_section().to_string(),
                current.capacity(),
                current.capacity().saturating_sub(remaining),
                current.version() + 1,
                current.created_at(),
                at,
            ));
        }

        tables.golfers.remove(&golfer_id);
        for id in &doomed {
            tables.bookings.remove(id);
        }
        for tee_time in updated {
            tables.tee_times.insert(tee_time.id_typed(), tee_time);
        }

        Ok(Removal {
            bookings_removed: doomed.len(),
        })
    }

    async fn golfer(&self, golfer_id: GolferId) -> StoreResult<Option<Golfer>> {
        Ok(self.read()?.golfers.get(&golfer_id).cloned())
    }

    async fn list_golfers(&self) -> StoreResult<Vec<Golfer>> {
        let mut golfers: Vec<Golfer> = self.read()?.golfers.values().cloned().collect();
        golfers.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.id_typed().cmp(&b.id_typed()))
        });
        Ok(golfers)
    }

    async fn insert_tee_time(&self, tee_time: &TeeTime) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.start_time_taken(tee_time.start_time(), tee_time.id_typed()) {
            return Err(StoreError::UniqueViolation(UniqueKey::TeeTimeStartTime));
        }
        if tables.tee_times.contains_key(&tee_time.id_typed()) {
            return Err(StoreError::Concurrency(format!(
                "tee time {} already exists",
                tee_time.id_typed()
            )));
        }
        let derived = tables.derive(tee_time)?;
        tables.tee_times.insert(tee_time.id_typed(), derived);
        Ok(())
    }

    async fn update_tee_time(
        &self,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        let mut tables = self.write()?;
        tables.checked_tee_time(tee_time.id_typed(), expected)?;
        if tables.start_time_taken(tee_time.start_time(), tee_time.id_typed()) {
            return Err(StoreError::UniqueViolation(UniqueKey::TeeTimeStartTime));
        }
        let derived = tables.derive(tee_time)?;
        tables.tee_times.insert(tee_time.id_typed(), derived.clone());
        Ok(derived)
    }

    async fn delete_tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Removal> {
        let mut tables = self.write()?;
        if tables.tee_times.remove(&tee_time_id).is_none() {
            return Err(StoreError::NotFound("tee time"));
        }
        let before = tables.bookings.len();
        tables.bookings.retain(|_, b| b.tee_time_id() != tee_time_id);
        Ok(Removal {
            bookings_removed: before - tables.bookings.len(),
        })
    }

    async fn tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Option<TeeTime>> {
        Ok(self.read()?.tee_times.get(&tee_time_id).cloned())
    }

    async fn list_tee_times(&self) -> StoreResult<Vec<TeeTime>> {
        let mut tee_times: Vec<TeeTime> = self.read()?.tee_times.values().cloned().collect();
        tee_times.sort_by_key(|t| t.start_time());
        Ok(tee_times)
    }

    async fn booking(&self, booking_id: BookingId) -> StoreResult<Option<Booking>> {
        Ok(self.read()?.bookings.get(&booking_id).cloned())
    }

    async fn list_bookings(&self) -> StoreResult<Vec<BookingDetail>> {
        let tables = self.read()?;
        let mut bookings: Vec<&Booking> = tables.bookings.values().collect();
        bookings.sort_by_key(|b| (b.booking_time(), b.id_typed()));

        bookings
            .into_iter()
            .map(|booking| {
                let dangling = |what: &str| {
                    StoreError::Backend(format!("booking {} references a missing {what}", booking.id_typed()))
                };
                Ok(BookingDetail {
                    booking: booking.clone(),
                    tee_time: tables
                        .tee_times
                        .get(&booking.tee_time_id())
                        .cloned()
                        .ok_or_else(|| dangling("tee time"))?,
                    golfer: tables
                        .golfers
                        .get(&booking.golfer_id())
                        .cloned()
                        .ok_or_else(|| dangling("golfer"))?,
                })
            })
            .collect()
    }

    async fn commit_booking(
        &self,
        booking: &Booking,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        let mut tables = self.write()?;
        tables.checked_tee_time(tee_time.id_typed(), expected)?;
        if booking.tee_time_id() != tee_time.id_typed() {
            return Err(StoreError::Backend(
                "booking and tee time do not belong together".to_string(),
            ));
        }
        if !tables.golfers.contains_key(&booking.golfer_id()) {
            return Err(StoreError::NotFound("golfer"));
        }
        if tables.bookings.contains_key(&booking.id_typed()) {
            return Err(StoreError::Concurrency(format!(
                "booking {} already exists",
                booking.id_typed()
            )));
        }

        // Check the derived count before touching anything so a failure
        // leaves the tables as they were.
        let booked = tables.booked_players(tee_time.id_typed()) + booking.number_of_players().get();
        let available = tee_time.capacity().checked_sub(booked).ok_or_else(|| {
            StoreError::Concurrency(format!(
                "tee time {} would be oversubscribed",
                tee_time.id_typed()
            ))
        })?;

        let stored = with_available_slots(tee_time, available);
        tables.bookings.insert(booking.id_typed(), booking.clone());
        tables.tee_times.insert(tee_time.id_typed(), stored.clone());
        Ok(stored)
    }

    async fn remove_booking(
        &self,
        booking_id: BookingId,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        let mut tables = self.write()?;
        tables.checked_tee_time(tee_time.id_typed(), expected)?;
        let players = match tables.bookings.get(&booking_id) {
            None => return Err(StoreError::NotFound("booking")),
            Some(b) if b.tee_time_id() != tee_time.id_typed() => {
                return Err(StoreError::Backend(
                    "booking and tee time do not belong together".to_string(),
                ));
            }
            Some(b) => b.number_of_players().get(),
        };

        let remaining = tables.booked_players(tee_time.id_typed()) - players;
        let available = tee_time.capacity().checked_sub(remaining).ok_or_else(|| {
            StoreError::Concurrency(format!(
                "tee time {} would be oversubscribed",
                tee_time.id_typed()
            ))
        })?;

        let stored = with_available_slots(tee_time, available);
        tables.bookings.remove(&booking_id);
        tables.tee_times.insert(tee_time.id_typed(), stored.clone());
        Ok(stored)
    }
}
