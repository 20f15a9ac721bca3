//! Storage port for golfers, tee times and bookings.
//!
//! `BookingStore` is the only way services touch persisted state. Every
//! method is a single unit of work: either all of its writes land or none do.
//!
//! ## Slot derivation
//!
//! Whenever a tee time row is written, the store recomputes
//! `available_slots = capacity - Σ number_of_players` over the tee time's
//! bookings inside the same unit of work. The value passed in by the caller
//! is never trusted on its own.
//!
//! ## Optimistic concurrency
//!
//! Tee time writes carry an [`ExpectedVersion`]. If the stored version
//! differs, the write fails with [`StoreError::Concurrency`] and nothing is
//! changed. Callers decide whether to retry.
//!
//! ## Cascades
//!
//! Deleting a golfer or a tee time deletes their bookings explicitly, in the
//! same unit of work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use fairway_bookings::{Booking, BookingDetail};
use fairway_core::{BookingId, ExpectedVersion, GolferId, TeeTimeId};
use fairway_golfers::Golfer;
use fairway_teetimes::TeeTime;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;

/// Unique keys the store enforces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniqueKey {
    GolferEmail,
    TeeTimeStartTime,
}

impl core::fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UniqueKey::GolferEmail => f.write_str("golfers.email"),
            UniqueKey::TeeTimeStartTime => f.write_str("tee_times.start_time"),
        }
    }
}

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation, capacity).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("unique constraint violated on {0}")]
    UniqueViolation(UniqueKey),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What a cascading delete took with it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Removal {
    pub bookings_removed: usize,
}

#[async_trait::async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_golfer(&self, golfer: &Golfer) -> StoreResult<()>;

    /// Replace a golfer's profile. Email stays unique across golfers.
    async fn update_golfer(&self, golfer: &Golfer) -> StoreResult<()>;

    /// Delete a golfer and its bookings, releasing their players back to the
    /// tee times they held (each affected tee time is re-derived and its
    /// version bumped, stamped `at`).
    async fn delete_golfer(&self, golfer_id: GolferId, at: DateTime<Utc>) -> StoreResult<Removal>;

    async fn golfer(&self, golfer_id: GolferId) -> StoreResult<Option<Golfer>>;

    /// All golfers, ordered by name (then id).
    async fn list_golfers(&self) -> StoreResult<Vec<Golfer>>;

    async fn insert_tee_time(&self, tee_time: &TeeTime) -> StoreResult<()>;

    /// Write a tee time's schedule fields, capacity and version.
    ///
    /// Returns the row as stored, with `available_slots` re-derived.
    async fn update_tee_time(
        &self,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime>;

    /// Delete a tee time and its bookings. No capacity is restored anywhere.
    async fn delete_tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Removal>;

    async fn tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Option<TeeTime>>;

    /// All tee times, ordered by start time ascending.
    async fn list_tee_times(&self) -> StoreResult<Vec<TeeTime>>;

    async fn booking(&self, booking_id: BookingId) -> StoreResult<Option<Booking>>;

    /// All bookings, ordered by booking time (then id), each joined with its
    /// tee time and golfer from the same snapshot.
    async fn list_bookings(&self) -> StoreResult<Vec<BookingDetail>>;

    /// Insert `booking` and write `tee_time` (its version and timestamp) as
    /// one unit. The golfer must still exist.
    async fn commit_booking(
        &self,
        booking: &Booking,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime>;

    /// Delete a booking and write `tee_time` (its version and timestamp) as
    /// one unit.
    async fn remove_booking(
        &self,
        booking_id: BookingId,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime>;
}

#[async_trait::async_trait]
impl<S> BookingStore for Arc<S>
where
    S: BookingStore + ?Sized,
{
    async fn insert_golfer(&self, golfer: &Golfer) -> StoreResult<()> {
        (**self).insert_golfer(golfer).await
    }

    async fn update_golfer(&self, golfer: &Golfer) -> StoreResult<()> {
        (**self).update_golfer(golfer).await
    }

    async fn delete_golfer(&self, golfer_id: GolferId, at: DateTime<Utc>) -> StoreResult<Removal> {
        (**self).delete_golfer(golfer_id, at).await
    }

    async fn golfer(&self, golfer_id: GolferId) -> StoreResult<Option<Golfer>> {
        (**self).golfer(golfer_id).await
    }

    async fn list_golfers(&self) -> StoreResult<Vec<Golfer>> {
        (**self).list_golfers().await
    }

    async fn insert_tee_time(&self, tee_time: &TeeTime) -> StoreResult<()> {
        (**self).insert_tee_time(tee_time).await
    }

    async fn update_tee_time(
        &self,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        (**self).update_tee_time(tee_time, expected).await
    }

    async fn delete_tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Removal> {
        (**self).delete_tee_time(tee_time_id).await
    }

    async fn tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Option<TeeTime>> {
        (**self).tee_time(tee_time_id).await
    }

    async fn list_tee_times(&self) -> StoreResult<Vec<TeeTime>> {
        (**self).list_tee_times().await
    }

    async fn booking(&self, booking_id: BookingId) -> StoreResult<Option<Booking>> {
        (**self).booking(booking_id).await
    }

    async fn list_bookings(&self) -> StoreResult<Vec<BookingDetail>> {
        (**self).list_bookings().await
    }

    async fn commit_booking(
        &self,
        booking: &Booking,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        (**self).commit_booking(booking, tee_time, expected).await
    }

    async fn remove_booking(
        &self,
        booking_id: BookingId,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        (**self).remove_booking(booking_id, tee_time, expected).await
    }
}

/// Rebuild `tee_time` with a derived slot count (used by store implementations).
pub(crate) fn with_available_slots(tee_time: &TeeTime, available_slots: u32) -> TeeTime {
    TeeTime::restore(
        tee_time.id_typed(),
        tee_time.start_time(),
        tee_time.course_section().to_string(),
        tee_time.capacity(),
        available_slots,
        fairway_core::AggregateRoot::version(tee_time),
        tee_time.created_at(),
        tee_time.updated_at(),
    )
}
