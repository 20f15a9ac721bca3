//! Booking ledger: the only writer of tee time slot counts.
//!
//! Each write follows the same path:
//!
//! ```text
//! load tee time (and golfer)
//!   ↓
//! decide in domain code (Booking::place / Booking::cancel), no mutation
//!   ↓
//! commit booking + tee time in one store call, CAS on the loaded version
//! ```
//!
//! A lost CAS surfaces as [`ServiceError::Conflict`]. The ledger never retries.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use fairway_bookings::{Booking, BookingDetail, PlaceBooking, PlayerCount};
use fairway_core::{AggregateRoot, BookingId, ExpectedVersion, GolferId, TeeTimeId};
use fairway_teetimes::TeeTime;

use crate::error::{ServiceError, ServiceResult};
use crate::store::BookingStore;

/// Sort order for [`BookingLedger::list_tee_times`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TeeTimeOrder {
    #[default]
    StartTimeAsc,
    StartTimeDesc,
}

impl FromStr for TeeTimeOrder {
    type Err = ServiceError;

    /// Accepts `start_time` and `-start_time`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start_time" => Ok(TeeTimeOrder::StartTimeAsc),
            "-start_time" => Ok(TeeTimeOrder::StartTimeDesc),
            other => Err(ServiceError::Validation(format!(
                "unsupported ordering '{other}' (use start_time or -start_time)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingLedger<S> {
    store: S,
}

impl<S> BookingLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: BookingStore> BookingLedger<S> {
    /// Reserve `number_of_players` slots on a tee time for a golfer.
    ///
    /// On `CapacityExceeded` nothing is written.
    #[instrument(
        skip(self),
        fields(tee_time_id = %tee_time_id, golfer_id = %golfer_id),
        err
    )]
    pub async fn create_booking(
        &self,
        tee_time_id: TeeTimeId,
        golfer_id: GolferId,
        number_of_players: i64,
        requested_at: DateTime<Utc>,
    ) -> ServiceResult<BookingDetail> {
        let number_of_players = PlayerCount::new(number_of_players)?;
        let tee_time = self.load_tee_time(tee_time_id).await?;
        let golfer = self
            .store
            .golfer(golfer_id)
            .await?
            .ok_or(ServiceError::NotFound("golfer"))?;

        let cmd = PlaceBooking {
            booking_id: BookingId::new(),
            tee_time_id,
            golfer_id,
            number_of_players,
            requested_at,
        };
        let (booking, reserved) = Booking::place(&cmd, &tee_time)?;

        let stored = self
            .store
            .commit_booking(&booking, &reserved, ExpectedVersion::Exact(tee_time.version()))
            .await?;

        info!(
            booking_id = %booking.id_typed(),
            players = number_of_players.get(),
            available_slots = stored.available_slots(),
            "booking created"
        );

        Ok(BookingDetail {
            booking,
            tee_time: stored,
            golfer,
        })
    }

    /// Delete a booking and give its players back to the tee time.
    #[instrument(skip(self), fields(booking_id = %booking_id), err)]
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        requested_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        let booking = self.load_booking(booking_id).await?;
        // A missing tee time means the booking went with it.
        let tee_time = self
            .store
            .tee_time(booking.tee_time_id())
            .await?
            .ok_or(ServiceError::NotFound("booking"))?;

        let released = booking.cancel(&tee_time, requested_at)?;
        let stored = self
            .store
            .remove_booking(booking_id, &released, ExpectedVersion::Exact(tee_time.version()))
            .await?;

        info!(
            tee_time_id = %stored.id_typed(),
            available_slots = stored.available_slots(),
            "booking cancelled"
        );
        Ok(())
    }

    pub async fn list_tee_times(&self, order: TeeTimeOrder) -> ServiceResult<Vec<TeeTime>> {
        let mut tee_times = self.store.list_tee_times().await?;
        if order == TeeTimeOrder::StartTimeDesc {
            tee_times.reverse();
        }
        Ok(tee_times)
    }

    pub async fn get_tee_time(&self, tee_time_id: TeeTimeId) -> ServiceResult<TeeTime> {
        self.load_tee_time(tee_time_id).await
    }

    pub async fn get_booking(&self, booking_id: BookingId) -> ServiceResult<BookingDetail> {
        let booking = self.load_booking(booking_id).await?;
        let tee_time = self.store.tee_time(booking.tee_time_id()).await?;
        let golfer = self.store.golfer(booking.golfer_id()).await?;

        match (tee_time, golfer) {
            (Some(tee_time), Some(golfer)) => Ok(BookingDetail {
                booking,
                tee_time,
                golfer,
            }),
            // Removed by a cascade between reads.
            _ => Err(ServiceError::NotFound("booking")),
        }
    }

    /// All bookings by booking time, each with its tee time and golfer.
    pub async fn list_bookings(&self) -> ServiceResult<Vec<BookingDetail>> {
        Ok(self.store.list_bookings().await?)
    }

    async fn load_tee_time(&self, tee_time_id: TeeTimeId) -> ServiceResult<TeeTime> {
        self.store
            .tee_time(tee_time_id)
            .await?
            .ok_or(ServiceError::NotFound("tee time"))
    }

    async fn load_booking(&self, booking_id: BookingId) -> ServiceResult<Booking> {
        self.store
            .booking(booking_id)
            .await?
            .ok_or(ServiceError::NotFound("booking"))
    }
}
