use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fairway_core::{BookingId, DomainError, DomainResult, Entity, GolferId, TeeTimeId, ValueObject};
use fairway_golfers::Golfer;
use fairway_teetimes::TeeTime;

/// Number of players on a booking (always at least one).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct PlayerCount(u32);

impl PlayerCount {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 1 {
            return Err(DomainError::validation("number_of_players must be at least 1"));
        }
        let value = u32::try_from(value)
            .map_err(|_| DomainError::validation("number_of_players is too large"))?;
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl ValueObject for PlayerCount {}

impl TryFrom<i64> for PlayerCount {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerCount> for u32 {
    fn from(value: PlayerCount) -> Self {
        value.0
    }
}

/// Entity: Booking. Immutable once placed; cancellation deletes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    id: BookingId,
    tee_time_id: TeeTimeId,
    golfer_id: GolferId,
    number_of_players: PlayerCount,
    booking_time: DateTime<Utc>,
}

/// Command: PlaceBooking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBooking {
    pub booking_id: BookingId,
    pub tee_time_id: TeeTimeId,
    pub golfer_id: GolferId,
    pub number_of_players: PlayerCount,
    pub requested_at: DateTime<Utc>,
}

impl Booking {
    /// Decide a new booking against the current tee time.
    ///
    /// Returns the booking and the tee time with its slots taken. On
    /// `CapacityExceeded` nothing is produced, so there is nothing to persist.
    pub fn place(cmd: &PlaceBooking, tee_time: &TeeTime) -> DomainResult<(Self, TeeTime)> {
        if cmd.tee_time_id != tee_time.id_typed() {
            return Err(DomainError::validation("tee_time_id mismatch"));
        }

        let reserved = tee_time.reserve(cmd.number_of_players.get(), cmd.requested_at)?;
        let booking = Self {
            id: cmd.booking_id,
            tee_time_id: cmd.tee_time_id,
            golfer_id: cmd.golfer_id,
            number_of_players: cmd.number_of_players,
            booking_time: cmd.requested_at,
        };
        Ok((booking, reserved))
    }

    /// Decide the tee time after this booking is cancelled.
    pub fn cancel(&self, tee_time: &TeeTime, at: DateTime<Utc>) -> DomainResult<TeeTime> {
        if self.tee_time_id != tee_time.id_typed() {
            return Err(DomainError::validation("booking does not belong to this tee time"));
        }
        Ok(tee_time.release(self.number_of_players.get(), at))
    }

    /// Rebuild a booking from persisted columns.
    pub fn restore(
        id: BookingId,
        tee_time_id: TeeTimeId,
        golfer_id: GolferId,
        number_of_players: PlayerCount,
        booking_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tee_time_id,
            golfer_id,
            number_of_players,
            booking_time,
        }
    }

    pub fn id_typed(&self) -> BookingId {
        self.id
    }

    pub fn tee_time_id(&self) -> TeeTimeId {
        self.tee_time_id
    }

    pub fn golfer_id(&self) -> GolferId {
        self.golfer_id
    }

    pub fn number_of_players(&self) -> PlayerCount {
        self.number_of_players
    }

    pub fn booking_time(&self) -> DateTime<Utc> {
        self.booking_time
    }
}

impl Entity for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Read view: a booking with its tee time and golfer resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDetail {
    pub booking: Booking,
    pub tee_time: TeeTime,
    pub golfer: Golfer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fairway_teetimes::ScheduleTeeTime;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 14, 8, 10, 0).unwrap()
    }

    fn tee_time_with(capacity: u32) -> TeeTime {
        TeeTime::schedule(&ScheduleTeeTime {
            tee_time_id: TeeTimeId::new(),
            start_time: test_time(),
            course_section: None,
            capacity,
            occurred_at: test_time(),
        })
        .unwrap()
    }

    fn place_cmd(tee_time: &TeeTime, players: i64) -> PlaceBooking {
        PlaceBooking {
            booking_id: BookingId::new(),
            tee_time_id: tee_time.id_typed(),
            golfer_id: GolferId::new(),
            number_of_players: PlayerCount::new(players).unwrap(),
            requested_at: test_time(),
        }
    }

    #[test]
    fn player_count_rejects_zero_and_negative() {
        for raw in [0, -1, i64::MIN] {
            assert!(matches!(PlayerCount::new(raw), Err(DomainError::Validation(_))));
        }
        assert!(PlayerCount::new(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(PlayerCount::new(3).unwrap().get(), 3);
    }

    #[test]
    fn place_takes_slots_and_stamps_booking_time() {
        let tt = tee_time_with(4);
        let cmd = place_cmd(&tt, 3);

        let (booking, reserved) = Booking::place(&cmd, &tt).unwrap();
        assert_eq!(booking.id_typed(), cmd.booking_id);
        assert_eq!(booking.booking_time(), cmd.requested_at);
        assert_eq!(booking.number_of_players().get(), 3);
        assert_eq!(reserved.available_slots(), 1);
        // Deciding leaves the input aggregate untouched.
        assert_eq!(tt.available_slots(), 4);
    }

    #[test]
    fn place_over_capacity_produces_nothing() {
        let tt = tee_time_with(2);
        let err = Booking::place(&place_cmd(&tt, 3), &tt).unwrap_err();
        assert_eq!(err, DomainError::capacity_exceeded(3, 2));
    }

    #[test]
    fn place_rejects_foreign_tee_time() {
        let tt = tee_time_with(4);
        let other = tee_time_with(4);
        assert!(matches!(
            Booking::place(&place_cmd(&other, 1), &tt),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn cancel_restores_capacity() {
        let tt = tee_time_with(4);
        let (booking, full) = Booking::place(&place_cmd(&tt, 4), &tt).unwrap();
        assert_eq!(full.available_slots(), 0);

        let restored = booking.cancel(&full, test_time()).unwrap();
        assert_eq!(restored.available_slots(), 4);
    }

    #[test]
    fn player_count_deserializes_with_validation() {
        let ok: PlaceBooking = serde_json::from_value(serde_json::json!({
            "booking_id": BookingId::new(),
            "tee_time_id": TeeTimeId::new(),
            "golfer_id": GolferId::new(),
            "number_of_players": 2,
            "requested_at": test_time(),
        }))
        .unwrap();
        assert_eq!(ok.number_of_players.get(), 2);
    }

    proptest! {
        /// Property: placing then cancelling any sequence of bookings returns
        /// the tee time to full capacity, and slots + booked always equals capacity.
        #[test]
        fn place_then_cancel_conserves_capacity(
            capacity in 1u32..10,
            requests in prop::collection::vec(1i64..5, 0..12)
        ) {
            let mut tt = tee_time_with(capacity);
            let mut placed = Vec::new();

            for players in requests {
                if let Ok((booking, next)) = Booking::place(&place_cmd(&tt, players), &tt) {
                    tt = next;
                    placed.push(booking);
                }
                let booked: u32 = placed.iter().map(|b| b.number_of_players().get()).sum();
                prop_assert_eq!(tt.available_slots() + booked, capacity);
            }

            for booking in placed.iter().rev() {
                tt = booking.cancel(&tt, test_time()).unwrap();
            }
            prop_assert_eq!(tt.available_slots(), capacity);
        }
    }
}
