use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use fairway_bookings::BookingDetail;
use fairway_golfers::Golfer;
use fairway_infra::{GolferProfile, ServiceError};
use fairway_teetimes::TeeTime;

// -------------------------
// Request DTOs
// -------------------------

/// Body for registering a golfer and for full profile replacement.
#[derive(Debug, Deserialize)]
pub struct GolferRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl From<GolferRequest> for GolferProfile {
    fn from(body: GolferRequest) -> Self {
        GolferProfile {
            name: body.name,
            email: body.email,
            phone: body.phone,
            notes: body.notes,
        }
    }
}

/// Body for scheduling a tee time. `available_slots` is not accepted; it
/// always starts at `capacity`.
#[derive(Debug, Deserialize)]
pub struct ScheduleTeeTimeRequest {
    pub start_time: DateTime<Utc>,
    pub course_section: Option<String>,
    pub capacity: Option<i64>,
}

/// Body for editing a tee time. Omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct RescheduleTeeTimeRequest {
    pub start_time: DateTime<Utc>,
    pub course_section: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub tee_time_id: String,
    pub golfer_id: String,
    pub number_of_players: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTeeTimesQuery {
    /// `start_time` (default) or `-start_time`.
    pub ordering: Option<String>,
}

/// Narrow a client-supplied capacity to the domain's range.
pub fn capacity(raw: Option<i64>) -> Result<Option<u32>, ServiceError> {
    raw.map(|c| {
        u32::try_from(c)
            .ok()
            .filter(|c| *c >= 1)
            .ok_or_else(|| ServiceError::Validation("capacity must be at least 1".to_string()))
    })
    .transpose()
}

// -------------------------
// Response mapping
// -------------------------

pub fn golfer_to_json(golfer: &Golfer) -> Value {
    json!({
        "id": golfer.id_typed().to_string(),
        "name": golfer.name(),
        "email": golfer.email().as_str(),
        "phone": golfer.phone(),
        "notes": golfer.notes(),
        "created_at": golfer.created_at(),
        "updated_at": golfer.updated_at(),
    })
}

pub fn tee_time_to_json(tee_time: &TeeTime) -> Value {
    json!({
        "id": tee_time.id_typed().to_string(),
        "start_time": tee_time.start_time(),
        "course_section": tee_time.course_section(),
        "capacity": tee_time.capacity(),
        "available_slots": tee_time.available_slots(),
        "booked_players": tee_time.booked_players(),
        "version": fairway_core::AggregateRoot::version(tee_time),
        "created_at": tee_time.created_at(),
        "updated_at": tee_time.updated_at(),
    })
}

pub fn booking_to_json(detail: &BookingDetail) -> Value {
    json!({
        "id": detail.booking.id_typed().to_string(),
        "tee_time": tee_time_to_json(&detail.tee_time),
        "golfer": golfer_to_json(&detail.golfer),
        "number_of_players": detail.booking.number_of_players().get(),
        "booking_time": detail.booking.booking_time(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_accepts_positive_and_absent() {
        assert_eq!(capacity(None).unwrap(), None);
        assert_eq!(capacity(Some(6)).unwrap(), Some(6));
    }

    #[test]
    fn capacity_rejects_zero_negative_and_huge() {
        for raw in [0, -4, i64::from(u32::MAX) + 1] {
            assert!(matches!(capacity(Some(raw)), Err(ServiceError::Validation(_))));
        }
    }
}
