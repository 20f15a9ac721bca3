use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use fairway_core::{AggregateRoot, ExpectedVersion, TeeTimeId};
use fairway_teetimes::{DEFAULT_CAPACITY, RescheduleTeeTime, ScheduleTeeTime, TeeTime};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{BookingStore, Removal};

/// Scheduling of tee times. Never touches slot counts directly.
#[derive(Debug, Clone)]
pub struct TeeSheet<S> {
    store: S,
    default_capacity: u32,
}

impl<S> TeeSheet<S> {
    pub fn new(store: S) -> Self {
        Self::with_default_capacity(store, DEFAULT_CAPACITY)
    }

    /// Capacity used when `schedule` is not given one.
    pub fn with_default_capacity(store: S, default_capacity: u32) -> Self {
        Self {
            store,
            default_capacity,
        }
    }

    pub fn default_capacity(&self) -> u32 {
        self.default_capacity
    }
}

impl<S: BookingStore> TeeSheet<S> {
    /// Add a fully available tee time. A taken `start_time` is a `Validation` error.
    #[instrument(skip(self, course_section), fields(start_time = %start_time), err)]
    pub async fn schedule(
        &self,
        start_time: DateTime<Utc>,
        course_section: Option<String>,
        capacity: Option<u32>,
        at: DateTime<Utc>,
    ) -> ServiceResult<TeeTime> {
        let tee_time = TeeTime::schedule(&ScheduleTeeTime {
            tee_time_id: TeeTimeId::new(),
            start_time,
            course_section,
            capacity: capacity.unwrap_or(self.default_capacity),
            occurred_at: at,
        })?;
        self.store.insert_tee_time(&tee_time).await?;

        info!(tee_time_id = %tee_time.id_typed(), capacity = tee_time.capacity(), "tee time scheduled");
        Ok(tee_time)
    }

    /// Edit start time, section and capacity. Bookings stay; slots are
    /// re-derived. `None` keeps the current section or capacity.
    #[instrument(skip(self, course_section), fields(tee_time_id = %tee_time_id), err)]
    pub async fn reschedule(
        &self,
        tee_time_id: TeeTimeId,
        start_time: DateTime<Utc>,
        course_section: Option<String>,
        capacity: Option<u32>,
        at: DateTime<Utc>,
    ) -> ServiceResult<TeeTime> {
        let current = self
            .store
            .tee_time(tee_time_id)
            .await?
            .ok_or(ServiceError::NotFound("tee time"))?;

        let next = current.rescheduled(&RescheduleTeeTime {
            tee_time_id,
            start_time,
            course_section: course_section.unwrap_or_else(|| current.course_section().to_string()),
            capacity,
            occurred_at: at,
        })?;

        Ok(self
            .store
            .update_tee_time(&next, ExpectedVersion::Exact(current.version()))
            .await?)
    }

    /// Delete the tee time and its bookings.
    #[instrument(skip(self), fields(tee_time_id = %tee_time_id), err)]
    pub async fn remove(&self, tee_time_id: TeeTimeId) -> ServiceResult<Removal> {
        let removal = self.store.delete_tee_time(tee_time_id).await?;
        info!(bookings_removed = removal.bookings_removed, "tee time removed");
        Ok(removal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use fairway_teetimes::DEFAULT_COURSE_SECTION;

    use crate::store::InMemoryBookingStore;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 12, 6, 50, 0).unwrap()
    }

    #[tokio::test]
    async fn schedule_applies_defaults() {
        let sheet = TeeSheet::new(InMemoryBookingStore::new());
        let tt = sheet.schedule(test_time(), None, None, test_time()).await.unwrap();

        assert_eq!(tt.capacity(), DEFAULT_CAPACITY);
        assert_eq!(tt.available_slots(), DEFAULT_CAPACITY);
        assert_eq!(tt.course_section(), DEFAULT_COURSE_SECTION);
    }

    #[tokio::test]
    async fn configured_default_capacity_is_used() {
        let sheet = TeeSheet::with_default_capacity(InMemoryBookingStore::new(), 6);
        let tt = sheet.schedule(test_time(), None, None, test_time()).await.unwrap();
        assert_eq!(tt.available_slots(), 6);
    }

    #[tokio::test]
    async fn duplicate_start_time_is_validation() {
        let sheet = TeeSheet::new(InMemoryBookingStore::new());
        sheet.schedule(test_time(), None, None, test_time()).await.unwrap();

        let err = sheet
            .schedule(test_time(), Some("Back Nine".to_string()), None, test_time())
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(msg) => assert!(msg.contains("start_time")),
            _ => panic!("Expected Validation error for duplicate start_time"),
        }
    }

    #[tokio::test]
    async fn reschedule_moves_and_keeps_section_when_omitted() {
        let sheet = TeeSheet::new(InMemoryBookingStore::new());
        let tt = sheet
            .schedule(test_time(), Some("Back Nine".to_string()), None, test_time())
            .await
            .unwrap();
        let later = test_time() + Duration::minutes(40);

        let moved = sheet
            .reschedule(tt.id_typed(), later, None, Some(5), later)
            .await
            .unwrap();
        assert_eq!(moved.start_time(), later);
        assert_eq!(moved.course_section(), "Back Nine");
        assert_eq!(moved.capacity(), 5);
        assert_eq!(moved.available_slots(), 5);
        assert_eq!(moved.version(), tt.version() + 1);
    }

    #[tokio::test]
    async fn reschedule_and_remove_missing_is_not_found() {
        let sheet = TeeSheet::new(InMemoryBookingStore::new());
        assert!(matches!(
            sheet.reschedule(TeeTimeId::new(), test_time(), None, None, test_time()).await,
            Err(ServiceError::NotFound("tee time"))
        ));
        assert!(matches!(
            sheet.remove(TeeTimeId::new()).await,
            Err(ServiceError::NotFound("tee time"))
        ));
    }
}
