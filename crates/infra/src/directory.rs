use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use fairway_core::GolferId;
use fairway_golfers::{Golfer, RegisterGolfer, UpdateGolfer};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{BookingStore, Removal};

/// Editable golfer fields, as submitted by staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GolferProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Golfer registration and profile maintenance.
#[derive(Debug, Clone)]
pub struct GolferDirectory<S> {
    store: S,
}

impl<S> GolferDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: BookingStore> GolferDirectory<S> {
    /// Register a golfer. A taken email is a `Validation` error.
    #[instrument(skip(self, profile), err)]
    pub async fn register(&self, profile: GolferProfile, at: DateTime<Utc>) -> ServiceResult<Golfer> {
        let golfer = Golfer::register(&RegisterGolfer {
            golfer_id: GolferId::new(),
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            notes: profile.notes,
            occurred_at: at,
        })?;
        self.store.insert_golfer(&golfer).await?;

        info!(golfer_id = %golfer.id_typed(), "golfer registered");
        Ok(golfer)
    }

    pub async fn get(&self, golfer_id: GolferId) -> ServiceResult<Golfer> {
        self.store
            .golfer(golfer_id)
            .await?
            .ok_or(ServiceError::NotFound("golfer"))
    }

    /// All golfers by name.
    pub async fn list(&self) -> ServiceResult<Vec<Golfer>> {
        Ok(self.store.list_golfers().await?)
    }

    /// Replace the golfer's profile fields.
    #[instrument(skip(self, profile), fields(golfer_id = %golfer_id), err)]
    pub async fn update(
        &self,
        golfer_id: GolferId,
        profile: GolferProfile,
        at: DateTime<Utc>,
    ) -> ServiceResult<Golfer> {
        let current = self.get(golfer_id).await?;
        let updated = current.updated(&UpdateGolfer {
            golfer_id,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            notes: profile.notes,
            occurred_at: at,
        })?;
        self.store.update_golfer(&updated).await?;
        Ok(updated)
    }

    /// Delete the golfer with its bookings; their players go back to the
    /// tee times they held.
    #[instrument(skip(self), fields(golfer_id = %golfer_id), err)]
    pub async fn remove(&self, golfer_id: GolferId, at: DateTime<Utc>) -> ServiceResult<Removal> {
        let removal = self.store.delete_golfer(golfer_id, at).await?;
        info!(bookings_removed = removal.bookings_removed, "golfer removed");
        Ok(removal)
    }
}
