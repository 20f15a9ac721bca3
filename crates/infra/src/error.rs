use thiserror::Error;

use fairway_core::DomainError;

use crate::store::{StoreError, UniqueKey};

/// Failure of an application service call (ledger, directory, tee sheet).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before any state changed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Not enough available slots. Nothing was written.
    #[error("not enough available slots for this tee time (requested {requested}, available {available})")]
    CapacityExceeded { requested: u32, available: u32 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A concurrent write won the version check. Safe to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage backend failure.
    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::CapacityExceeded {
                requested,
                available,
            } => ServiceError::CapacityExceeded {
                requested,
                available,
            },
            DomainError::InvalidId(msg) => ServiceError::InvalidId(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(UniqueKey::GolferEmail) => {
                ServiceError::Validation("golfer with this email already exists".to_string())
            }
            StoreError::UniqueViolation(UniqueKey::TeeTimeStartTime) => {
                ServiceError::Validation("tee time with this start_time already exists".to_string())
            }
            StoreError::Concurrency(msg) => ServiceError::Conflict(msg),
            StoreError::NotFound(entity) => ServiceError::NotFound(entity),
            other @ StoreError::Backend(_) => ServiceError::Store(other),
        }
    }
}
