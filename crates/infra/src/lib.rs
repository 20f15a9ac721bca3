//! Infrastructure layer: storage backends and the application services that
//! drive them.

pub mod directory;
pub mod error;
pub mod ledger;
pub mod store;
pub mod tee_sheet;


pub use directory::{GolferDirectory, GolferProfile};
pub use error::{ServiceError, ServiceResult};
pub use ledger::{BookingLedger, TeeTimeOrder};
pub use store::{
    BookingStore, InMemoryBookingStore, PostgresBookingStore, Removal, StoreError, StoreResult,
    UniqueKey,
};
pub use tee_sheet::TeeSheet;
