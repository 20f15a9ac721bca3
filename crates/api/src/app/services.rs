use std::sync::Arc;

use tracing::{info, warn};

use fairway_infra::{
    BookingLedger, BookingStore, GolferDirectory, InMemoryBookingStore, PostgresBookingStore,
    StoreError, TeeSheet,
};

use crate::config::AppConfig;

/// Storage handle shared by every service.
pub type SharedStore = Arc<dyn BookingStore>;

/// Application services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: BookingLedger<SharedStore>,
    pub directory: GolferDirectory<SharedStore>,
    pub tee_sheet: TeeSheet<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore, default_capacity: u32) -> Self {
        Self {
            ledger: BookingLedger::new(store.clone()),
            directory: GolferDirectory::new(store.clone()),
            tee_sheet: TeeSheet::with_default_capacity(store, default_capacity),
        }
    }

    /// Services over a fresh in-memory store (dev and tests).
    pub fn in_memory(default_capacity: u32) -> Self {
        Self::new(Arc::new(InMemoryBookingStore::new()), default_capacity)
    }
}

/// Pick the storage backend from configuration and build the services.
///
/// With `DATABASE_URL` set this connects to Postgres and installs the schema.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let store = PostgresBookingStore::connect(url, config.db_max_connections).await?;
            store.migrate().await?;
            info!(max_connections = config.db_max_connections, "using postgres booking store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory booking store (data is lost on restart)");
            Arc::new(InMemoryBookingStore::new())
        }
    };

    Ok(AppServices::new(store, config.default_capacity))
}
