//! Shared application state.

use custodia_core::CustodiaConfig;
use custodia_store::{EntityCache, SqliteStore};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: CustodiaConfig,
    pub store: SqliteStore,
    /// Hot-entity record cache, pre-touched by the consent endpoint.
    pub records: EntityCache,
}

impl AppState {
    pub fn new(config: CustodiaConfig, store: SqliteStore) -> Self {
        Self {
            config,
            store,
            records: EntityCache::default_cache(),
        }
    }
}
