#![deny(warnings)]

//! Persistence layer: key-value storage port and the typed caches built on it.
//!
//! Three keys are used, mirroring the dashboard's browser storage:
//! [`DRAFT_KEY`] holds the live input draft, [`SCENARIO_CACHE_KEY`] the
//! entity-keyed scenario store and [`MARKET_DATA_KEY`] a flattened result
//! cache read by comparison views.

use thiserror::Error;

mod caches;
mod fallback;
mod import;
mod scenario_store;
mod storage;

pub use caches::{commit_scenario, DraftStore, MarketCache};
pub use fallback::FallbackTable;
pub use import::migrate_export;
pub use scenario_store::{ScenarioMap, ScenarioStore};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};

/// Key of the live input draft.
pub const DRAFT_KEY: &str = "current_simulation_inputs";
/// Key of the entity-keyed scenario store.
pub const SCENARIO_CACHE_KEY: &str = "scenarioCache";
/// Key of the flattened per-entity result cache.
pub const MARKET_DATA_KEY: &str = "marketData";

/// Errors raised by storage backends and typed caches.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Writing `key` would grow storage past its quota.
    #[error("storage quota exceeded writing {key}: {needed} bytes > {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    /// The backing file exists but is not a key-value document.
    #[error("corrupt storage file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Default path of the on-disk storage document.
pub fn default_storage_path() -> &'static str {
    "./data/profitengine-storage.json"
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn default_path_is_json() {
        assert!(default_storage_path().ends_with(".json"));
    }
}
