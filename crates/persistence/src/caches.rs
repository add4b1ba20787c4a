//! Draft and market-data caches, and the two-key scenario commit.

use crate::{
    KeyValueStorage, ScenarioStore, StorageError, DRAFT_KEY, MARKET_DATA_KEY, SCENARIO_CACHE_KEY,
};
use scenario_core::{default_draft, EntityName, ScenarioInput, ScenarioRecord, ScenarioResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// The live, unsaved input draft.
#[derive(Clone)]
pub struct DraftStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl DraftStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// The persisted draft, or the default draft when none is readable.
    pub fn load(&self) -> ScenarioInput {
        match self.storage.get(DRAFT_KEY) {
            Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(key = DRAFT_KEY, error = %e, "unreadable draft, using default");
                default_draft()
            }),
            Ok(None) => default_draft(),
            Err(e) => {
                warn!(key = DRAFT_KEY, error = %e, "draft read failed, using default");
                default_draft()
            }
        }
    }

    pub fn save(&self, draft: &ScenarioInput) -> Result<(), StorageError> {
        let text = serde_json::to_string(draft)?;
        self.storage.set(DRAFT_KEY, &text)
    }
}

/// Flattened latest result per entity, as consumed by comparison views.
#[derive(Clone)]
pub struct MarketCache {
    storage: Arc<dyn KeyValueStorage>,
}

impl MarketCache {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Cached results, failing if storage cannot be read. A missing key or an
    /// unparseable payload reads as empty.
    pub fn load(&self) -> Result<BTreeMap<EntityName, ScenarioResult>, StorageError> {
        let Some(text) = self.storage.get(MARKET_DATA_KEY)? else {
            return Ok(BTreeMap::new());
        };
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(
                key = MARKET_DATA_KEY,
                error = %e,
                "unreadable market data, treating as empty"
            );
            BTreeMap::new()
        }))
    }

    fn prepare_upsert(
        &self,
        entity: EntityName,
        result: ScenarioResult,
    ) -> Result<String, StorageError> {
        let mut map = self.load()?;
        map.insert(entity, result);
        Ok(serde_json::to_string(&map)?)
    }
}

/// Commit `record` to the scenario store and the market cache.
///
/// Both payloads are serialized before anything is written. If the second
/// write fails the store slot is restored, so an attempt either lands in
/// both caches or in neither.
pub fn commit_scenario(
    store: &ScenarioStore,
    market: &MarketCache,
    record: ScenarioRecord,
) -> Result<(), StorageError> {
    let _guard = store.write_guard();
    let entity = record.inputs.company_name.clone();
    let market_payload = market.prepare_upsert(entity.clone(), record.result.clone())?;
    let store_payload = store.prepare_upsert(entity.clone(), record)?;

    let storage = store.storage();
    let previous = storage.get(SCENARIO_CACHE_KEY)?;
    storage.set(SCENARIO_CACHE_KEY, &store_payload)?;
    if let Err(e) = market.storage.set(MARKET_DATA_KEY, &market_payload) {
        let restored = match &previous {
            Some(text) => storage.set(SCENARIO_CACHE_KEY, text),
            None => storage.set(SCENARIO_CACHE_KEY, "{}"),
        };
        if let Err(restore_err) = restored {
            warn!(error = %restore_err, "scenario store rollback failed");
        }
        return Err(e);
    }
    info!(%entity, "scenario committed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FallbackTable, MemoryStorage};
    use rust_decimal::Decimal;

    /// Storage that refuses writes to one key.
    struct RefuseKey {
        inner: MemoryStorage,
        refused: &'static str,
    }

    impl KeyValueStorage for RefuseKey {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.refused {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    quota: 0,
                });
            }
            self.inner.set(key, value)
        }
    }

    /// Storage that fails reads of one key.
    struct RefuseRead {
        inner: MemoryStorage,
        refused: &'static str,
    }

    impl KeyValueStorage for RefuseRead {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if key == self.refused {
                return Err(StorageError::Io(std::io::Error::other("read refused")));
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
    }

    fn record(at: i64) -> ScenarioRecord {
        let inputs = default_draft();
        let result = unit_econ::simulate(&inputs).unwrap();
        ScenarioRecord {
            inputs,
            result,
            updated_at: at,
        }
    }

    #[test]
    fn draft_defaults_then_roundtrips() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let drafts = DraftStore::new(storage);
        assert_eq!(drafts.load(), default_draft());
        let mut d = default_draft();
        d.aov = Decimal::new(600, 0);
        drafts.save(&d).unwrap();
        assert_eq!(drafts.load().aov, Decimal::new(600, 0));
    }

    #[test]
    fn commit_writes_both_caches() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let store = ScenarioStore::new(storage.clone(), FallbackTable::empty());
        let market = MarketCache::new(storage);
        commit_scenario(&store, &market, record(5)).unwrap();
        let e = EntityName::from("Blinkit");
        assert_eq!(store.get(&e).map(|r| r.updated_at), Some(5));
        assert_eq!(
            market.load().unwrap().get(&e).map(|r| r.contribution_margin),
            Some(Decimal::new(-10, 0))
        );
    }

    #[test]
    fn failed_market_write_rolls_back_store() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(RefuseKey {
            inner: MemoryStorage::new(),
            refused: MARKET_DATA_KEY,
        });
        let store = ScenarioStore::new(storage.clone(), FallbackTable::empty());
        let market = MarketCache::new(storage.clone());
        assert!(commit_scenario(&store, &market, record(5)).is_err());
        assert!(store.all().is_empty());
        assert!(market.load().unwrap().is_empty());
    }

    #[test]
    fn unreadable_market_data_is_not_overwritten() {
        let storage = Arc::new(RefuseRead {
            inner: MemoryStorage::new(),
            refused: MARKET_DATA_KEY,
        });
        storage.inner.set(MARKET_DATA_KEY, "{\"Zepto\":null}").unwrap();
        let store = ScenarioStore::new(storage.clone(), FallbackTable::empty());
        let market = MarketCache::new(storage.clone());
        assert!(matches!(
            commit_scenario(&store, &market, record(5)),
            Err(StorageError::Io(_))
        ));
        assert!(market.load().is_err());
        assert_eq!(
            storage.inner.get(MARKET_DATA_KEY).unwrap().as_deref(),
            Some("{\"Zepto\":null}")
        );
        assert!(store.all().is_empty());
    }
}
