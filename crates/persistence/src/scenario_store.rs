//! Typed, entity-keyed scenario store.

use crate::{FallbackTable, KeyValueStorage, StorageError, SCENARIO_CACHE_KEY};
use scenario_core::{EntityName, ScenarioRecord};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Persisted form of the store: at most one record per entity.
pub type ScenarioMap = BTreeMap<EntityName, ScenarioRecord>;

/// Single source of truth for saved scenarios.
///
/// Reads always go to the storage port, so a handle sees whatever was
/// written last, by any handle. Writes are serialized through a lock so a
/// read-modify-write cannot interleave with another.
#[derive(Clone)]
pub struct ScenarioStore {
    storage: Arc<dyn KeyValueStorage>,
    fallbacks: Arc<FallbackTable>,
    write_lock: Arc<Mutex<()>>,
}

impl ScenarioStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, fallbacks: FallbackTable) -> Self {
        Self {
            storage,
            fallbacks: Arc::new(fallbacks),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    pub fn fallbacks(&self) -> &FallbackTable {
        &self.fallbacks
    }

    pub(crate) fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The saved records, failing if storage cannot be read. A missing key
    /// or an unparseable payload reads as empty so the next save replaces it.
    pub fn load(&self) -> Result<ScenarioMap, StorageError> {
        let Some(text) = self.storage.get(SCENARIO_CACHE_KEY)? else {
            return Ok(ScenarioMap::new());
        };
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(
                key = SCENARIO_CACHE_KEY,
                error = %e,
                "unreadable scenario store, treating as empty"
            );
            ScenarioMap::new()
        }))
    }

    /// All saved records for display. A failed read shows as empty.
    pub fn all(&self) -> ScenarioMap {
        self.load().unwrap_or_else(|e| {
            warn!(key = SCENARIO_CACHE_KEY, error = %e, "scenario store read failed");
            ScenarioMap::new()
        })
    }

    /// The saved record for `entity`, if any.
    pub fn get(&self, entity: &EntityName) -> Option<ScenarioRecord> {
        self.all().remove(entity)
    }

    /// Replace the record for `entity` and write the whole store back.
    pub fn upsert(&self, entity: EntityName, record: ScenarioRecord) -> Result<(), StorageError> {
        let _guard = self.write_guard();
        let payload = self.prepare_upsert(entity.clone(), record)?;
        self.storage.set(SCENARIO_CACHE_KEY, &payload)?;
        debug!(%entity, "scenario upserted");
        Ok(())
    }

    /// Serialized store with `record` in `entity`'s slot, not yet written.
    pub(crate) fn prepare_upsert(
        &self,
        entity: EntityName,
        record: ScenarioRecord,
    ) -> Result<String, StorageError> {
        let mut map = self.load()?;
        map.insert(entity, record);
        Ok(serde_json::to_string(&map)?)
    }

    /// Resolve each of `entities` against one read of the store, omitting
    /// those with neither a saved record nor a default.
    pub fn resolve_many<'a, I>(&self, entities: I) -> Vec<(EntityName, ScenarioRecord)>
    where
        I: IntoIterator<Item = &'a EntityName>,
    {
        let saved = self.all();
        entities
            .into_iter()
            .filter_map(|e| {
                saved
                    .get(e)
                    .or_else(|| self.fallbacks.get(e))
                    .map(|r| (e.clone(), r.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use rust_decimal::Decimal;
    use scenario_core::default_draft;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Storage whose reads can be switched to fail.
    #[derive(Default)]
    struct FlakyReads {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    impl KeyValueStorage for FlakyReads {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::other("read refused")));
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
    }

    fn store() -> ScenarioStore {
        ScenarioStore::new(Arc::new(MemoryStorage::new()), FallbackTable::standard())
    }

    fn record(name: &str, aov: i64, at: i64) -> ScenarioRecord {
        let mut inputs = default_draft();
        inputs.company_name = EntityName::from(name);
        inputs.aov = Decimal::new(aov, 0);
        let result = unit_econ::simulate(&inputs).unwrap();
        ScenarioRecord {
            inputs,
            result,
            updated_at: at,
        }
    }

    #[test]
    fn saving_twice_keeps_one_record_equal_to_second() {
        let s = store();
        let e = EntityName::from("Zepto");
        s.upsert(e.clone(), record("Zepto", 300, 1)).unwrap();
        let second = record("Zepto", 700, 2);
        s.upsert(e.clone(), second.clone()).unwrap();
        let all = s.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get(&e), Some(&second));
    }

    #[test]
    fn handles_share_persisted_state() {
        let s = store();
        let other_view = s.clone();
        s.upsert(EntityName::from("Acme"), record("Acme", 500, 9))
            .unwrap();
        assert_eq!(
            other_view.get(&EntityName::from("Acme")).map(|r| r.updated_at),
            Some(9)
        );
    }

    #[test]
    fn resolve_falls_back_for_roster_only() {
        let s = store();
        let names = [
            EntityName::from("Acme"),
            EntityName::from("Blinkit"),
            EntityName::from("Zepto"),
        ];
        let resolved = s.resolve_many(names.iter());
        let found: Vec<_> = resolved.iter().map(|(e, r)| (e.as_str(), r.updated_at)).collect();
        assert_eq!(found, vec![("Blinkit", 0), ("Zepto", 0)]);
    }

    #[test]
    fn saved_record_shadows_default() {
        let s = store();
        let e = EntityName::from("Blinkit");
        s.upsert(e.clone(), record("Blinkit", 900, 42)).unwrap();
        let resolved = s.resolve_many([e].iter());
        assert_eq!(resolved[0].1.updated_at, 42);
    }

    #[test]
    fn failed_read_aborts_save_and_keeps_records() {
        let storage = Arc::new(FlakyReads::default());
        let s = ScenarioStore::new(storage.clone(), FallbackTable::empty());
        s.upsert(EntityName::from("Zepto"), record("Zepto", 300, 1))
            .unwrap();

        storage.failing.store(true, Ordering::SeqCst);
        assert!(matches!(
            s.upsert(EntityName::from("Blinkit"), record("Blinkit", 500, 2)),
            Err(StorageError::Io(_))
        ));
        assert!(s.all().is_empty());

        storage.failing.store(false, Ordering::SeqCst);
        let names: Vec<_> = s.all().into_keys().map(|e| e.0).collect();
        assert_eq!(names, vec!["Zepto".to_string()]);
    }

    #[test]
    fn unreadable_store_reads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(SCENARIO_CACHE_KEY, "{broken").unwrap();
        let s = ScenarioStore::new(storage, FallbackTable::empty());
        assert!(s.all().is_empty());
        // the next save replaces the unreadable payload
        s.upsert(EntityName::from("Acme"), record("Acme", 500, 1))
            .unwrap();
        assert_eq!(s.all().len(), 1);
    }
}
