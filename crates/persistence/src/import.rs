//! Import of a browser storage export into a storage backend.

use crate::{
    KeyValueStorage, ScenarioMap, StorageError, DRAFT_KEY, MARKET_DATA_KEY, SCENARIO_CACHE_KEY,
};
use scenario_core::{EntityName, ScenarioInput, ScenarioResult};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Copy the known keys of `export` into `storage` and return how many were
/// copied.
///
/// Every present key must parse as its typed cache before anything is
/// written, and the keys land in one batch, so a rejected export leaves the
/// target as it was. Unknown keys are skipped.
pub fn migrate_export(
    export: &BTreeMap<String, String>,
    storage: &dyn KeyValueStorage,
) -> Result<usize, StorageError> {
    if let Some(v) = export.get(DRAFT_KEY) {
        serde_json::from_str::<ScenarioInput>(v)?;
    }
    if let Some(v) = export.get(SCENARIO_CACHE_KEY) {
        serde_json::from_str::<ScenarioMap>(v)?;
    }
    if let Some(v) = export.get(MARKET_DATA_KEY) {
        serde_json::from_str::<BTreeMap<EntityName, ScenarioResult>>(v)?;
    }
    let known = [DRAFT_KEY, SCENARIO_CACHE_KEY, MARKET_DATA_KEY];
    let skipped = export.keys().filter(|k| !known.contains(&k.as_str())).count();
    if skipped > 0 {
        warn!(skipped, "unknown export keys ignored");
    }

    let batch: Vec<(&str, &str)> = known
        .iter()
        .filter_map(|k| export.get(*k).map(|v| (*k, v.as_str())))
        .collect();
    storage.set_many(&batch)?;
    info!(keys = batch.len(), "browser export imported");
    Ok(batch.len())
}
