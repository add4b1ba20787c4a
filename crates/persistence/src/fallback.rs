//! Built-in fallback records for roster entities that were never saved.

use scenario_core::{default_draft, roster, EntityName, ScenarioRecord};
use std::collections::BTreeMap;
use tracing::warn;

/// Default scenario per entity, injected once into the [`ScenarioStore`].
///
/// [`ScenarioStore`]: crate::ScenarioStore
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FallbackTable {
    records: BTreeMap<EntityName, ScenarioRecord>,
}

impl FallbackTable {
    /// A table with no defaults: unknown entities resolve to nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Defaults for the built-in roster: each entity's default levers on
    /// top of the default draft, evaluated with the in-process model and
    /// stamped at the epoch so any real save sorts ahead of them.
    pub fn standard() -> Self {
        let mut records = BTreeMap::new();
        for profile in roster() {
            let inputs = default_draft().with_profile(&profile);
            match unit_econ::simulate(&inputs) {
                Ok(result) => {
                    records.insert(
                        inputs.company_name.clone(),
                        ScenarioRecord {
                            inputs,
                            result,
                            updated_at: 0,
                        },
                    );
                }
                Err(e) => warn!(entity = profile.name, error = %e, "roster default rejected"),
            }
        }
        Self { records }
    }

    pub fn get(&self, entity: &EntityName) -> Option<&ScenarioRecord> {
        self.records.get(entity)
    }

    /// Entities with a default, in name order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityName> {
        self.records.keys()
    }
}
