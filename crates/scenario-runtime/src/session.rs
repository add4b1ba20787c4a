//! Simulator session: the live draft, its calculation and the save command.

use crate::clock::Clock;
use crate::coordinator::{Completed, SimulationCoordinator};
use crate::save::{save_scenario, SaveError, SaveOutcome, StatusBoard, StatusMessage};
use crate::service::CalculationService;
use persistence::{DraftStore, FallbackTable, KeyValueStorage, MarketCache, ScenarioStore};
use scenario_core::{find_profile, InputEdit, ScenarioInput, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub status_ttl_ms: i64,
}

/// Everything the simulator view owns.
///
/// Opening a session loads the persisted draft and schedules its first
/// calculation. Each accepted edit is persisted as the new draft and
/// reschedules the calculation; nothing reaches the scenario store until
/// [`SimulatorSession::save`] is called.
pub struct SimulatorSession<S> {
    drafts: DraftStore,
    store: ScenarioStore,
    market: MarketCache,
    coordinator: SimulationCoordinator<S>,
    clock: Arc<dyn Clock>,
    status: StatusBoard,
    draft: ScenarioInput,
}

impl<S: CalculationService> SimulatorSession<S> {
    pub fn open(
        storage: Arc<dyn KeyValueStorage>,
        fallbacks: FallbackTable,
        service: Arc<S>,
        clock: Arc<dyn Clock>,
        options: SessionOptions,
    ) -> Self {
        let drafts = DraftStore::new(storage.clone());
        let draft = drafts.load();
        let mut coordinator = SimulationCoordinator::new(service, options.debounce);
        coordinator.on_input_change(draft.clone());
        info!(entity = %draft.company_name, "simulator session opened");
        Self {
            drafts,
            store: ScenarioStore::new(storage.clone(), fallbacks),
            market: MarketCache::new(storage),
            coordinator,
            clock,
            status: StatusBoard::new(options.status_ttl_ms),
            draft,
        }
    }

    pub fn draft(&self) -> &ScenarioInput {
        &self.draft
    }

    pub fn store(&self) -> &ScenarioStore {
        &self.store
    }

    pub fn market(&self) -> &MarketCache {
        &self.market
    }

    pub fn coordinator(&self) -> &SimulationCoordinator<S> {
        &self.coordinator
    }

    /// Switch the draft to a roster entity's default levers.
    pub fn select_entity(&mut self, name: &str) -> Result<(), SessionError> {
        let profile =
            find_profile(name).ok_or_else(|| SessionError::UnknownEntity(name.to_string()))?;
        let next = self.draft.with_profile(profile);
        self.replace_draft(next);
        Ok(())
    }

    /// Apply one edit to the draft; rejected edits change nothing.
    pub fn edit(&mut self, edit: InputEdit) -> Result<(), SessionError> {
        let mut next = self.draft.clone();
        next.apply(edit)?;
        self.replace_draft(next);
        Ok(())
    }

    fn replace_draft(&mut self, next: ScenarioInput) {
        if next == self.draft {
            return;
        }
        if let Err(e) = self.drafts.save(&next) {
            warn!(error = %e, "draft not persisted");
        }
        self.coordinator.on_input_change(next.clone());
        self.draft = next;
    }

    /// Wait for the pending calculation, if any.
    pub async fn settle(&mut self) {
        self.coordinator.settle().await;
    }

    /// The last completed calculation.
    pub fn result(&self) -> Option<Completed> {
        self.coordinator.current()
    }

    /// Save the last completed calculation and post the outcome.
    pub fn save(&mut self) -> Result<SaveOutcome, SaveError> {
        let current = self.coordinator.current();
        let outcome = save_scenario(
            &self.store,
            &self.market,
            current.as_ref(),
            self.clock.as_ref(),
        );
        self.status.record_save(&outcome, self.clock.now_ms());
        outcome
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.current(self.clock.now_ms())
    }
}
