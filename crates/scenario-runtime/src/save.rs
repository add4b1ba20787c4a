//! Saving the current scenario and the transient status line.

use crate::clock::Clock;
use crate::coordinator::Completed;
use persistence::{commit_scenario, MarketCache, ScenarioStore, StorageError};
use scenario_core::{ScenarioRecord, TimestampMs};
use thiserror::Error;
use tracing::{error, info};

/// Default lifetime of a status message.
pub const DEFAULT_STATUS_TTL_MS: i64 = 2500;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(ScenarioRecord),
    /// No calculation has completed yet.
    NothingToSave,
}

/// Upsert the last completed calculation under its entity name.
///
/// The record carries exactly the input that produced the result, stamped
/// with the clock's current time.
pub fn save_scenario(
    store: &ScenarioStore,
    market: &MarketCache,
    current: Option<&Completed>,
    clock: &dyn Clock,
) -> Result<SaveOutcome, SaveError> {
    let Some(done) = current else {
        info!("save requested before any calculation completed");
        return Ok(SaveOutcome::NothingToSave);
    };
    let record = ScenarioRecord {
        inputs: done.input.clone(),
        result: done.result.clone(),
        updated_at: clock.now_ms(),
    };
    commit_scenario(store, market, record.clone())?;
    Ok(SaveOutcome::Saved(record))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    pub expires_at: TimestampMs,
}

/// Short-lived, user-visible status line.
#[derive(Clone, Debug)]
pub struct StatusBoard {
    ttl_ms: i64,
    message: Option<StatusMessage>,
}

impl StatusBoard {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            ttl_ms,
            message: None,
        }
    }

    pub fn post(&mut self, kind: StatusKind, text: impl Into<String>, now: TimestampMs) {
        self.message = Some(StatusMessage {
            kind,
            text: text.into(),
            expires_at: now.saturating_add(self.ttl_ms),
        });
    }

    /// The message, unless it has expired by `now`.
    pub fn current(&self, now: TimestampMs) -> Option<&StatusMessage> {
        self.message.as_ref().filter(|m| now < m.expires_at)
    }

    /// Record the outcome of a save attempt.
    pub fn record_save(&mut self, outcome: &Result<SaveOutcome, SaveError>, now: TimestampMs) {
        match outcome {
            Ok(SaveOutcome::Saved(r)) => {
                info!(entity = %r.inputs.company_name, "scenario updated");
                self.post(StatusKind::Success, "Scenario Updated!", now);
            }
            Ok(SaveOutcome::NothingToSave) => {}
            Err(e) => {
                error!(error = %e, "scenario save failed");
                self.post(StatusKind::Failure, "Save Failed", now);
            }
        }
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use persistence::{FallbackTable, KeyValueStorage, MemoryStorage};
    use scenario_core::default_draft;
    use std::sync::Arc;

    fn completed() -> Completed {
        let input = default_draft();
        let result = unit_econ::simulate(&input).unwrap();
        Completed {
            seq: 1,
            input,
            result,
        }
    }

    #[test]
    fn save_without_result_is_noop() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let store = ScenarioStore::new(storage.clone(), FallbackTable::empty());
        let market = MarketCache::new(storage);
        let clock = ManualClock::at(10);
        let out = save_scenario(&store, &market, None, &clock).unwrap();
        assert_eq!(out, SaveOutcome::NothingToSave);
        assert!(store.all().is_empty());
    }

    #[test]
    fn quota_failure_posts_failure_and_writes_nothing() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::with_quota(64));
        let store = ScenarioStore::new(storage.clone(), FallbackTable::empty());
        let market = MarketCache::new(storage);
        let clock = ManualClock::at(10);
        let done = completed();
        let out = save_scenario(&store, &market, Some(&done), &clock);
        assert!(matches!(out, Err(SaveError::Storage(StorageError::QuotaExceeded { .. }))));
        assert!(store.all().is_empty());

        let mut board = StatusBoard::default();
        board.record_save(&out, 10);
        let msg = board.current(10).unwrap();
        assert_eq!(msg.kind, StatusKind::Failure);
        assert_eq!(msg.text, "Save Failed");
    }

    #[test]
    fn status_expires_after_ttl() {
        let mut board = StatusBoard::new(2500);
        board.post(StatusKind::Success, "Scenario Updated!", 1000);
        assert!(board.current(3499).is_some());
        assert!(board.current(3500).is_none());
    }

    #[test]
    fn huge_ttl_saturates_instead_of_wrapping() {
        let mut board = StatusBoard::new(i64::MAX);
        board.post(StatusKind::Success, "Scenario Updated!", 1000);
        assert_eq!(board.current(1000).unwrap().expires_at, i64::MAX);
        assert!(board.current(i64::MAX - 1).is_some());
    }
}
