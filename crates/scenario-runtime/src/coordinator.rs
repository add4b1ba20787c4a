//! Debounced simulation requests with stale-response suppression.

use crate::service::CalculationService;
use scenario_core::{ScenarioInput, ScenarioResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default quiescence window before a calculation is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// A finished calculation together with the input that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completed {
    pub seq: u64,
    pub input: ScenarioInput,
    pub result: ScenarioResult,
}

#[derive(Debug, Default)]
struct Shared {
    latest_issued: AtomicU64,
    current: Mutex<Option<Completed>>,
    failures: AtomicU64,
    stale_discarded: AtomicU64,
}

impl Shared {
    fn current(&self) -> MutexGuard<'_, Option<Completed>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a transient result in sync with the most recent input.
///
/// Each input change restarts the debounce timer; when the timer fires, one
/// request is issued with a fresh sequence number. Issued requests are never
/// aborted, but a response is applied only while its sequence number is the
/// latest issued and newer than the result on display. Failures leave the
/// previous result in place. Must be driven from within a Tokio runtime.
pub struct SimulationCoordinator<S> {
    service: Arc<S>,
    debounce: Duration,
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
}

impl<S: CalculationService> SimulationCoordinator<S> {
    pub fn new(service: Arc<S>, debounce: Duration) -> Self {
        Self {
            service,
            debounce,
            shared: Arc::new(Shared::default()),
            timer: None,
        }
    }

    /// Schedule a calculation for `input`, superseding any pending one.
    pub fn on_input_change(&mut self, input: ScenarioInput) {
        if let Some(pending) = self.timer.take() {
            pending.abort();
        }
        let service = Arc::clone(&self.service);
        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let seq = shared.latest_issued.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(seq, entity = %input.company_name, "calculation issued");
            // Detached: aborting the timer must not cancel an issued request.
            let request = tokio::spawn(run_request(service, shared, seq, input));
            let _ = request.await;
        }));
    }

    /// Wait until the pending calculation, if any, has been issued and answered.
    pub async fn settle(&mut self) {
        if let Some(pending) = self.timer.take() {
            let _ = pending.await;
        }
    }

    /// The result currently on display.
    pub fn current(&self) -> Option<Completed> {
        self.shared.current().clone()
    }

    /// Number of requests issued so far.
    pub fn issued(&self) -> u64 {
        self.shared.latest_issued.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u64 {
        self.shared.failures.load(Ordering::SeqCst)
    }

    pub fn stale_discarded(&self) -> u64 {
        self.shared.stale_discarded.load(Ordering::SeqCst)
    }
}

impl<S> Drop for SimulationCoordinator<S> {
    fn drop(&mut self) {
        if let Some(pending) = self.timer.take() {
            pending.abort();
        }
    }
}

async fn run_request<S: CalculationService>(
    service: Arc<S>,
    shared: Arc<Shared>,
    seq: u64,
    input: ScenarioInput,
) {
    let outcome = service.calculate(input.clone()).await;
    match outcome {
        Ok(result) => {
            let mut current = shared.current();
            let latest = shared.latest_issued.load(Ordering::SeqCst);
            let newer = current.as_ref().map_or(true, |c| c.seq < seq);
            if seq == latest && newer {
                debug!(seq, entity = %input.company_name, "calculation applied");
                *current = Some(Completed { seq, input, result });
            } else {
                shared.stale_discarded.fetch_add(1, Ordering::SeqCst);
                debug!(seq, latest, "stale calculation discarded");
            }
        }
        Err(e) => {
            shared.failures.fetch_add(1, Ordering::SeqCst);
            warn!(
                seq,
                entity = %input.company_name,
                error = %e,
                "calculation failed, keeping previous result"
            );
        }
    }
}
