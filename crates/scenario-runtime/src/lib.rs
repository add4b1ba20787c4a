#![deny(warnings)]

//! Runtime for the simulator: calculation service adapters, the debounced
//! request coordinator, the save operation and the session tying them to
//! persisted storage.

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod save;
pub mod service;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, ServiceConfig};
pub use coordinator::{Completed, SimulationCoordinator, DEFAULT_DEBOUNCE};
pub use save::{save_scenario, SaveError, SaveOutcome, StatusBoard, StatusKind, StatusMessage};
pub use service::{
    AnyCalculationService, CalculationError, CalculationService, HttpCalculationService,
    LocalCalculationService,
};
pub use session::{SessionError, SessionOptions, SimulatorSession};
