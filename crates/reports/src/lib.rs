#![deny(warnings)]

//! Read-side of the simulator: market comparison, saved-scenario history and
//! exported report documents, all derived from the scenario store.

pub mod documents;
pub mod format;
pub mod render;
pub mod views;

use thiserror::Error;

pub use documents::{build_report, catalog, Block, Document, Page, ReportKind, BLOCKS_PER_PAGE};
pub use format::{format_break_even, format_k, format_money, format_pct, UNBOUNDED};
pub use render::{export, render_text, write_csv};
pub use views::{
    history, sort_recent, unit_breakdown, ComparisonRow, HistoryRow, MarketComparison, ViewReader,
};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Econ(#[from] unit_econ::EconError),
    #[error("no scenarios to report on")]
    NoData,
}
