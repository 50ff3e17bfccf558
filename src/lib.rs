//! Metering-progress and overdue-debt reports for power distribution units.
//!
//! A workbook export is normalized into typed records, summarized (totals
//! and a straight-line forecast for metering, flat totals for debt),
//! ranked, and assembled into a fixed-layout document.
pub mod archive;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod ranker;
pub mod report;
pub mod types;
pub mod util;

pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use pipeline::{build_report, load, run, ReportOutput};
pub use types::{RecordSet, SchemaKind};
