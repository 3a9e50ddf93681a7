//! Per-genre forecasting and result assembly.

pub mod assemble;
mod outcome;
mod runner;

pub use assemble::{
    assemble, format_accuracy_report, format_accuracy_summary, Assembly, SUMMARY_HEADING,
};
pub use outcome::{
    AccuracyRecord, ForecastResult, ForecastRow, GenreOutcome, GenreReport, SeriesType,
};
pub use runner::{EngineConfig, ForecastEngine, METRIC_DECIMALS};
