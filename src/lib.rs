//! # genre-forecast
//!
//! Genre popularity analysis for music catalog datasets.
//!
//! Merges and cleans track catalogs, averages popularity per genre and
//! release year, and forecasts each genre's yearly series with a piecewise
//! linear trend model evaluated by rolling-origin cross-validation.

pub mod aggregate;
pub mod catalog;
pub mod charts;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use error::{ForecastError, PipelineError, PipelineResult, Result};

pub mod prelude {
    pub use crate::aggregate::GenreYearSeries;
    pub use crate::catalog::{prepare, CleanCatalog, RawBatch};
    pub use crate::charts::{ChartSink, LogCharts, NoCharts};
    pub use crate::config::PipelineConfig;
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::engine::{AccuracyRecord, ForecastEngine, GenreOutcome};
    pub use crate::error::{ForecastError, PipelineError, Result};
    pub use crate::models::{Forecaster, PiecewiseLinearTrend};
    pub use crate::pipeline::run_pipeline;
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
