//! Utility functions for forecasting models.

pub mod cross_validation;
pub mod metrics;
pub mod stats;

pub use cross_validation::{cross_validate, generate_cutoffs, CVConfig, CVResults, FoldResult};
pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use stats::round_to;
