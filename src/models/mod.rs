//! Forecasting models.

mod traits;

pub mod trend;

pub use traits::{BoxedForecaster, Forecaster};
pub use trend::{PiecewiseLinearTrend, TrendConfig};
