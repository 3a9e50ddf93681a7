//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use chrono::NaiveDate;

/// Common interface for forecasting models.
///
/// Models are fitted on a dated series and then evaluated at arbitrary
/// dates, historical or future. This trait is object-safe and can be used
/// with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions at the given dates.
    fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast>;

    /// Generate predictions with prediction intervals of the given width.
    fn predict_with_intervals(&self, dates: &[NaiveDate], level: f64) -> Result<Forecast> {
        // Default implementation just returns point predictions
        let _ = level;
        self.predict(dates)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;

impl<M: Forecaster + ?Sized> Forecaster for Box<M> {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        (**self).fit(series)
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast> {
        (**self).predict(dates)
    }

    fn predict_with_intervals(&self, dates: &[NaiveDate], level: f64) -> Result<Forecast> {
        (**self).predict_with_intervals(dates, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        (**self).fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        (**self).residuals()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_fitted(&self) -> bool {
        (**self).is_fitted()
    }
}
