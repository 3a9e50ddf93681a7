//! Rolling-origin cross-validation for dated time series.
//!
//! Windows are expressed in calendar days so that series with gaps are
//! evaluated on the same footing as regular ones. Cutoffs are generated
//! backwards from the end of the series: the last cutoff sits one horizon
//! before the final observation and earlier cutoffs step back by `period`
//! until less than `initial` days of history would remain.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::metrics::{calculate_metrics, AccuracyMetrics};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;

/// Configuration for rolling-origin cross-validation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CVConfig {
    /// Minimum history, in days, before the first cutoff.
    pub initial_days: i64,
    /// Spacing, in days, between consecutive cutoffs.
    pub period_days: i64,
    /// Forecast horizon after each cutoff, in days.
    pub horizon_days: i64,
    /// Width of the prediction interval used for coverage.
    pub interval_width: f64,
}

impl Default for CVConfig {
    fn default() -> Self {
        Self {
            initial_days: 1095,
            period_days: 365,
            horizon_days: 730,
            interval_width: 0.8,
        }
    }
}

impl CVConfig {
    pub fn new(initial_days: i64, period_days: i64, horizon_days: i64) -> Self {
        Self {
            initial_days,
            period_days,
            horizon_days,
            ..Self::default()
        }
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_days <= 0 || self.horizon_days <= 0 || self.initial_days < 0 {
            return Err(ForecastError::InvalidParameter(
                "cross-validation windows must be positive".to_string(),
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// One evaluated cutoff.
#[derive(Debug, Clone)]
pub struct FoldResult {
    pub cutoff: NaiveDate,
    /// Number of training observations (dates on or before the cutoff).
    pub train_size: usize,
    pub dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub metrics: AccuracyMetrics,
}

/// Results from cross-validation.
#[derive(Debug, Clone)]
pub struct CVResults {
    pub folds: Vec<FoldResult>,
    /// Mean of the per-fold metrics.
    pub aggregated: AccuracyMetrics,
}

impl CVResults {
    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }
}

/// Generate cutoff dates in ascending order.
///
/// # Errors
/// `CrossValidation` if no cutoff leaves `initial` days of history and a
/// full horizon of held-out data.
pub fn generate_cutoffs(series: &TimeSeries, config: &CVConfig) -> Result<Vec<NaiveDate>> {
    config.validate()?;

    let (first, last) = match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ForecastError::EmptyData),
    };

    let horizon = Duration::days(config.horizon_days);
    let period = Duration::days(config.period_days);
    let earliest = first + Duration::days(config.initial_days);

    let mut cutoff = last - horizon;
    if cutoff < first {
        return Err(ForecastError::CrossValidation(
            "less data than horizon".to_string(),
        ));
    }

    let mut cutoffs = Vec::new();
    while cutoff >= earliest {
        cutoffs.push(cutoff);
        cutoff = cutoff - period;

        // Skip back over gaps so every window holds at least one observation.
        if series.window(cutoff, cutoff + horizon).is_empty() && cutoff > first {
            if let Some(closest) = series.until(cutoff).last_date() {
                cutoff = closest - horizon;
            }
        }
    }

    if cutoffs.is_empty() {
        return Err(ForecastError::CrossValidation(
            "less data than horizon after initial window".to_string(),
        ));
    }

    cutoffs.reverse();
    Ok(cutoffs)
}

/// Perform rolling-origin cross-validation.
///
/// A fresh model from `model_factory` is fitted on the observations up to
/// each cutoff and asked for interval predictions over the held-out window.
///
/// # Arguments
/// * `config` - Window and interval configuration
/// * `series` - The time series to validate on
/// * `model_factory` - Function that creates a fresh model instance for each fold
///
/// # Example
/// ```
/// use genre_forecast::core::TimeSeries;
/// use genre_forecast::models::PiecewiseLinearTrend;
/// use genre_forecast::utils::cross_validation::{cross_validate, CVConfig};
///
/// let points: Vec<(i32, f64)> = (2010..2022).map(|y| (y, 40.0 + (y - 2010) as f64)).collect();
/// let ts = TimeSeries::yearly(&points).unwrap();
///
/// let results = cross_validate(&CVConfig::default(), &ts, PiecewiseLinearTrend::new).unwrap();
/// assert!(results.n_folds() > 0);
/// assert!(results.aggregated.mae >= 0.0);
/// ```
pub fn cross_validate<F, Factory>(
    config: &CVConfig,
    series: &TimeSeries,
    model_factory: Factory,
) -> Result<CVResults>
where
    F: Forecaster,
    Factory: Fn() -> F,
{
    let cutoffs = generate_cutoffs(series, config)?;
    let horizon = Duration::days(config.horizon_days);

    let mut folds = Vec::with_capacity(cutoffs.len());
    for cutoff in cutoffs {
        let train = series.until(cutoff);
        if train.len() < 2 {
            return Err(ForecastError::CrossValidation(format!(
                "less than two datapoints before cutoff {cutoff}"
            )));
        }
        let test = series.window(cutoff, cutoff + horizon);
        if test.is_empty() {
            continue;
        }

        let mut model = model_factory();
        model.fit(&train)?;

        let forecast = model.predict_with_intervals(test.dates(), config.interval_width)?;
        let predicted = forecast.point().to_vec();
        let (lower, upper) = match (forecast.lower(), forecast.upper()) {
            (Some(lower), Some(upper)) => (lower.to_vec(), upper.to_vec()),
            _ => (predicted.clone(), predicted.clone()),
        };

        let metrics = calculate_metrics(test.values(), &predicted, &lower, &upper)?;
        folds.push(FoldResult {
            cutoff,
            train_size: train.len(),
            dates: test.dates().to_vec(),
            actual: test.values().to_vec(),
            predicted,
            lower,
            upper,
            metrics,
        });
    }

    let fold_metrics: Vec<AccuracyMetrics> = folds.iter().map(|f| f.metrics).collect();
    let aggregated = AccuracyMetrics::mean(&fold_metrics).ok_or_else(|| {
        ForecastError::CrossValidation("no fold had held-out observations".to_string())
    })?;

    Ok(CVResults { folds, aggregated })
}
