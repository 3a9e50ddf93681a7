//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};
use crate::utils::stats::round_to;

/// Absolute actual values below this make MAPE undefined.
pub const MAPE_ZERO_THRESHOLD: f64 = 1e-8;

/// Accuracy metrics for one evaluation window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, as a fraction (0.05 = 5%)
    pub mape: f64,
    /// Fraction of actuals inside the prediction interval
    pub coverage: f64,
}

impl AccuracyMetrics {
    /// Arithmetic mean of each metric across `folds`.
    pub fn mean(folds: &[AccuracyMetrics]) -> Option<AccuracyMetrics> {
        if folds.is_empty() {
            return None;
        }
        let n = folds.len() as f64;
        let sum = |f: fn(&AccuracyMetrics) -> f64| folds.iter().map(f).sum::<f64>() / n;
        Some(AccuracyMetrics {
            mae: sum(|m| m.mae),
            rmse: sum(|m| m.rmse),
            mape: sum(|m| m.mape),
            coverage: sum(|m| m.coverage),
        })
    }

    /// Copy with every metric rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> AccuracyMetrics {
        AccuracyMetrics {
            mae: round_to(self.mae, decimals),
            rmse: round_to(self.rmse, decimals),
            mape: round_to(self.mape, decimals),
            coverage: round_to(self.coverage, decimals),
        }
    }
}

/// Calculate accuracy metrics between actual values and an interval forecast.
///
/// # Arguments
/// * `actual` - Actual observed values
/// * `predicted` - Point predictions
/// * `lower` / `upper` - Prediction interval bounds
///
/// # Errors
/// `EmptyData` for empty input, `DimensionMismatch` for unequal lengths and
/// `ComputationError` when an actual value is too close to zero for MAPE.
pub fn calculate_metrics(
    actual: &[f64],
    predicted: &[f64],
    lower: &[f64],
    upper: &[f64],
) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    for len in [predicted.len(), lower.len(), upper.len()] {
        if len != actual.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: actual.len(),
                got: len,
            });
        }
    }

    let mape = mape(actual, predicted).ok_or_else(|| {
        ForecastError::ComputationError(
            "MAPE is undefined when actual values are close to zero".to_string(),
        )
    })?;

    Ok(AccuracyMetrics {
        mae: mae(actual, predicted),
        rmse: rmse(actual, predicted),
        mape,
        coverage: coverage(actual, lower, upper),
    })
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Calculate MAPE as a fraction. `None` if any actual is near zero.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return None;
    }
    if actual.iter().any(|a| a.abs() < MAPE_ZERO_THRESHOLD) {
        return None;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| ((a - p) / a).abs())
        .sum();
    Some(sum / actual.len() as f64)
}

/// Fraction of actual values inside `[lower, upper]`.
pub fn coverage(actual: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let inside = actual
        .iter()
        .zip(lower.iter().zip(upper))
        .filter(|(&a, (&lo, &up))| a >= lo && a <= up)
        .count();
    inside as f64 / actual.len() as f64
}
