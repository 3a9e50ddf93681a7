//! Piecewise linear trend model with automatic changepoints.
//!
//! The trend is `k * t + m + sum_j delta_j * max(0, t - s_j)` on a time axis
//! scaled to `[0, 1]` over the training span, so the curve stays continuous
//! at every changepoint `s_j`. Changepoint rate adjustments `delta_j` carry a
//! Laplace prior; the MAP estimate is found by coordinate descent, which
//! turns the prior into soft-thresholding.
//!
//! Prediction intervals are simulated: each trajectory draws new future
//! changepoints at the historical rate with Laplace-distributed rate changes
//! and adds Gaussian observation noise.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::percentile_sorted;
use chrono::NaiveDate;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use statrs::distribution::{Laplace, Normal, Poisson};

/// Lower bound on the scaled observation noise.
const SIGMA_FLOOR: f64 = 1e-9;
/// Prior scale for base rate and offset.
const BASE_PRIOR_SCALE: f64 = 5.0;
/// Noise re-estimation rounds around the inner coordinate descent.
const OUTER_ROUNDS: usize = 25;

/// Configuration for [`PiecewiseLinearTrend`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Maximum number of potential changepoints.
    pub n_changepoints: usize,
    /// Proportion of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Laplace prior scale on changepoint rate adjustments.
    pub changepoint_prior_scale: f64,
    /// Number of simulated trajectories for prediction intervals.
    pub uncertainty_samples: usize,
    /// Seed for interval simulation.
    pub seed: u64,
    /// Maximum coordinate descent sweeps per noise round.
    pub max_iterations: usize,
    /// Convergence tolerance on coefficient updates.
    pub tolerance: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            uncertainty_samples: 1000,
            seed: 0,
            max_iterations: 1000,
            tolerance: 1e-10,
        }
    }
}

#[derive(Debug, Clone)]
struct FittedTrend {
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    k: f64,
    m: f64,
    changepoints: Vec<f64>,
    deltas: Vec<f64>,
    /// Scaled observation noise.
    sigma: f64,
}

impl FittedTrend {
    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// Trend in scaled units.
    fn trend_at(&self, t: f64) -> f64 {
        let adjustment: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(&s, &d)| d * (t - s).max(0.0))
            .sum();
        self.k * t + self.m + adjustment
    }
}

/// Piecewise linear trend forecaster.
///
/// Suited to short yearly series with no seasonality: the trend bends at
/// changepoints placed over the first part of the history and extrapolates
/// the final slope.
#[derive(Debug, Clone)]
pub struct PiecewiseLinearTrend {
    config: TrendConfig,
    model: Option<FittedTrend>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl Default for PiecewiseLinearTrend {
    fn default() -> Self {
        Self::new()
    }
}

impl PiecewiseLinearTrend {
    pub fn new() -> Self {
        Self::with_config(TrendConfig::default())
    }

    pub fn with_config(config: TrendConfig) -> Self {
        Self {
            config,
            model: None,
            fitted: None,
            residuals: None,
        }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Changepoint locations on the scaled time axis.
    pub fn changepoints(&self) -> Option<&[f64]> {
        self.model.as_ref().map(|m| m.changepoints.as_slice())
    }

    /// Rate adjustments at each changepoint (scaled units).
    pub fn deltas(&self) -> Option<&[f64]> {
        self.model.as_ref().map(|m| m.deltas.as_slice())
    }

    /// Slope after the last changepoint, in value units per day.
    pub fn final_rate_per_day(&self) -> Option<f64> {
        self.model.as_ref().map(|m| {
            let scaled = m.k + m.deltas.iter().sum::<f64>();
            scaled * m.y_scale / m.span_days
        })
    }

    /// Observation noise standard deviation in value units.
    pub fn sigma(&self) -> Option<f64> {
        self.model.as_ref().map(|m| m.sigma * m.y_scale)
    }

    fn fitted_model(&self) -> Result<&FittedTrend> {
        self.model.as_ref().ok_or(ForecastError::FitRequired)
    }
}

/// Place up to `n` changepoints uniformly over the first `range` of `t`.
///
/// The first observation is never a changepoint and at most
/// `floor(len * range) - 1` are placed.
pub fn select_changepoints(t: &[f64], n: usize, range: f64) -> Vec<f64> {
    let hist_size = ((t.len() as f64) * range).floor() as usize;
    let hist_size = hist_size.min(t.len());
    let count = n.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| {
            let idx = (i as f64 * last / count as f64).round() as usize;
            t[idx]
        })
        .collect()
}

/// Ordinary least squares for `y ~ k * t + m`.
fn ols_linear_trend(t: &[f64], y: &[f64]) -> (f64, f64) {
    let n = t.len() as f64;
    let sum_t: f64 = t.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_tt: f64 = t.iter().map(|v| v * v).sum();
    let sum_ty: f64 = t.iter().zip(y).map(|(ti, yi)| ti * yi).sum();
    let denom = n * sum_tt - sum_t * sum_t;
    if denom.abs() < 1e-12 {
        return (0.0, sum_y / n);
    }
    let k = (n * sum_ty - sum_t * sum_y) / denom;
    let m = (sum_y - k * sum_t) / n;
    (k, m)
}

fn soft_threshold(x: f64, lambda: f64) -> f64 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}

fn mean_square(r: &[f64]) -> f64 {
    (r.iter().map(|v| v * v).sum::<f64>() / r.len() as f64).max(SIGMA_FLOOR * SIGMA_FLOOR)
}

impl Forecaster for PiecewiseLinearTrend {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let n = series.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData { needed: 2, got: n });
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        if !(self.config.changepoint_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "changepoint_prior_scale must be positive".to_string(),
            ));
        }

        let dates = series.dates();
        let start = dates[0];
        let span_days = (dates[n - 1] - start).num_days() as f64;
        if span_days <= 0.0 {
            return Err(ForecastError::TimestampError(
                "series spans zero days".to_string(),
            ));
        }

        let values = series.values();
        let y_scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = select_changepoints(
            &t,
            self.config.n_changepoints,
            self.config.changepoint_range,
        );

        // Columns: rate, offset, then one hinge per changepoint.
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(2 + changepoints.len());
        columns.push(t.clone());
        columns.push(vec![1.0; n]);
        for &s in &changepoints {
            columns.push(t.iter().map(|&ti| (ti - s).max(0.0)).collect());
        }
        let col_sq: Vec<f64> = columns
            .iter()
            .map(|c| c.iter().map(|x| x * x).sum())
            .collect();

        let (k0, m0) = ols_linear_trend(&t, &y);
        let mut beta = vec![0.0; columns.len()];
        beta[0] = k0;
        beta[1] = m0;

        let mut residuals: Vec<f64> = (0..n).map(|i| y[i] - (k0 * t[i] + m0)).collect();
        let mut sigma2 = mean_square(&residuals);

        for _ in 0..OUTER_ROUNDS {
            let lambda = sigma2 / self.config.changepoint_prior_scale;
            let ridge = sigma2 / (BASE_PRIOR_SCALE * BASE_PRIOR_SCALE);

            for _ in 0..self.config.max_iterations {
                let mut max_change = 0.0_f64;
                for j in 0..columns.len() {
                    let z = col_sq[j];
                    if z == 0.0 {
                        continue;
                    }
                    let column = &columns[j];
                    let rho: f64 = column
                        .iter()
                        .zip(&residuals)
                        .map(|(x, r)| x * r)
                        .sum::<f64>()
                        + z * beta[j];
                    let updated = if j < 2 {
                        rho / (z + ridge)
                    } else {
                        soft_threshold(rho, lambda) / z
                    };
                    let change = updated - beta[j];
                    if change != 0.0 {
                        for (r, x) in residuals.iter_mut().zip(column) {
                            *r -= x * change;
                        }
                        beta[j] = updated;
                    }
                    max_change = max_change.max(change.abs());
                }
                if max_change < self.config.tolerance {
                    break;
                }
            }

            let next = mean_square(&residuals);
            let settled = (next - sigma2).abs() <= self.config.tolerance * sigma2.max(1.0);
            sigma2 = next;
            if settled {
                break;
            }
        }

        if beta.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::ComputationError(
                "trend coefficients did not converge".to_string(),
            ));
        }

        let model = FittedTrend {
            start,
            span_days,
            y_scale,
            k: beta[0],
            m: beta[1],
            deltas: beta[2..].to_vec(),
            changepoints,
            sigma: sigma2.sqrt(),
        };

        let fitted: Vec<f64> = t.iter().map(|&ti| model.trend_at(ti) * y_scale).collect();
        self.residuals = Some(values.iter().zip(&fitted).map(|(v, f)| v - f).collect());
        self.fitted = Some(fitted);
        self.model = Some(model);

        Ok(())
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast> {
        let model = self.fitted_model()?;
        let values = dates
            .iter()
            .map(|d| model.trend_at(model.scaled_time(*d)) * model.y_scale)
            .collect();
        Forecast::from_values(dates.to_vec(), values)
    }

    fn predict_with_intervals(&self, dates: &[NaiveDate], level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must be in (0, 1), got {level}"
            )));
        }
        let model = self.fitted_model()?;
        let t: Vec<f64> = dates.iter().map(|d| model.scaled_time(*d)).collect();
        let base: Vec<f64> = t.iter().map(|&ti| model.trend_at(ti)).collect();
        let point: Vec<f64> = base.iter().map(|b| b * model.y_scale).collect();

        let samples = self.config.uncertainty_samples;
        if samples == 0 || dates.is_empty() {
            return Forecast::from_values_with_intervals(
                dates.to_vec(),
                point.clone(),
                point.clone(),
                point,
            );
        }

        let noise = Normal::new(0.0, model.sigma.max(SIGMA_FLOOR))
            .map_err(|e| ForecastError::ComputationError(e.to_string()))?;

        let t_max = t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let n_changepoints = model.changepoints.len();
        let rate = n_changepoints as f64 * (t_max - 1.0);
        let future_changes = if n_changepoints > 0 && rate > 0.0 {
            let mean_abs_delta =
                model.deltas.iter().map(|d| d.abs()).sum::<f64>() / n_changepoints as f64;
            let count = Poisson::new(rate)
                .map_err(|e| ForecastError::ComputationError(e.to_string()))?;
            let size = Laplace::new(0.0, mean_abs_delta + 1e-8)
                .map_err(|e| ForecastError::ComputationError(e.to_string()))?;
            Some((count, size))
        } else {
            None
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut draws: Vec<Vec<f64>> = vec![Vec::with_capacity(samples); dates.len()];
        let mut new_changes: Vec<(f64, f64)> = Vec::new();

        for _ in 0..samples {
            new_changes.clear();
            if let Some((count, size)) = &future_changes {
                let n_new: f64 = count.sample(&mut rng);
                for _ in 0..n_new as usize {
                    let location = rng.gen_range(1.0..t_max);
                    new_changes.push((location, size.sample(&mut rng)));
                }
            }

            for (i, &ti) in t.iter().enumerate() {
                let extra: f64 = new_changes
                    .iter()
                    .map(|&(s, d)| d * (ti - s).max(0.0))
                    .sum();
                draws[i].push(base[i] + extra + noise.sample(&mut rng));
            }
        }

        let lower_q = (1.0 - level) / 2.0 * 100.0;
        let upper_q = (1.0 + level) / 2.0 * 100.0;
        let mut lower = Vec::with_capacity(dates.len());
        let mut upper = Vec::with_capacity(dates.len());
        for sims in &mut draws {
            sims.sort_by(|a, b| a.total_cmp(b));
            lower.push(percentile_sorted(sims, lower_q) * model.y_scale);
            upper.push(percentile_sorted(sims, upper_q) * model.y_scale);
        }

        Forecast::from_values_with_intervals(dates.to_vec(), point, lower, upper)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "PiecewiseLinearTrend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear_series() -> TimeSeries {
        let points: Vec<(i32, f64)> = (2010..=2020)
            .map(|y| (y, 10.0 + 2.0 * (y - 2010) as f64))
            .collect();
        TimeSeries::yearly(&points).unwrap()
    }

    fn pop_series() -> TimeSeries {
        let values = [50.0, 52.0, 55.0, 53.0, 58.0, 60.0, 63.0, 65.0];
        let points: Vec<(i32, f64)> = (2015..).zip(values).collect();
        TimeSeries::yearly(&points).unwrap()
    }

    #[test]
    fn changepoints_cover_first_part_of_history() {
        let t: Vec<f64> = (0..8).map(|i| i as f64 / 7.0).collect();
        let cps = select_changepoints(&t, 25, 0.8);
        // floor(8 * 0.8) = 6 -> 5 changepoints at indexes 1..=5
        assert_eq!(cps, t[1..=5].to_vec());

        let cps = select_changepoints(&t, 2, 0.8);
        assert_eq!(cps.len(), 2);
        assert!(cps.iter().all(|&c| c <= t[5]));

        assert!(select_changepoints(&t[..2], 25, 0.8).is_empty());
    }

    #[test]
    fn linear_series_extrapolates_linearly() {
        let ts = linear_series();
        let mut model = PiecewiseLinearTrend::new();
        model.fit(&ts).unwrap();

        let future = ts.extend_yearly(3).unwrap();
        let forecast = model.predict(&future[ts.len()..]).unwrap();
        assert_relative_eq!(forecast.point()[0], 32.0, epsilon = 0.05);
        assert_relative_eq!(forecast.point()[1], 34.0, epsilon = 0.05);
        assert_relative_eq!(forecast.point()[2], 36.0, epsilon = 0.05);

        let per_year = model.final_rate_per_day().unwrap() * 365.25;
        assert_relative_eq!(per_year, 2.0, epsilon = 0.01);
    }

    #[test]
    fn fitted_values_and_residuals_cover_history() {
        let ts = pop_series();
        let mut model = PiecewiseLinearTrend::new();
        model.fit(&ts).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), 8);
        assert_eq!(residuals.len(), 8);
        for ((v, f), r) in ts.values().iter().zip(fitted).zip(residuals) {
            assert_relative_eq!(v - f, *r, epsilon = 1e-9);
        }
        assert_eq!(model.changepoints().unwrap().len(), 5);
        assert!(model.sigma().unwrap() > 0.0);
    }

    #[test]
    fn intervals_bracket_point_forecast() {
        let ts = pop_series();
        let mut model = PiecewiseLinearTrend::new();
        model.fit(&ts).unwrap();

        let dates = ts.extend_yearly(10).unwrap();
        let forecast = model.predict_with_intervals(&dates, 0.8).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();

        assert_eq!(forecast.horizon(), 18);
        for i in 0..forecast.horizon() {
            assert!(lower[i] <= forecast.point()[i], "lower above point at {i}");
            assert!(upper[i] >= forecast.point()[i], "upper below point at {i}");
        }
    }

    #[test]
    fn intervals_are_reproducible() {
        let ts = pop_series();
        let dates = ts.extend_yearly(5).unwrap();

        let mut a = PiecewiseLinearTrend::new();
        let mut b = PiecewiseLinearTrend::new();
        a.fit(&ts).unwrap();
        b.fit(&ts).unwrap();

        assert_eq!(
            a.predict_with_intervals(&dates, 0.8).unwrap(),
            b.predict_with_intervals(&dates, 0.8).unwrap()
        );
    }

    #[test]
    fn zero_samples_collapse_intervals() {
        let ts = pop_series();
        let config = TrendConfig {
            uncertainty_samples: 0,
            ..TrendConfig::default()
        };
        let mut model = PiecewiseLinearTrend::with_config(config);
        model.fit(&ts).unwrap();

        let forecast = model.predict_with_intervals(ts.dates(), 0.8).unwrap();
        assert_eq!(forecast.lower().unwrap(), forecast.point());
        assert_eq!(forecast.upper().unwrap(), forecast.point());
    }

    #[test]
    fn fit_rejects_bad_input() {
        let mut model = PiecewiseLinearTrend::new();

        let single = TimeSeries::yearly(&[(2020, 1.0)]).unwrap();
        assert_eq!(
            model.fit(&single).unwrap_err(),
            ForecastError::InsufficientData { needed: 2, got: 1 }
        );

        let nan = TimeSeries::yearly(&[(2019, 1.0), (2020, f64::NAN)]).unwrap();
        assert_eq!(model.fit(&nan).unwrap_err(), ForecastError::MissingValues);
        assert!(!model.is_fitted());
    }

    #[test]
    fn predict_requires_fit_and_valid_level() {
        let model = PiecewiseLinearTrend::new();
        let dates = pop_series().dates().to_vec();
        assert_eq!(model.predict(&dates).unwrap_err(), ForecastError::FitRequired);

        let mut model = PiecewiseLinearTrend::new();
        model.fit(&pop_series()).unwrap();
        assert!(matches!(
            model.predict_with_intervals(&dates, 1.2),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn constant_zero_series_is_flat() {
        let points: Vec<(i32, f64)> = (2010..2016).map(|y| (y, 0.0)).collect();
        let ts = TimeSeries::yearly(&points).unwrap();
        let mut model = PiecewiseLinearTrend::new();
        model.fit(&ts).unwrap();

        let forecast = model.predict(&ts.extend_yearly(2).unwrap()).unwrap();
        assert!(forecast.point().iter().all(|v| v.abs() < 1e-9));
    }
}
