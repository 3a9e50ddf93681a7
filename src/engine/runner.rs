//! The per-genre forecasting loop.

use super::outcome::{
    AccuracyRecord, ForecastResult, ForecastRow, GenreOutcome, GenreReport, SeriesType,
};
use crate::aggregate::GenreYearSeries;
use crate::charts::ChartSink;
use crate::core::year_start;
use crate::error::{ForecastError, PipelineError, Result};
use crate::models::{BoxedForecaster, Forecaster, PiecewiseLinearTrend};
use crate::utils::cross_validation::{cross_validate, CVConfig};
use tracing::{debug, info, warn};

/// Decimal places kept in accuracy records.
pub const METRIC_DECIMALS: u32 = 2;

/// Settings of the forecasting loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Minimum number of yearly points for a genre to be forecast.
    pub min_points: usize,
    /// Number of future yearly periods to predict.
    pub horizon_years: usize,
    pub cv: CVConfig,
    /// Width of the forecast prediction interval.
    pub interval_width: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_points: 6,
            horizon_years: 10,
            cv: CVConfig::default(),
            interval_width: 0.8,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_points < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "min_points must be at least 2, got {}",
                self.min_points
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        self.cv.validate()
    }
}

type ModelFactory = Box<dyn Fn() -> BoxedForecaster>;

/// Fits, forecasts and cross-validates one genre at a time.
///
/// A fresh model is built for every fit, so no state leaks between genres
/// or folds.
pub struct ForecastEngine {
    config: EngineConfig,
    model_factory: ModelFactory,
}

impl std::fmt::Debug for ForecastEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ForecastEngine {
    /// Engine using the default piecewise linear trend model.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_model(config, || Box::new(PiecewiseLinearTrend::new()))
    }

    /// Engine using models built by `factory`.
    pub fn with_model<Factory>(config: EngineConfig, factory: Factory) -> Self
    where
        Factory: Fn() -> BoxedForecaster + 'static,
    {
        Self {
            config,
            model_factory: Box::new(factory),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Forecast one genre.
    pub fn forecast_genre(&self, series: &GenreYearSeries) -> GenreOutcome {
        if series.len() < self.config.min_points {
            return GenreOutcome::SkippedInsufficientData {
                points: series.len(),
            };
        }
        match self.try_forecast(series) {
            Ok((result, accuracy)) => GenreOutcome::Completed { result, accuracy },
            Err(err) => GenreOutcome::SkippedFitError(err.to_string()),
        }
    }

    fn try_forecast(&self, series: &GenreYearSeries) -> Result<(ForecastResult, AccuracyRecord)> {
        self.config.validate()?;
        let history = series.to_time_series()?;

        let mut model = (self.model_factory)();
        model.fit(&history)?;

        let dates = history.extend_yearly(self.config.horizon_years)?;
        let forecast = model.predict_with_intervals(&dates, self.config.interval_width)?;
        if forecast.point().iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "model produced non-finite predictions".to_string(),
            ));
        }

        let actual = history
            .dates()
            .iter()
            .zip(history.values())
            .map(|(&ds, &popularity)| (ds, popularity, SeriesType::Actual));
        let predicted = forecast
            .dates()
            .iter()
            .zip(forecast.point())
            .map(|(&ds, &popularity)| (ds, popularity, SeriesType::Predicted));
        let rows = actual
            .chain(predicted)
            .map(|(ds, popularity, series_type)| ForecastRow {
                ds: year_start(ds),
                popularity,
                genre: series.genre.clone(),
                series_type,
            })
            .collect();

        let cv_config = self.config.cv.with_interval_width(self.config.interval_width);
        let cv = cross_validate(&cv_config, &history, || (self.model_factory)())?;
        debug!(genre = %series.genre, folds = cv.n_folds(), "cross-validated");

        let accuracy =
            AccuracyRecord::from_metrics(&series.genre, cv.aggregated.rounded(METRIC_DECIMALS));
        let result = ForecastResult {
            genre: series.genre.clone(),
            rows,
            forecast,
        };
        Ok((result, accuracy))
    }

    /// Forecast every series in order, emitting charts for completed genres.
    pub fn run(&self, series: &[GenreYearSeries], charts: &mut dyn ChartSink) -> Vec<GenreReport> {
        let mut reports = Vec::with_capacity(series.len());
        for genre_series in series {
            let genre = genre_series.genre.as_str();
            let outcome = self.forecast_genre(genre_series);
            match &outcome {
                GenreOutcome::Completed { result, accuracy } => {
                    info!(
                        genre,
                        mae = accuracy.mae,
                        rmse = accuracy.rmse,
                        mape = accuracy.mape,
                        coverage = accuracy.coverage,
                        "forecast completed"
                    );
                    self.emit_charts(genre_series, result, charts);
                }
                GenreOutcome::SkippedInsufficientData { points } => {
                    debug!(
                        genre,
                        points,
                        needed = self.config.min_points,
                        "skipping genre: not enough yearly data"
                    );
                }
                GenreOutcome::SkippedFitError(message) => {
                    warn!(genre, error = %message, "skipping genre: forecast failed");
                }
            }
            reports.push(GenreReport {
                genre: genre.to_string(),
                outcome,
            });
        }
        reports
    }

    fn emit_charts(
        &self,
        series: &GenreYearSeries,
        result: &ForecastResult,
        charts: &mut dyn ChartSink,
    ) {
        let drawn = series
            .to_time_series()
            .map_err(PipelineError::from)
            .and_then(|history| charts.forecast(&series.genre, &history, &result.forecast))
            .and_then(|()| charts.actual_vs_predicted(result));
        if let Err(err) = drawn {
            warn!(genre = %series.genre, error = %err, "chart emission failed");
        }
    }
}
