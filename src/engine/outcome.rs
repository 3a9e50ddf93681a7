//! Per-genre results produced by the forecast engine.

use crate::core::Forecast;
use crate::utils::metrics::AccuracyMetrics;
use chrono::NaiveDate;
use serde::Serialize;

/// Whether a row is an observation or a model value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SeriesType {
    Actual,
    Predicted,
}

/// One row of an actual-vs-predicted table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub popularity: f64,
    pub genre: String,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
}

/// Forecast output for one genre.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub genre: String,
    /// Actual rows by year, then predicted rows by year.
    pub rows: Vec<ForecastRow>,
    /// Model output over history and future, with intervals.
    pub forecast: Forecast,
}

impl ForecastResult {
    pub fn rows_of(&self, series_type: SeriesType) -> impl Iterator<Item = &ForecastRow> {
        self.rows.iter().filter(move |r| r.series_type == series_type)
    }

    pub fn n_actual(&self) -> usize {
        self.rows_of(SeriesType::Actual).count()
    }

    pub fn n_predicted(&self) -> usize {
        self.rows_of(SeriesType::Predicted).count()
    }
}

/// Cross-validated accuracy of one genre's forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyRecord {
    pub genre: String,
    pub mae: f64,
    pub rmse: f64,
    pub mape: f64,
    pub coverage: f64,
}

impl AccuracyRecord {
    pub fn from_metrics(genre: impl Into<String>, metrics: AccuracyMetrics) -> Self {
        Self {
            genre: genre.into(),
            mae: metrics.mae,
            rmse: metrics.rmse,
            mape: metrics.mape,
            coverage: metrics.coverage,
        }
    }
}

/// Terminal state of one genre.
#[derive(Debug, Clone, PartialEq)]
pub enum GenreOutcome {
    Completed {
        result: ForecastResult,
        accuracy: AccuracyRecord,
    },
    SkippedInsufficientData {
        points: usize,
    },
    SkippedFitError(String),
}

impl GenreOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, GenreOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenreReport {
    pub genre: String,
    pub outcome: GenreOutcome,
}
