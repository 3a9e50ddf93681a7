//! Chart emission.
//!
//! Charts are a side channel: a sink may render, summarize or discard them,
//! and its failures are logged by the caller without touching the outputs.

use crate::aggregate::{EraGroup, TrendRow};
use crate::core::{Forecast, TimeSeries};
use crate::engine::{ForecastResult, SeriesType};
use crate::error::PipelineResult;
use crate::utils::stats::{median, percentile};
use tracing::info;

/// Destination for the pipeline's charts.
pub trait ChartSink {
    /// Popularity distribution per era for a few genres.
    fn era_summary(&mut self, groups: &[EraGroup]) -> PipelineResult<()>;

    /// Mean popularity per year, one line per genre.
    fn genre_trends(&mut self, rows: &[TrendRow]) -> PipelineResult<()>;

    /// Forecast with its prediction interval over the observed history.
    fn forecast(
        &mut self,
        genre: &str,
        history: &TimeSeries,
        forecast: &Forecast,
    ) -> PipelineResult<()>;

    /// Actual against predicted popularity for one genre.
    fn actual_vs_predicted(&mut self, result: &ForecastResult) -> PipelineResult<()>;
}

/// Discards every chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCharts;

impl ChartSink for NoCharts {
    fn era_summary(&mut self, _groups: &[EraGroup]) -> PipelineResult<()> {
        Ok(())
    }

    fn genre_trends(&mut self, _rows: &[TrendRow]) -> PipelineResult<()> {
        Ok(())
    }

    fn forecast(
        &mut self,
        _genre: &str,
        _history: &TimeSeries,
        _forecast: &Forecast,
    ) -> PipelineResult<()> {
        Ok(())
    }

    fn actual_vs_predicted(&mut self, _result: &ForecastResult) -> PipelineResult<()> {
        Ok(())
    }
}

/// Emits a one-line structured summary of each chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCharts;

impl ChartSink for LogCharts {
    fn era_summary(&mut self, groups: &[EraGroup]) -> PipelineResult<()> {
        for group in groups {
            info!(
                chart = "era_box",
                genre = %group.genre,
                era = %group.era,
                n = group.popularity.len(),
                q1 = percentile(&group.popularity, 25.0),
                median = median(&group.popularity),
                q3 = percentile(&group.popularity, 75.0),
                "popularity by era"
            );
        }
        Ok(())
    }

    fn genre_trends(&mut self, rows: &[TrendRow]) -> PipelineResult<()> {
        let first = rows.iter().map(|r| r.release_year).min();
        let last = rows.iter().map(|r| r.release_year).max();
        let mut genres: Vec<&str> = rows.iter().map(|r| r.genre.as_str()).collect();
        genres.sort_unstable();
        genres.dedup();
        info!(
            chart = "genre_trends",
            genres = genres.len(),
            first_year = ?first,
            last_year = ?last,
            "popularity trends by genre"
        );
        Ok(())
    }

    fn forecast(
        &mut self,
        genre: &str,
        history: &TimeSeries,
        forecast: &Forecast,
    ) -> PipelineResult<()> {
        let width = match (forecast.lower(), forecast.upper()) {
            (Some(lower), Some(upper)) => {
                let widths: Vec<f64> = upper.iter().zip(lower).map(|(u, l)| u - l).collect();
                median(&widths)
            }
            _ => 0.0,
        };
        info!(
            chart = "forecast",
            genre,
            observed = history.len(),
            predicted = forecast.horizon(),
            median_interval_width = width,
            "forecast with interval"
        );
        Ok(())
    }

    fn actual_vs_predicted(&mut self, result: &ForecastResult) -> PipelineResult<()> {
        let last_predicted = result
            .rows_of(SeriesType::Predicted)
            .last()
            .map(|r| r.popularity);
        info!(
            chart = "actual_vs_predicted",
            genre = %result.genre,
            actual = result.n_actual(),
            predicted = result.n_predicted(),
            last_predicted = ?last_predicted,
            "actual vs predicted"
        );
        Ok(())
    }
}
