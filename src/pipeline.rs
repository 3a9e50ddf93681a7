//! End-to-end batch run: load, clean, aggregate, forecast, export.

use crate::aggregate::{era_groups, genre_trends, yearly_series};
use crate::catalog::{prepare, CleanCatalog};
use crate::charts::ChartSink;
use crate::config::PipelineConfig;
use crate::engine::{assemble, AccuracyRecord, Assembly, ForecastEngine, GenreReport};
use crate::error::PipelineResult;
use crate::io::{
    genre_file_name, output_path, read_batch, write_cleaned, write_rows, ACCURACY_FILE,
    CLEANED_FILE, COMBINED_FILE,
};
use crate::models::PiecewiseLinearTrend;
use std::path::PathBuf;
use tracing::{info, warn};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub cleaned_rows: usize,
    /// Genres that completed, in processing order.
    pub completed: Vec<String>,
    /// Genres that were skipped, in processing order.
    pub skipped: Vec<String>,
    pub accuracy: Vec<AccuracyRecord>,
    pub written: Vec<PathBuf>,
}

/// Build the forecast engine described by `config`.
pub fn build_engine(config: &PipelineConfig) -> ForecastEngine {
    let trend = config.trend;
    ForecastEngine::with_model(config.engine_config(), move || {
        Box::new(PiecewiseLinearTrend::with_config(trend))
    })
}

/// Forecast the configured genres of a cleaned catalog.
pub fn forecast_catalog(
    catalog: &CleanCatalog,
    config: &PipelineConfig,
    charts: &mut dyn ChartSink,
) -> Vec<GenreReport> {
    if let Err(err) = charts.era_summary(&era_groups(catalog, &config.era_genres[..])) {
        warn!(error = %err, "era chart failed");
    }
    if let Err(err) = charts.genre_trends(&genre_trends(catalog, &config.genres[..])) {
        warn!(error = %err, "trend chart failed");
    }

    let series = yearly_series(catalog, &config.genres[..]);
    build_engine(config).run(&series, charts)
}

/// Run the whole pipeline and write every output file.
///
/// # Errors
/// Input errors are fatal, as is a run where no genre completes. The cleaned
/// catalog is written before forecasting starts.
pub fn run_pipeline(
    config: &PipelineConfig,
    charts: &mut dyn ChartSink,
) -> PipelineResult<RunSummary> {
    config.validate()?;

    let batches = config
        .inputs
        .iter()
        .map(|path| read_batch(path))
        .collect::<PipelineResult<Vec<_>>>()?;
    let catalog = prepare(&batches)?;
    info!(rows = catalog.len(), "prepared catalog");

    let mut written = Vec::new();
    let cleaned_path = output_path(&config.output_dir, CLEANED_FILE)?;
    write_cleaned(&cleaned_path, &catalog)?;
    written.push(cleaned_path);

    let reports = forecast_catalog(&catalog, config, charts);
    let (completed, skipped): (Vec<_>, Vec<_>) =
        reports.iter().partition(|r| r.outcome.is_completed());
    let completed: Vec<String> = completed.into_iter().map(|r| r.genre.clone()).collect();
    let skipped: Vec<String> = skipped.into_iter().map(|r| r.genre.clone()).collect();

    let Assembly {
        per_genre,
        combined,
        accuracy,
    } = assemble(reports)?;

    for result in &per_genre {
        let path = output_path(&config.output_dir, &genre_file_name(&result.genre))?;
        write_rows(&path, &result.rows)?;
        written.push(path);
    }

    let combined_path = output_path(&config.output_dir, COMBINED_FILE)?;
    write_rows(&combined_path, &combined)?;
    written.push(combined_path);

    let accuracy_path = output_path(&config.output_dir, ACCURACY_FILE)?;
    write_rows(&accuracy_path, &accuracy)?;
    written.push(accuracy_path);

    info!(
        completed = completed.len(),
        skipped = skipped.len(),
        "pipeline finished"
    );

    Ok(RunSummary {
        cleaned_rows: catalog.len(),
        completed,
        skipped,
        accuracy,
        written,
    })
}
