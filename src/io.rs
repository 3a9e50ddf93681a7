//! CSV input and output.

use crate::catalog::{CleanCatalog, RawBatch};
use crate::error::PipelineResult;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CLEANED_FILE: &str = "cleaned_combined_spotify_data.csv";
pub const COMBINED_FILE: &str = "all_genres_actual_vs_predicted.csv";
pub const ACCURACY_FILE: &str = "genre_forecast_accuracy.csv";

/// Per-genre actual-vs-predicted file name.
pub fn genre_file_name(genre: &str) -> String {
    format!("{genre}_actual_vs_predicted.csv")
}

/// Read one raw batch from a CSV file.
pub fn read_batch(path: &Path) -> PipelineResult<RawBatch> {
    let file = File::open(path)?;
    let batch = RawBatch::from_reader(BufReader::new(file))?;
    debug!(path = %path.display(), rows = batch.len(), "read input batch");
    Ok(batch)
}

/// Serialize `rows` as CSV into `writer`, header first.
///
/// The header comes from the first row, so an empty slice writes nothing.
pub fn write_rows_to<W: Write, T: Serialize>(writer: W, rows: &[T]) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize `rows` into a CSV file at `path`.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> PipelineResult<()> {
    write_rows_to(File::create(path)?, rows)?;
    debug!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(())
}

/// Write the cleaned catalog, raw columns first.
pub fn write_cleaned(path: &Path, catalog: &CleanCatalog) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(catalog.headers())?;
    for row in catalog.rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = catalog.len(), "wrote cleaned catalog");
    Ok(())
}

/// Create the output directory and return the path of `name` inside it.
pub fn output_path(dir: &Path, name: &str) -> PipelineResult<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.join(name))
}
