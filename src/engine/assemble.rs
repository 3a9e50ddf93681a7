//! Merge completed genres into export tables.

use super::outcome::{AccuracyRecord, ForecastResult, ForecastRow, GenreOutcome, GenreReport};
use crate::error::{PipelineError, PipelineResult};

/// Export tables of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// Completed genres in processing order.
    pub per_genre: Vec<ForecastResult>,
    /// All per-genre rows, concatenated in processing order.
    pub combined: Vec<ForecastRow>,
    /// One record per completed genre.
    pub accuracy: Vec<AccuracyRecord>,
}

/// Collect completed outcomes.
///
/// # Errors
/// `EmptyResultSet` when no genre completed.
pub fn assemble(reports: Vec<GenreReport>) -> PipelineResult<Assembly> {
    let mut per_genre = Vec::new();
    let mut accuracy = Vec::new();
    for report in reports {
        if let GenreOutcome::Completed {
            result,
            accuracy: record,
        } = report.outcome
        {
            per_genre.push(result);
            accuracy.push(record);
        }
    }

    if per_genre.is_empty() {
        return Err(PipelineError::EmptyResultSet);
    }

    let combined = per_genre
        .iter()
        .flat_map(|result| result.rows.iter().cloned())
        .collect();

    Ok(Assembly {
        per_genre,
        combined,
        accuracy,
    })
}

const SUMMARY_COLUMNS: [&str; 5] = ["genre", "mae", "rmse", "mape", "coverage"];

/// Heading printed above the accuracy table.
pub const SUMMARY_HEADING: &str = "Forecast Accuracy Summary:";

/// Genre left-aligned, metrics right-aligned, two spaces apart.
fn padded_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            let cell: &str = cell.as_ref();
            if i == 0 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Render the accuracy table as aligned text.
pub fn format_accuracy_summary(records: &[AccuracyRecord]) -> String {
    let cells: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.genre.clone(),
                format!("{:.2}", r.mae),
                format!("{:.2}", r.rmse),
                format!("{:.2}", r.mape),
                format!("{:.2}", r.coverage),
            ]
        })
        .collect();

    let mut widths = SUMMARY_COLUMNS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = padded_line(&SUMMARY_COLUMNS, &widths);
    for row in &cells {
        out.push('\n');
        out.push_str(&padded_line(row, &widths));
    }
    out
}

/// The accuracy table under its heading, as printed at the end of a run.
pub fn format_accuracy_report(records: &[AccuracyRecord]) -> String {
    format!("{SUMMARY_HEADING}\n{}", format_accuracy_summary(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Forecast;
    use crate::engine::SeriesType;
    use chrono::NaiveDate;

    fn completed(genre: &str, years: &[i32]) -> GenreReport {
        let rows = years
            .iter()
            .map(|&y| ForecastRow {
                ds: NaiveDate::from_ymd_opt(y, 1, 1).unwrap(),
                popularity: 50.0,
                genre: genre.to_string(),
                series_type: SeriesType::Actual,
            })
            .collect();
        GenreReport {
            genre: genre.to_string(),
            outcome: GenreOutcome::Completed {
                result: ForecastResult {
                    genre: genre.to_string(),
                    rows,
                    forecast: Forecast::new(),
                },
                accuracy: AccuracyRecord {
                    genre: genre.to_string(),
                    mae: 1.25,
                    rmse: 2.0,
                    mape: 0.03,
                    coverage: 0.5,
                },
            },
        }
    }

    fn skipped(genre: &str) -> GenreReport {
        GenreReport {
            genre: genre.to_string(),
            outcome: GenreOutcome::SkippedInsufficientData { points: 2 },
        }
    }

    #[test]
    fn combined_is_concatenation_in_processing_order() {
        let reports = vec![
            completed("rock", &[2001, 2002]),
            skipped("gospel"),
            completed("pop", &[2010]),
        ];
        let assembly = assemble(reports).unwrap();

        let genres: Vec<&str> = assembly.combined.iter().map(|r| r.genre.as_str()).collect();
        assert_eq!(genres, vec!["rock", "rock", "pop"]);
        let concatenated: Vec<ForecastRow> = assembly
            .per_genre
            .iter()
            .flat_map(|r| r.rows.clone())
            .collect();
        assert_eq!(assembly.combined, concatenated);
        assert_eq!(assembly.accuracy.len(), 2);
        assert_eq!(assembly.accuracy[1].genre, "pop");
    }

    #[test]
    fn nothing_completed_is_an_error() {
        let err = assemble(vec![skipped("gospel")]).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResultSet));
        assert_eq!(err.to_string(), "no genre produced a forecast");
        assert!(matches!(
            assemble(Vec::new()),
            Err(PipelineError::EmptyResultSet)
        ));
    }

    #[test]
    fn summary_is_aligned() {
        let GenreOutcome::Completed { accuracy, .. } = completed("hip-hop", &[2000]).outcome
        else {
            unreachable!()
        };
        let text = format_accuracy_summary(&[accuracy]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "genre     mae  rmse  mape  coverage");
        assert_eq!(lines[1], "hip-hop  1.25  2.00  0.03      0.50");
    }

    #[test]
    fn summary_widens_columns_for_every_row() {
        let records = vec![
            AccuracyRecord {
                genre: "pop".to_string(),
                mae: 1.5,
                rmse: 2.25,
                mape: 0.04,
                coverage: 1.0,
            },
            AccuracyRecord {
                genre: "afrobeats".to_string(),
                mae: 12.5,
                rmse: 103.0,
                mape: 0.2,
                coverage: 0.25,
            },
        ];
        let text = format_accuracy_summary(&records);
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "genre        mae    rmse  mape  coverage",
                "pop         1.50    2.25  0.04      1.00",
                "afrobeats  12.50  103.00  0.20      0.25",
            ]
        );
    }

    #[test]
    fn report_puts_heading_above_table() {
        let GenreOutcome::Completed { accuracy, .. } = completed("pop", &[2000]).outcome else {
            unreachable!()
        };
        let report = format_accuracy_report(&[accuracy.clone()]);
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("Forecast Accuracy Summary:"));
        assert_eq!(
            lines.collect::<Vec<_>>().join("\n"),
            format_accuracy_summary(&[accuracy])
        );
    }
}
