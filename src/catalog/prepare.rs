//! Merge, clean and deduplicate raw catalog batches.

use super::raw::RawBatch;
use super::record::{
    normalize_genre, parse_popularity, parse_release_date, release_year, Era, Record,
};
use crate::error::{PipelineError, PipelineResult};
use std::collections::HashSet;
use tracing::debug;

pub const TRACK_NAME: &str = "track_name";
pub const PLAYLIST_GENRE: &str = "playlist_genre";
pub const RELEASE_DATE: &str = "track_album_release_date";
pub const POPULARITY: &str = "track_popularity";

/// Columns every batch union must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = [TRACK_NAME, PLAYLIST_GENRE, RELEASE_DATE, POPULARITY];

/// Columns appended to the cleaned export, in order.
pub const DERIVED_COLUMNS: [&str; 4] = ["release_date", "release_year", "genre", "era"];

/// The cleaned, deduplicated catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanCatalog {
    raw_headers: Vec<String>,
    records: Vec<Record>,
}

impl CleanCatalog {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Header of the cleaned export: raw columns, then derived columns.
    ///
    /// A raw column sharing a derived column's name is replaced by it.
    pub fn headers(&self) -> Vec<String> {
        self.kept_raw_columns()
            .into_iter()
            .map(|i| self.raw_headers[i].clone())
            .chain(DERIVED_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Rows of the cleaned export, aligned with [`CleanCatalog::headers`].
    pub fn rows(&self) -> Vec<Vec<String>> {
        let kept = self.kept_raw_columns();
        self.records
            .iter()
            .map(|record| {
                let mut row: Vec<String> = kept
                    .iter()
                    .map(|&i| record.raw.get(i).cloned().unwrap_or_default())
                    .collect();
                row.push(
                    record
                        .release_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                );
                row.push(
                    record
                        .release_year
                        .map(|y| y.to_string())
                        .unwrap_or_default(),
                );
                row.push(record.genre.clone());
                row.push(record.era.to_string());
                row
            })
            .collect()
    }

    fn kept_raw_columns(&self) -> Vec<usize> {
        self.raw_headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !DERIVED_COLUMNS.contains(&h.as_str()))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Index of each [`REQUIRED_COLUMNS`] entry; the first absent one is an error.
fn required_indexes(batch: &RawBatch) -> PipelineResult<[usize; 4]> {
    let mut indexes = [0usize; 4];
    for (slot, name) in indexes.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = batch
            .column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))?;
    }
    Ok(indexes)
}

/// Clean the given batches into one catalog.
///
/// Stages run in order: merge, exact-row dedup, date parsing, genre
/// normalization, popularity filter, era derivation, track-name dedup.
pub fn prepare(batches: &[RawBatch]) -> PipelineResult<CleanCatalog> {
    let merged = RawBatch::concat(batches);
    debug!(rows = merged.len(), "merged input batches");

    let merged = merged.dedup_exact();
    debug!(rows = merged.len(), "dropped exact duplicate rows");

    let [track_col, genre_col, date_col, popularity_col] = required_indexes(&merged)?;

    let mut unparsed_dates = 0usize;
    let mut with_popularity = Vec::with_capacity(merged.len());
    for (idx, row) in merged.rows().iter().enumerate() {
        let release_date = parse_release_date(merged.cell(idx, date_col));
        if release_date.is_none() {
            unparsed_dates += 1;
        }
        let Some(popularity) = parse_popularity(merged.cell(idx, popularity_col)) else {
            continue;
        };
        let year = release_year(release_date);
        with_popularity.push(Record {
            track_name: merged.cell(idx, track_col).to_string(),
            genre: normalize_genre(merged.cell(idx, genre_col)),
            release_date,
            release_year: year,
            popularity,
            era: Era::from_year(year),
            raw: row.clone(),
        });
    }
    debug!(unparsed_dates, "parsed release dates");
    debug!(
        rows = with_popularity.len(),
        "dropped rows without popularity"
    );

    let mut seen = HashSet::with_capacity(with_popularity.len());
    let records: Vec<Record> = with_popularity
        .into_iter()
        .filter(|r| seen.insert(r.track_name.clone()))
        .collect();
    debug!(rows = records.len(), "dropped duplicate track names");

    Ok(CleanCatalog {
        raw_headers: merged.headers().to_vec(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(headers: &[&str], rows: &[&[&str]]) -> RawBatch {
        RawBatch::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    const HEADERS: [&str; 4] = REQUIRED_COLUMNS;

    #[test]
    fn cleans_and_derives_fields() {
        let a = batch(
            &HEADERS,
            &[
                &["One", " Pop ", "2019-05-01", "70"],
                &["Two", "ROCK", "2021", "40"],
                &["Three", "latin", "soon", "55"],
            ],
        );
        let catalog = prepare(&[a]).unwrap();
        let records = catalog.records();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].genre, "pop");
        assert_eq!(records[0].release_year, Some(2019));
        assert_eq!(records[0].era, Era::Before2020);
        assert_eq!(records[1].genre, "rock");
        assert_eq!(records[1].era, Era::Since2020);
        assert_eq!(records[2].release_year, None);
        assert_eq!(records[2].era, Era::Unknown);
    }

    #[test]
    fn drops_missing_popularity_and_duplicates() {
        let a = batch(
            &HEADERS,
            &[
                &["One", "pop", "2019-05-01", "70"],
                &["One", "pop", "2019-05-01", "70"],
                &["Two", "pop", "2018", ""],
            ],
        );
        let b = batch(
            &HEADERS,
            &[
                &["One", "rock", "2020", "10"],
                &["Three", "rock", "2020", "n/a"],
                &["Four", "rock", "2020", "33"],
            ],
        );
        let catalog = prepare(&[a, b]).unwrap();
        let names: Vec<&str> = catalog
            .records()
            .iter()
            .map(|r| r.track_name.as_str())
            .collect();

        assert_eq!(names, vec!["One", "Four"]);
        assert_eq!(catalog.records()[0].genre, "pop");
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let a = batch(&[TRACK_NAME, PLAYLIST_GENRE, POPULARITY], &[&["x", "pop", "1"]]);
        let err = prepare(&[a]).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == RELEASE_DATE));
    }

    #[test]
    fn each_required_column_is_checked() {
        for missing in REQUIRED_COLUMNS {
            let headers: Vec<&str> = REQUIRED_COLUMNS
                .iter()
                .copied()
                .filter(|h| *h != missing)
                .collect();
            let err = prepare(&[batch(&headers, &[&["x", "pop", "1"]])]).unwrap_err();
            assert!(
                matches!(&err, PipelineError::MissingColumn(c) if c == missing),
                "{missing}: {err:?}"
            );
        }
    }

    #[test]
    fn required_columns_resolve_in_any_header_order() {
        let a = batch(
            &[POPULARITY, "extra", RELEASE_DATE, PLAYLIST_GENRE, TRACK_NAME],
            &[&["64", "-", "2017-08", "Latin", "Uno"]],
        );
        let catalog = prepare(&[a]).unwrap();
        let record = &catalog.records()[0];
        assert_eq!(record.track_name, "Uno");
        assert_eq!(record.genre, "latin");
        assert_eq!(record.release_year, Some(2017));
        assert_eq!(record.popularity, 64.0);
    }

    #[test]
    fn column_present_in_one_batch_is_enough() {
        let a = batch(&[TRACK_NAME, PLAYLIST_GENRE, POPULARITY], &[&["x", "pop", "1"]]);
        let b = batch(&HEADERS, &[&["y", "pop", "2016", "2"]]);
        let catalog = prepare(&[a, b]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].era, Era::Unknown);
    }

    #[test]
    fn export_appends_derived_columns() {
        let a = batch(
            &[TRACK_NAME, "genre", PLAYLIST_GENRE, RELEASE_DATE, POPULARITY],
            &[&["One", "stale", "Pop", "2020-02", "70"]],
        );
        let catalog = prepare(&[a]).unwrap();

        assert_eq!(
            catalog.headers(),
            vec![
                TRACK_NAME,
                PLAYLIST_GENRE,
                RELEASE_DATE,
                POPULARITY,
                "release_date",
                "release_year",
                "genre",
                "era"
            ]
        );
        assert_eq!(
            catalog.rows()[0],
            vec!["One", "Pop", "2020-02", "70", "2020-02-01", "2020", "pop", "2020+"]
        );
    }

    #[test]
    fn empty_input_is_an_empty_catalog() {
        let catalog = prepare(&[batch(&HEADERS, &[])]).unwrap();
        assert!(catalog.is_empty());
    }
}
