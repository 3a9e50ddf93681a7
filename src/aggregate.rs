//! Per-genre yearly popularity aggregation.

use crate::catalog::{CleanCatalog, Era};
use crate::core::TimeSeries;
use crate::error::Result;
use crate::utils::stats::mean;
use serde::Serialize;
use std::collections::BTreeMap;

/// Genres forecast by default.
pub const POPULAR_GENRES: [&str; 8] = [
    "pop",
    "rock",
    "hip-hop",
    "afrobeats",
    "r&b",
    "latin",
    "brazilian",
    "gospel",
];

/// Genres compared across eras.
pub const ERA_GENRES: [&str; 3] = ["pop", "rock", "hip-hop"];

/// Mean popularity per release year for one genre.
///
/// Years are unique and strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreYearSeries {
    pub genre: String,
    pub points: Vec<(i32, f64)>,
}

impl GenreYearSeries {
    pub fn empty(genre: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// January-1st series labelled with the genre.
    pub fn to_time_series(&self) -> Result<TimeSeries> {
        Ok(TimeSeries::yearly(&self.points)?.with_label(self.genre.clone()))
    }
}

/// One row of the genre trend table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub release_year: i32,
    pub genre: String,
    pub track_popularity: f64,
}

/// Popularity values of one genre within one era.
#[derive(Debug, Clone, PartialEq)]
pub struct EraGroup {
    pub genre: String,
    pub era: Era,
    pub popularity: Vec<f64>,
}

fn grouped(catalog: &CleanCatalog) -> BTreeMap<String, BTreeMap<i32, Vec<f64>>> {
    let mut groups: BTreeMap<String, BTreeMap<i32, Vec<f64>>> = BTreeMap::new();
    for record in catalog.records() {
        let Some(year) = record.release_year else {
            continue;
        };
        groups
            .entry(record.genre.clone())
            .or_default()
            .entry(year)
            .or_default()
            .push(record.popularity);
    }
    groups
}

fn to_series(genre: &str, years: &BTreeMap<i32, Vec<f64>>) -> GenreYearSeries {
    GenreYearSeries {
        genre: genre.to_string(),
        points: years.iter().map(|(&y, vals)| (y, mean(vals))).collect(),
    }
}

/// Series for the given genres, in the given order.
///
/// Genres absent from the catalog yield an empty series.
pub fn yearly_series<S: AsRef<str>>(catalog: &CleanCatalog, genres: &[S]) -> Vec<GenreYearSeries> {
    let groups = grouped(catalog);
    genres
        .iter()
        .map(|g| {
            let genre = g.as_ref();
            groups
                .get(genre)
                .map(|years| to_series(genre, years))
                .unwrap_or_else(|| GenreYearSeries::empty(genre))
        })
        .collect()
}

/// Flat (year, genre, mean) table for the given genres, ordered by year,
/// then genre.
pub fn genre_trends<S: AsRef<str>>(catalog: &CleanCatalog, genres: &[S]) -> Vec<TrendRow> {
    let mut rows: Vec<TrendRow> = grouped(catalog)
        .iter()
        .filter(|(genre, _)| genres.iter().any(|g| g.as_ref() == genre.as_str()))
        .flat_map(|(genre, years)| {
            years.iter().map(move |(&year, vals)| TrendRow {
                release_year: year,
                genre: genre.clone(),
                track_popularity: mean(vals),
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.release_year
            .cmp(&b.release_year)
            .then_with(|| a.genre.cmp(&b.genre))
    });
    rows
}

/// Popularity values grouped by (genre, era) for the given genres.
///
/// Groups follow the genre order given, then era order; empty groups are
/// omitted.
pub fn era_groups<S: AsRef<str>>(catalog: &CleanCatalog, genres: &[S]) -> Vec<EraGroup> {
    let mut groups = Vec::new();
    for g in genres {
        let genre = g.as_ref();
        let mut by_era: BTreeMap<Era, Vec<f64>> = BTreeMap::new();
        for record in catalog.records().iter().filter(|r| r.genre == genre) {
            by_era.entry(record.era).or_default().push(record.popularity);
        }
        groups.extend(by_era.into_iter().map(|(era, popularity)| EraGroup {
            genre: genre.to_string(),
            era,
            popularity,
        }));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{prepare, RawBatch};
    use approx::assert_relative_eq;

    fn catalog(rows: &[(&str, &str, &str, &str)]) -> CleanCatalog {
        let headers = [
            "track_name",
            "playlist_genre",
            "track_album_release_date",
            "track_popularity",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        let rows = rows
            .iter()
            .map(|&(a, b, c, d)| vec![a.into(), b.into(), c.into(), d.into()])
            .collect();
        prepare(&[RawBatch::new(headers, rows)]).unwrap()
    }

    fn sample() -> CleanCatalog {
        catalog(&[
            ("a", "pop", "2018-02-01", "60"),
            ("b", "pop", "2018-07-01", "70"),
            ("c", "pop", "2020", "40"),
            ("d", "rock", "2019", "30"),
            ("e", "rock", "", "99"),
            ("f", "latin", "2017-03", "50"),
        ])
    }

    #[test]
    fn averages_per_year() {
        let series = yearly_series(&sample(), &["pop"]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].genre, "pop");
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[0].points[0].0, 2018);
        assert_relative_eq!(series[0].points[0].1, 65.0);
        assert_relative_eq!(series[0].points[1].1, 40.0);
    }

    #[test]
    fn missing_year_does_not_contribute() {
        let series = yearly_series(&sample(), &["rock"]);
        assert_eq!(series[0].points, vec![(2019, 30.0)]);
    }

    #[test]
    fn absent_genre_is_empty_and_order_is_kept() {
        let series = yearly_series(&sample(), &["gospel", "latin", "pop"]);
        let genres: Vec<&str> = series.iter().map(|s| s.genre.as_str()).collect();
        assert_eq!(genres, vec!["gospel", "latin", "pop"]);
        assert!(series[0].is_empty());
        assert_eq!(series[1].len(), 1);
    }

    #[test]
    fn trend_table_is_sorted_by_year_then_genre() {
        let rows = genre_trends(&sample(), &POPULAR_GENRES);
        let keys: Vec<(i32, &str)> = rows
            .iter()
            .map(|r| (r.release_year, r.genre.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![(2017, "latin"), (2018, "pop"), (2019, "rock"), (2020, "pop")]
        );
    }

    #[test]
    fn trend_table_keeps_only_listed_genres() {
        let rows = genre_trends(&sample(), &["rock", "pop", "jazz"]);
        let keys: Vec<(i32, &str)> = rows
            .iter()
            .map(|r| (r.release_year, r.genre.as_str()))
            .collect();
        assert_eq!(keys, vec![(2018, "pop"), (2019, "rock"), (2020, "pop")]);
        assert_relative_eq!(rows[0].track_popularity, 65.0);

        assert!(genre_trends::<&str>(&sample(), &[]).is_empty());
    }

    #[test]
    fn era_groups_split_by_era() {
        let groups = era_groups(&sample(), &ERA_GENRES);
        let keys: Vec<(&str, Era, usize)> = groups
            .iter()
            .map(|g| (g.genre.as_str(), g.era, g.popularity.len()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("pop", Era::Before2020, 2),
                ("pop", Era::Since2020, 1),
                ("rock", Era::Before2020, 1),
                ("rock", Era::Unknown, 1),
            ]
        );
    }

    #[test]
    fn series_converts_to_january_dates() {
        let series = yearly_series(&sample(), &["pop"]).remove(0);
        let ts = series.to_time_series().unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.label(), Some("pop"));
        assert_eq!(
            ts.dates()[0],
            chrono::NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
        );
    }
}
