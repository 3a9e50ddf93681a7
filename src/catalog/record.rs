//! Cleaned track records and field normalization.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// First year of the "2020+" era.
pub const ERA_BOUNDARY_YEAR: i32 = 2020;

/// Coarse release-time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Era {
    Before2020,
    Since2020,
    /// Release date was missing or unparseable.
    Unknown,
}

impl Era {
    pub fn from_year(year: Option<i32>) -> Era {
        match year {
            Some(y) if y < ERA_BOUNDARY_YEAR => Era::Before2020,
            Some(_) => Era::Since2020,
            None => Era::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Before2020 => "Before 2020",
            Era::Since2020 => "2020+",
            Era::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cleaned track observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub track_name: String,
    pub genre: String,
    pub release_date: Option<NaiveDate>,
    pub release_year: Option<i32>,
    pub popularity: f64,
    pub era: Era,
    /// Source row cells, aligned with the catalog's raw headers.
    pub raw: Vec<String>,
}

/// Lowercase and trim a genre label.
pub fn normalize_genre(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parse a popularity cell; empty or non-numeric cells are missing.
pub fn parse_popularity(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an album release date.
///
/// Accepts `YYYY-MM-DD` (optionally followed by a time part), `YYYY-MM` and
/// `YYYY`. Partial dates resolve to the first day of the period.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = raw.split('-');
    let year = parts.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = match parts.next() {
        None => 1,
        Some(m) if m.len() <= 2 => m.parse().ok()?,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Release year of a parsed date.
pub fn release_year(date: Option<NaiveDate>) -> Option<i32> {
    date.map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn era_buckets() {
        assert_eq!(Era::from_year(Some(2019)), Era::Before2020);
        assert_eq!(Era::from_year(Some(2020)), Era::Since2020);
        assert_eq!(Era::from_year(Some(2024)), Era::Since2020);
        assert_eq!(Era::from_year(None), Era::Unknown);
        assert_eq!(Era::Before2020.to_string(), "Before 2020");
        assert_eq!(Era::Since2020.to_string(), "2020+");
    }

    #[test]
    fn parses_release_date_shapes() {
        assert_eq!(parse_release_date("2019-06-14"), Some(date(2019, 6, 14)));
        assert_eq!(parse_release_date("2019-06"), Some(date(2019, 6, 1)));
        assert_eq!(parse_release_date("1998"), Some(date(1998, 1, 1)));
        assert_eq!(
            parse_release_date("2021-03-05 00:00:00"),
            Some(date(2021, 3, 5))
        );
        assert_eq!(
            parse_release_date("2021-03-05T10:00:00"),
            Some(date(2021, 3, 5))
        );
    }

    #[test]
    fn rejects_unparseable_dates() {
        assert_eq!(parse_release_date(""), None);
        assert_eq!(parse_release_date("unknown"), None);
        assert_eq!(parse_release_date("2019-13"), None);
        assert_eq!(parse_release_date("2019-02-30"), None);
        assert_eq!(parse_release_date("19"), None);
        assert_eq!(parse_release_date("06/14/2019"), None);
    }

    #[test]
    fn normalizes_genre_and_popularity() {
        assert_eq!(normalize_genre("  Hip-Hop "), "hip-hop");
        assert_eq!(normalize_genre("R&B"), "r&b");
        assert_eq!(parse_popularity(" 73 "), Some(73.0));
        assert_eq!(parse_popularity("41.5"), Some(41.5));
        assert_eq!(parse_popularity(""), None);
        assert_eq!(parse_popularity("high"), None);
        assert_eq!(parse_popularity("NaN"), None);
    }

    #[test]
    fn release_year_from_date() {
        assert_eq!(release_year(Some(date(2001, 5, 2))), Some(2001));
        assert_eq!(release_year(None), None);
    }
}
