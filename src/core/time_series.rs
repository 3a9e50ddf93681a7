//! TimeSeries data structure for yearly observations.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};

/// Align a date to the first day of its year.
pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// The January 1st timestamp of a calendar year.
pub fn year_date(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| ForecastError::TimestampError(format!("year {year} is out of range")))
}

/// A univariate time series of dated observations.
///
/// Dates are strictly increasing. Values may be any `f64`; models decide
/// whether non-finite values are acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a new series, validating ordering and lengths.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }

        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(
                "timestamps must be strictly increasing".to_string(),
            ));
        }

        Ok(Self {
            dates,
            values,
            label: None,
        })
    }

    /// Create a yearly series from `(year, value)` pairs, one date per
    /// January 1st.
    pub fn yearly(points: &[(i32, f64)]) -> Result<Self> {
        let dates = points
            .iter()
            .map(|&(year, _)| year_date(year))
            .collect::<Result<Vec<_>>>()?;
        let values = points.iter().map(|&(_, v)| v).collect();
        Self::new(dates, values)
    }

    /// Attach a label (for example the genre this series belongs to).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Observations dated on or before `cutoff`.
    pub fn until(&self, cutoff: NaiveDate) -> TimeSeries {
        let end = self.dates.partition_point(|d| *d <= cutoff);
        TimeSeries {
            dates: self.dates[..end].to_vec(),
            values: self.values[..end].to_vec(),
            label: self.label.clone(),
        }
    }

    /// Observations in the half-open window `(after, until]`.
    pub fn window(&self, after: NaiveDate, until: NaiveDate) -> TimeSeries {
        let start = self.dates.partition_point(|d| *d <= after);
        let end = self.dates.partition_point(|d| *d <= until).max(start);
        TimeSeries {
            dates: self.dates[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        }
    }

    /// Historical dates followed by `periods` future yearly dates.
    ///
    /// Future dates are the January 1st of each calendar year after the last
    /// observation, so the extended frame never repeats a year.
    pub fn extend_yearly(&self, periods: usize) -> Result<Vec<NaiveDate>> {
        let last = self.last_date().ok_or(ForecastError::EmptyData)?;
        let mut dates = self.dates.clone();
        for step in 1..=periods {
            let year = last.year() + step as i32;
            dates.push(year_date(year)?);
        }
        Ok(dates)
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }
}
