//! Raw tabular batches as read from the source files.

use crate::error::PipelineResult;
use std::collections::HashSet;
use std::io::Read;

/// A header-addressed table of string cells.
///
/// Rows may be shorter than the header; missing trailing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawBatch {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV document with a header row.
    pub fn from_reader<R: Read>(reader: R) -> PipelineResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `row`, `column`; empty when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Concatenate batches, unioning columns by name in order of first
    /// appearance.
    pub fn concat(batches: &[RawBatch]) -> RawBatch {
        let mut headers: Vec<String> = Vec::new();
        for batch in batches {
            for header in &batch.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(batches.iter().map(RawBatch::len).sum());
        for batch in batches {
            let mapping: Vec<Option<usize>> =
                headers.iter().map(|h| batch.column_index(h)).collect();
            for row in 0..batch.len() {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map_or("", |c| batch.cell(row, c)).to_string())
                        .collect(),
                );
            }
        }

        RawBatch { headers, rows }
    }

    /// Drop rows identical in every cell, keeping the first occurrence.
    pub fn dedup_exact(self) -> RawBatch {
        let width = self.headers.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(self.rows.len());
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                row.resize(width.max(row.len()), String::new());
                row
            })
            .filter(|row| seen.insert(row.clone()))
            .collect();
        RawBatch {
            headers: self.headers,
            rows,
        }
    }
}
