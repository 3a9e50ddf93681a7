//! Track catalog ingestion and cleaning.

mod prepare;
mod raw;
mod record;

pub use prepare::{prepare, CleanCatalog, DERIVED_COLUMNS, REQUIRED_COLUMNS};
pub use raw::RawBatch;
pub use record::{normalize_genre, parse_popularity, parse_release_date, Era, Record};
