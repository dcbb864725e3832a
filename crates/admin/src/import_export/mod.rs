//! CSV import and export.
//!
//! Files are read and written with the `csv` crate, so fields holding
//! commas, quotes or line breaks round-trip intact. Imports are
//! all-or-nothing: every row is checked and all problems are reported
//! together with their line numbers.

pub mod articles;
pub mod bookings;

use serde::Serialize;
use thiserror::Error;

pub use articles::{export_articles, parse_articles};
pub use bookings::export_bookings;

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based line in the file; the header is line 1.
    pub line: u64,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Errors importing a CSV file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("the file has no data rows")]
    Empty,

    #[error("{} row(s) could not be imported", .0.len())]
    Rows(Vec<RowError>),
}

/// Parse a spreadsheet-style yes/no cell. Blank means no.
pub(crate) fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Ok(false),
        "true" | "yes" | "y" | "1" => Ok(true),
        other => Err(format!("expected yes/no, got `{other}`")),
    }
}
