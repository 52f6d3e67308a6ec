//! Error types for the index, news feed, and text extraction seams.
//!
//! Structural failures (missing store, missing column, unreadable file) are
//! surfaced to the caller as [`IndexError`]. Per-document extraction problems
//! are [`ExtractError`]s, which the ingest pipeline logs and skips.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reading, querying, or writing a tabular store.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The backing CSV file does not exist.
    #[error("store not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    /// No record with this id exists in the index.
    #[error("document not found: {0}")]
    RecordNotFound(String),

    /// A required column is missing from the CSV header.
    #[error("{path} is missing required column '{column}' (found: {found})")]
    Schema {
        path: String,
        column: &'static str,
        found: String,
    },

    /// A record with this id is already registered.
    #[error("document already registered: {0}")]
    DuplicateId(String),

    /// A caller-supplied date is not `YYYY-MM-DD`.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// True for the "absent" family (store or record), as opposed to a
    /// store that exists but cannot be read.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IndexError::StoreNotFound(_) | IndexError::RecordNotFound(_)
        )
    }
}

/// Soft, per-document failure while extracting text from a source file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
