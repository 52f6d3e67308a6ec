//! Core data models used throughout Gazette Harness.
//!
//! These types represent the indexed gazette documents, news headlines, and
//! routing decisions that flow through ingestion and retrieval.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::IndexError;

/// Processing status of a [`DocumentRecord`].
///
/// `Unset` is the legacy case of rows written before the status column was
/// populated. Such rows still count as usable when they carry a summary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Raw,
    SummaryReady,
    Unset,
}

impl RecordStatus {
    /// Parse the stored status cell. Unknown values are treated as `Raw` so
    /// the pipeline picks the row up again.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" => RecordStatus::Unset,
            "summary_ready" => RecordStatus::SummaryReady,
            _ => RecordStatus::Raw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Raw => "raw",
            RecordStatus::SummaryReady => "summary_ready",
            RecordStatus::Unset => "",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Unset => write!(f, "(unset)"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One indexed source document (one row of the index CSV).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    /// Parsed publication date; `None` when the stored value is malformed.
    pub date: Option<NaiveDate>,
    /// The date cell exactly as stored, written back unchanged on save.
    #[serde(skip)]
    pub raw_date: String,
    pub jurisdiction: String,
    /// Directory holding the original PDF.
    pub source_path: String,
    pub text_path: Option<String>,
    pub summary_path: Option<String>,
    pub status: RecordStatus,
    pub created_at: String,
}

impl DocumentRecord {
    /// A record is usable evidence iff it has a summary path and its status is
    /// `summary_ready` or the legacy empty value.
    pub fn is_usable(&self) -> bool {
        has_text(&self.summary_path)
            && matches!(
                self.status,
                RecordStatus::SummaryReady | RecordStatus::Unset
            )
    }

    /// True when the pipeline must not touch this record again.
    pub fn is_processed(&self) -> bool {
        self.status == RecordStatus::SummaryReady && has_text(&self.summary_path)
    }

    /// Physical location of the source PDF: `source_path / id`.
    pub fn physical_path(&self) -> PathBuf {
        Path::new(&self.source_path).join(&self.id)
    }

    /// The id without its file extension, used to name derived files.
    pub fn file_stem(&self) -> String {
        Path::new(&self.id)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.id.clone())
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// A news headline row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub date: Option<NaiveDate>,
    pub headline: String,
    pub topic: String,
    pub outlet: String,
    pub link: String,
}

/// Topic bucket for headlines that carry no topic.
pub const OTHER_TOPIC: &str = "other";

impl NewsItem {
    /// The topic this headline is grouped under; blank topics fall into
    /// [`OTHER_TOPIC`].
    pub fn topic_key(&self) -> &str {
        let topic = self.topic.trim();
        if topic.is_empty() {
            OTHER_TOPIC
        } else {
            topic
        }
    }
}

/// Which data source a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    News,
    Regulatory,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::News => write!(f, "news"),
            Scope::Regulatory => write!(f, "regulatory"),
        }
    }
}

/// Routing decision for a free-text question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub scope: Scope,
    pub jurisdiction: Option<String>,
    pub topic: Option<String>,
}

/// Evidence handed back alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceSource {
    News {
        date: String,
        topic: String,
        headline: String,
        outlet: String,
        link: String,
    },
    Document {
        date: String,
        jurisdiction: String,
        id: String,
        source_path: String,
    },
}

/// Uppercase, trimmed jurisdiction code.
pub fn normalize_jurisdiction(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Lowercase topic with spaces replaced by underscores.
pub fn normalize_topic(value: &str) -> String {
    value.replace(' ', "_").to_lowercase()
}

/// Lenient parse of a stored date cell. Returns `None` for anything that is
/// not a recognizable calendar date.
pub fn parse_stored_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Strict parse of a caller-supplied `YYYY-MM-DD` date.
pub fn parse_query_date(value: &str) -> Result<NaiveDate, IndexError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| IndexError::InvalidDate(value.to_string()))
}
