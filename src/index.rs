//! CSV-backed document index.
//!
//! The index is a flat file with one row per gazette document:
//!
//! ```text
//! id,date,jurisdiction,source_path,text_path,summary_path,status,created_at
//! ```
//!
//! [`DocumentIndex::load`] reads the whole file into memory once, parsing the
//! date column a single time. Read-side queries only ever return *usable*
//! records (see [`DocumentRecord::is_usable`]). Writes happen through
//! [`DocumentIndex::save`], which replaces the file atomically so a crash
//! mid-write leaves the previous version intact.
//!
//! Files written by the older tooling used Spanish headers (`fecha`,
//! `jurisdiccion`, `pdf_path`); those are accepted on read and rewritten with
//! the current names on save.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::models::{normalize_jurisdiction, parse_stored_date, DocumentRecord, RecordStatus};

/// Column name and the legacy names accepted in its place.
pub(crate) type ColumnSpec = (&'static str, &'static [&'static str]);

const REQUIRED_COLUMNS: &[ColumnSpec] = &[
    ("id", &[]),
    ("date", &["fecha"]),
    ("jurisdiction", &["jurisdiccion"]),
    ("source_path", &["pdf_path"]),
    ("text_path", &[]),
    ("summary_path", &[]),
];

const HEADER: [&str; 8] = [
    "id",
    "date",
    "jurisdiction",
    "source_path",
    "text_path",
    "summary_path",
    "status",
    "created_at",
];

#[derive(Debug, Deserialize)]
struct IndexRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "fecha")]
    date: Option<String>,
    #[serde(default, alias = "jurisdiccion")]
    jurisdiction: Option<String>,
    #[serde(default, alias = "pdf_path")]
    source_path: Option<String>,
    #[serde(default)]
    text_path: Option<String>,
    #[serde(default)]
    summary_path: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl IndexRow {
    fn into_record(self) -> Option<DocumentRecord> {
        let id = non_empty(self.id)?;
        let raw_date = self.date.unwrap_or_default();
        Some(DocumentRecord {
            id,
            date: parse_stored_date(&raw_date),
            raw_date,
            jurisdiction: normalize_jurisdiction(&self.jurisdiction.unwrap_or_default()),
            source_path: self.source_path.unwrap_or_default().trim().to_string(),
            text_path: non_empty(self.text_path),
            summary_path: non_empty(self.summary_path),
            status: RecordStatus::parse(self.status.as_deref().unwrap_or("")),
            created_at: self.created_at.unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Fail with [`IndexError::Schema`] unless every required column (or one of
/// its legacy names) is present in `headers`.
pub(crate) fn check_schema(
    path: &Path,
    headers: &StringRecord,
    required: &[ColumnSpec],
) -> Result<(), IndexError> {
    let present: BTreeSet<&str> = headers.iter().map(str::trim).collect();
    for (column, aliases) in required {
        let found = present.contains(column) || aliases.iter().any(|a| present.contains(a));
        if !found {
            return Err(IndexError::Schema {
                path: path.display().to_string(),
                column,
                found: headers.iter().collect::<Vec<_>>().join(", "),
            });
        }
    }
    Ok(())
}

/// Metadata for a document being registered for the first time.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: String,
    pub date: NaiveDate,
    pub jurisdiction: String,
    pub source_path: String,
}

/// Per-jurisdiction record counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub raw: usize,
    pub summary_ready: usize,
    pub legacy: usize,
    pub usable: usize,
}

/// In-memory snapshot of the index file.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    path: PathBuf,
    records: Vec<DocumentRecord>,
}

impl DocumentIndex {
    /// Read the index file.
    ///
    /// # Errors
    ///
    /// - [`IndexError::StoreNotFound`] if `path` does not exist.
    /// - [`IndexError::Schema`] if a required column is missing.
    /// - [`IndexError::Csv`] if the file cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(IndexError::StoreNotFound(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        check_schema(path, &headers, REQUIRED_COLUMNS)?;

        let mut records = Vec::new();
        let mut seen = BTreeSet::new();
        for row in reader.deserialize::<IndexRow>() {
            let Some(record) = row?.into_record() else {
                warn!(path = %path.display(), "skipping index row without id");
                continue;
            };
            if !seen.insert(record.id.clone()) {
                warn!(id = %record.id, "duplicate id in index; queries use the first row");
            }
            records.push(record);
        }

        debug!(path = %path.display(), records = records.len(), "index loaded");
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Load the index, or start an empty one if the file does not exist yet.
    pub fn open_or_create(path: &Path) -> Result<Self, IndexError> {
        match Self::load(path) {
            Err(IndexError::StoreNotFound(_)) => Ok(Self {
                path: path.to_path_buf(),
                records: Vec::new(),
            }),
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record, in file order, regardless of status.
    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    /// Records that are safe to read as evidence.
    pub fn usable(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.iter().filter(|r| r.is_usable())
    }

    /// Usable records published on `date`, in file order.
    pub fn load_for_date(&self, date: NaiveDate) -> Vec<&DocumentRecord> {
        self.usable().filter(|r| r.date == Some(date)).collect()
    }

    /// Usable records for one day and jurisdiction.
    pub fn documents_for(&self, date: NaiveDate, jurisdiction: &str) -> Vec<&DocumentRecord> {
        let jurisdiction = normalize_jurisdiction(jurisdiction);
        self.usable()
            .filter(|r| r.date == Some(date) && r.jurisdiction == jurisdiction)
            .collect()
    }

    /// Distinct dates with usable records, most recent first.
    pub fn list_available_dates(&self, jurisdiction: Option<&str>) -> Vec<NaiveDate> {
        let jurisdiction = jurisdiction.map(normalize_jurisdiction);
        let dates: BTreeSet<NaiveDate> = self
            .usable()
            .filter(|r| jurisdiction.as_ref().map_or(true, |j| &r.jurisdiction == j))
            .filter_map(|r| r.date)
            .collect();
        dates.into_iter().rev().collect()
    }

    /// Most recent date with usable records.
    pub fn latest_date(&self, jurisdiction: Option<&str>) -> Option<NaiveDate> {
        self.list_available_dates(jurisdiction).into_iter().next()
    }

    /// Sorted, de-duplicated jurisdictions among usable records.
    pub fn list_jurisdictions(&self, date: Option<NaiveDate>) -> Vec<String> {
        let set: BTreeSet<String> = self
            .usable()
            .filter(|r| date.is_none() || r.date == date)
            .filter(|r| !r.jurisdiction.is_empty())
            .map(|r| r.jurisdiction.clone())
            .collect();
        set.into_iter().collect()
    }

    /// Look up a record by id, whatever its status.
    pub fn find_by_id(&self, id: &str) -> Result<&DocumentRecord, IndexError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| IndexError::RecordNotFound(id.to_string()))
    }

    /// Move a record from `raw` to `summary_ready`.
    ///
    /// Returns `Ok(false)` without touching the record if it is already
    /// processed or if `summary_path` is empty.
    pub fn mark_processed(
        &mut self,
        id: &str,
        text_path: &str,
        summary_path: &str,
    ) -> Result<bool, IndexError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| IndexError::RecordNotFound(id.to_string()))?;

        if record.is_processed() {
            debug!(id, "already summary_ready; not transitioning again");
            return Ok(false);
        }
        if summary_path.trim().is_empty() {
            warn!(id, "refusing to mark processed without a summary path");
            return Ok(false);
        }

        record.text_path = Some(text_path.to_string());
        record.summary_path = Some(summary_path.to_string());
        record.status = RecordStatus::SummaryReady;
        Ok(true)
    }

    /// Append a new `raw` record. `created_at` is stamped here and never
    /// changed afterwards.
    pub fn register(&mut self, doc: NewDocument) -> Result<&DocumentRecord, IndexError> {
        if self.records.iter().any(|r| r.id == doc.id) {
            return Err(IndexError::DuplicateId(doc.id));
        }
        let raw_date = doc.date.format("%Y-%m-%d").to_string();
        self.records.push(DocumentRecord {
            id: doc.id,
            date: Some(doc.date),
            raw_date,
            jurisdiction: normalize_jurisdiction(&doc.jurisdiction),
            source_path: doc.source_path,
            text_path: None,
            summary_path: None,
            status: RecordStatus::Raw,
            created_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Record counts per jurisdiction.
    pub fn status_counts(&self) -> BTreeMap<String, StatusCounts> {
        let mut counts: BTreeMap<String, StatusCounts> = BTreeMap::new();
        for record in &self.records {
            let entry = counts.entry(record.jurisdiction.clone()).or_default();
            match record.status {
                RecordStatus::Raw => entry.raw += 1,
                RecordStatus::SummaryReady => entry.summary_ready += 1,
                RecordStatus::Unset => entry.legacy += 1,
            }
            if record.is_usable() {
                entry.usable += 1;
            }
        }
        counts
    }

    /// Write every record back to the index file.
    ///
    /// The rows go to a temporary sibling first and are then renamed over
    /// the original.
    pub fn save(&self) -> Result<(), IndexError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            writer.write_record(HEADER)?;
            for r in &self.records {
                writer.write_record([
                    r.id.as_str(),
                    r.raw_date.as_str(),
                    r.jurisdiction.as_str(),
                    r.source_path.as_str(),
                    r.text_path.as_deref().unwrap_or(""),
                    r.summary_path.as_deref().unwrap_or(""),
                    r.status.as_str(),
                    r.created_at.as_str(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), records = self.records.len(), "index saved");
        Ok(())
    }
}
