//! Ingestion pipeline.
//!
//! Walks the index and brings every `raw` record to `summary_ready`:
//!
//! ```text
//! source PDF ─extract─▶ {text_dir}/{JUR}/{stem}.txt
//!            ─summarize─▶ {summary_dir}/{JUR}/{stem}_resumen.txt
//!            ─mark_processed─▶ index row
//! ```
//!
//! A failure on one record is logged and leaves that record `raw`; the run
//! moves on to the next one. The index is written once, after the loop, so a
//! partial run never leaves a half-written index behind. Records that are
//! already `summary_ready` are never extracted or summarized again, which
//! makes re-running the pipeline a no-op.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::context::truncate_chars;
use crate::error::ExtractError;
use crate::extract::TextExtractor;
use crate::index::DocumentIndex;
use crate::llm::{SummaryRequest, Summarizer};
use crate::models::DocumentRecord;

/// Directory name used when a record has no jurisdiction.
const UNKNOWN_JURISDICTION: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Count pending records without extracting, summarizing, or saving.
    pub dry_run: bool,
    /// Process at most this many pending records.
    pub limit: Option<usize>,
}

/// Outcome counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records that were not yet processed when the run started.
    pub pending: usize,
    /// Records skipped because they were already `summary_ready`.
    pub already_done: usize,
    /// Later rows repeating an id seen earlier in the index. Never processed.
    pub duplicates: usize,
    pub processed: usize,
    /// Extraction errors or empty extracted text.
    pub extract_failed: usize,
    /// Write or summarization errors.
    pub failed: usize,
}

/// Why one record could not be processed. Never escapes the pipeline.
#[derive(Debug, Error)]
enum RecordFailure {
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("extracted text is empty")]
    EmptyText,
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("summarization failed: {0:#}")]
    Summarize(anyhow::Error),
    #[error("summary is empty")]
    EmptySummary,
}

impl RecordFailure {
    fn is_extraction(&self) -> bool {
        matches!(self, RecordFailure::Extract(_) | RecordFailure::EmptyText)
    }
}

/// Paths recorded in the index for a processed document.
struct Derived {
    text_path: String,
    summary_path: String,
}

pub struct IngestionPipeline<'a> {
    extractor: &'a dyn TextExtractor,
    summarizer: &'a dyn Summarizer,
    base_dir: PathBuf,
    text_dir: PathBuf,
    summary_dir: PathBuf,
    max_summary_input_chars: usize,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(
        config: &Config,
        extractor: &'a dyn TextExtractor,
        summarizer: &'a dyn Summarizer,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            base_dir: config.base_dir(),
            text_dir: config.storage.text_dir.clone(),
            summary_dir: config.storage.summary_dir.clone(),
            max_summary_input_chars: config.limits.max_summary_input_chars,
        }
    }

    /// Process every pending record of `index` in place. The caller decides
    /// whether to save.
    pub fn run(&self, index: &mut DocumentIndex, options: IngestOptions) -> IngestReport {
        let mut report = IngestReport::default();

        let mut pending: Vec<DocumentRecord> = Vec::new();
        let mut seen = BTreeSet::new();
        for record in index.records() {
            if !seen.insert(record.id.as_str()) {
                warn!(id = %record.id, "duplicate id in index; only the first row is processed");
                report.duplicates += 1;
            } else if record.is_processed() {
                report.already_done += 1;
            } else {
                pending.push(record.clone());
            }
        }
        report.pending = pending.len();

        if let Some(limit) = options.limit {
            pending.truncate(limit);
        }
        if options.dry_run {
            return report;
        }

        for record in &pending {
            match self.process(record) {
                Ok(derived) => {
                    match index.mark_processed(&record.id, &derived.text_path, &derived.summary_path) {
                        Ok(true) => {
                            info!(id = %record.id, jurisdiction = %record.jurisdiction, "summary ready");
                            report.processed += 1;
                        }
                        Ok(false) => debug!(id = %record.id, "record not transitioned"),
                        Err(e) => {
                            warn!(id = %record.id, error = %e, "failed to update index; leaving raw");
                            report.failed += 1;
                        }
                    }
                }
                Err(failure) => {
                    warn!(id = %record.id, error = %failure, "skipping document; leaving raw");
                    if failure.is_extraction() {
                        report.extract_failed += 1;
                    } else {
                        report.failed += 1;
                    }
                }
            }
        }

        report
    }

    fn process(&self, record: &DocumentRecord) -> Result<Derived, RecordFailure> {
        let source = self.resolve(&record.physical_path());
        let text = self.extractor.extract(&source)?;
        if text.trim().is_empty() {
            return Err(RecordFailure::EmptyText);
        }

        let jurisdiction = if record.jurisdiction.trim().is_empty() {
            UNKNOWN_JURISDICTION
        } else {
            record.jurisdiction.as_str()
        };
        let stem = record.file_stem();

        let text_path = self.text_dir.join(jurisdiction).join(format!("{}.txt", stem));
        self.write(&text_path, &text)?;

        let summary = self
            .summarizer
            .summarize(&SummaryRequest {
                text: truncate_chars(&text, self.max_summary_input_chars),
                jurisdiction,
                date: &record.raw_date,
                id: &record.id,
            })
            .map_err(RecordFailure::Summarize)?;
        if summary.trim().is_empty() {
            return Err(RecordFailure::EmptySummary);
        }

        let summary_path = self
            .summary_dir
            .join(jurisdiction)
            .join(format!("{}_resumen.txt", stem));
        self.write(&summary_path, &summary)?;

        Ok(Derived {
            text_path: text_path.to_string_lossy().to_string(),
            summary_path: summary_path.to_string_lossy().to_string(),
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), RecordFailure> {
        let target = self.resolve(path);
        let result = match target.parent() {
            Some(parent) => fs::create_dir_all(parent).and_then(|_| fs::write(&target, content)),
            None => fs::write(&target, content),
        };
        result.map_err(|source| RecordFailure::Write {
            path: target.display().to_string(),
            source,
        })
    }
}

/// Load the index named in `config`, run the pipeline, and save once.
///
/// A missing or malformed index is an error; per-record failures are not.
pub fn run_ingest(
    config: &Config,
    extractor: &dyn TextExtractor,
    summarizer: &dyn Summarizer,
    options: IngestOptions,
) -> Result<IngestReport> {
    let mut index = DocumentIndex::load(&config.index.path)?;
    let pipeline = IngestionPipeline::new(config, extractor, summarizer);
    let report = pipeline.run(&mut index, options);

    if !options.dry_run {
        index.save()?;
    }
    Ok(report)
}

pub fn print_report(report: &IngestReport, options: IngestOptions) {
    if options.dry_run {
        println!("ingest (dry-run)");
        println!("  pending: {}", report.pending);
        println!("  already summarized: {}", report.already_done);
        if let Some(limit) = options.limit {
            println!("  would process: {}", report.pending.min(limit));
        }
        return;
    }

    println!("ingest");
    println!("  pending: {}", report.pending);
    println!("  processed: {}", report.processed);
    println!("  extraction failures: {}", report.extract_failed);
    println!("  other failures: {}", report.failed);
    println!("  already summarized: {}", report.already_done);
    if report.duplicates > 0 {
        println!("  duplicate ids skipped: {}", report.duplicates);
    }
    println!("ok");
}
