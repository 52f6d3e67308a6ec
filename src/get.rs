//! Document retrieval by id.
//!
//! Fetches one index record, whatever its status, together with its summary
//! text when one is on disk. Used by the `gzt get` command.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::index::DocumentIndex;
use crate::models::DocumentRecord;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub record: DocumentRecord,
    /// Where the source PDF should be, resolved against the index directory.
    pub pdf_location: String,
    pub pdf_exists: bool,
    pub summary: Option<String>,
}

/// Look up `id` and read its summary if the record has one.
pub fn get_document(config: &Config, id: &str) -> Result<DocumentResponse> {
    let index = DocumentIndex::load(&config.index.path)
        .with_context(|| format!("Failed to load index: {}", config.index.path.display()))?;
    let record = index.find_by_id(id)?.clone();

    let pdf = config.resolve(&record.physical_path());
    let summary = record
        .summary_path
        .as_deref()
        .map(|p| config.resolve(Path::new(p)))
        .and_then(|p| std::fs::read_to_string(p).ok());

    Ok(DocumentResponse {
        pdf_location: pdf.display().to_string(),
        pdf_exists: pdf.exists(),
        summary,
        record,
    })
}

/// CLI entry point: calls get_document and prints to stdout.
pub fn run_get(config: &Config, id: &str) -> Result<()> {
    let doc = match get_document(config, id) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    let r = &doc.record;

    println!("--- Document ---");
    println!("id:           {}", r.id);
    println!(
        "date:         {}",
        r.date.map(|d| d.to_string()).unwrap_or_else(|| r.raw_date.clone())
    );
    println!("jurisdiction: {}", r.jurisdiction);
    println!("status:       {}", r.status);
    println!(
        "pdf:          {}{}",
        doc.pdf_location,
        if doc.pdf_exists { "" } else { " (missing)" }
    );
    println!("text_path:    {}", r.text_path.as_deref().unwrap_or("-"));
    println!("summary_path: {}", r.summary_path.as_deref().unwrap_or("-"));
    if !r.created_at.is_empty() {
        println!("created_at:   {}", r.created_at);
    }
    println!();

    if let Some(summary) = &doc.summary {
        println!("--- Summary ---");
        println!("{}", summary.trim());
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::models::RecordStatus;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("pdfs")).unwrap();
        fs::write(tmp.path().join("pdfs/a.pdf"), b"%PDF").unwrap();
        fs::write(tmp.path().join("a_summary.txt"), "- Decreto.\n").unwrap();
        fs::write(
            tmp.path().join("do_index.csv"),
            "id,date,jurisdiction,source_path,text_path,summary_path,status\n\
             a.pdf,2026-01-30,DOF,pdfs,,a_summary.txt,summary_ready\n\
             b.pdf,2026-01-30,DOF,pdfs,,,raw\n",
        )
        .unwrap();
        let mut config = Config::default();
        config.index.path = tmp.path().join("do_index.csv");
        (tmp, config)
    }

    #[test]
    fn returns_record_and_summary() {
        let (_tmp, config) = setup();
        let doc = get_document(&config, "a.pdf").unwrap();
        assert_eq!(doc.record.status, RecordStatus::SummaryReady);
        assert!(doc.pdf_exists);
        assert_eq!(doc.summary.as_deref(), Some("- Decreto.\n"));
    }

    #[test]
    fn raw_records_are_still_found() {
        let (_tmp, config) = setup();
        let doc = get_document(&config, "b.pdf").unwrap();
        assert_eq!(doc.record.status, RecordStatus::Raw);
        assert!(!doc.pdf_exists);
        assert_eq!(doc.summary, None);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (_tmp, config) = setup();
        let err = get_document(&config, "zzz.pdf").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IndexError>(),
            Some(IndexError::RecordNotFound(_))
        ));
    }
}
