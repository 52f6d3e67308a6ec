//! Integration tests for the collaborator traits.
//!
//! These tests prove that custom extractors and chat models (implemented via
//! the `TextExtractor` and `ChatModel` traits) work end-to-end through the
//! ingestion pipeline, the digests, and question answering.

use anyhow::Result;
use chrono::NaiveDate;
use gazette_harness::answer::QuestionAnswerer;
use gazette_harness::config::Config;
use gazette_harness::context::ContextAssembler;
use gazette_harness::digest::{regulatory_digest, RegulatoryDigest};
use gazette_harness::error::ExtractError;
use gazette_harness::extract::TextExtractor;
use gazette_harness::index::DocumentIndex;
use gazette_harness::ingest::{run_ingest, IngestOptions};
use gazette_harness::llm::{ChatModel, DisabledModel, PromptedModel};
use gazette_harness::models::{RecordStatus, Scope};
use gazette_harness::news::NewsFeed;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ─── Test Extractor ─────────────────────────────────────────────────

/// Reads source files as plain text; any file named `broken*` fails.
struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.starts_with("broken") {
            return Err(ExtractError::Pdf("xref table not found".to_string()));
        }
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }
        Ok(fs::read_to_string(path)?)
    }
}

// ─── Test Model ─────────────────────────────────────────────────────

/// Always replies with the same bullet and counts calls.
struct FixedReplyModel {
    calls: Arc<AtomicUsize>,
}

impl ChatModel for FixedReplyModel {
    fn model_name(&self) -> &str {
        "fixed"
    }

    fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("- Se publica un decreto.".to_string())
    }
}

fn fixed_model() -> (PromptedModel, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let model = PromptedModel::new(Box::new(FixedReplyModel {
        calls: calls.clone(),
    }));
    (model, calls)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 30).unwrap()
}

/// Three raw records on 2026-01-30: DOF, a broken one, VERACRUZ.
fn setup() -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    let pdfs = tmp.path().join("pdfs");
    fs::create_dir_all(&pdfs).unwrap();
    fs::write(pdfs.join("dof_0130.pdf"), "DECRETO por el que se modifica la tarifa").unwrap();
    fs::write(pdfs.join("broken_0130.pdf"), "???").unwrap();
    fs::write(pdfs.join("ver_0130.pdf"), "ACUERDO del Congreso del Estado").unwrap();

    fs::write(
        tmp.path().join("do_index.csv"),
        "id,date,jurisdiction,source_path,text_path,summary_path,status,created_at\n\
         dof_0130.pdf,2026-01-30,DOF,pdfs,,,raw,\n\
         broken_0130.pdf,2026-01-30,CDMX,pdfs,,,raw,\n\
         ver_0130.pdf,2026-01-30,VERACRUZ,pdfs,,,raw,\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("noticias.csv"),
        "date,headline,topic,link,outlet\n\
         2026-01-30,Sube el gas LP,gas,https://example.com/gas,El Diario\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.index.path = tmp.path().join("do_index.csv");
    config.news.path = tmp.path().join("noticias.csv");
    (tmp, config)
}

#[test]
fn test_pipeline_then_digest_then_ask() {
    let (tmp, config) = setup();
    let (model, calls) = fixed_model();

    let report = run_ingest(&config, &PlainTextExtractor, &model, IngestOptions::default()).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.extract_failed, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let summary = fs::read_to_string(tmp.path().join("do_resumenes/DOF/dof_0130_resumen.txt")).unwrap();
    assert_eq!(summary, "- Se publica un decreto.");

    let index = DocumentIndex::load(&config.index.path).unwrap();
    assert_eq!(
        index.find_by_id("broken_0130.pdf").unwrap().status,
        RecordStatus::Raw
    );
    assert_eq!(index.list_available_dates(None), vec![date()]);
    assert_eq!(index.list_jurisdictions(Some(date())), vec!["DOF", "VERACRUZ"]);

    let assembler = ContextAssembler::from_config(&config);
    let digest = regulatory_digest(&index, &assembler, &model, date(), None).unwrap();
    assert_eq!(
        digest,
        RegulatoryDigest::Ready(
            "DOF\n- Se publica un decreto.\n\nVERACRUZ\n- Se publica un decreto.".to_string()
        )
    );

    let news = NewsFeed::load(&config.news.path).unwrap();
    let qa = QuestionAnswerer::new(&config, &model);
    let answer = qa
        .ask(&index, &news, "¿Qué publicó la gaceta de Veracruz?", None)
        .unwrap();
    assert!(answer.answered);
    assert_eq!(answer.intent.scope, Scope::Regulatory);
    assert_eq!(answer.date, date());
    assert_eq!(answer.sources.len(), 1);
}

#[test]
fn test_second_run_calls_nothing() {
    let (_tmp, config) = setup();
    let (model, calls) = fixed_model();

    run_ingest(&config, &PlainTextExtractor, &model, IngestOptions::default()).unwrap();
    let after_first = calls.load(Ordering::SeqCst);

    let report = run_ingest(&config, &PlainTextExtractor, &model, IngestOptions::default()).unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.already_done, 2);
    // the broken record is retried, but never reaches the model
    assert_eq!(report.extract_failed, 1);
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
}

#[test]
fn test_disabled_model_leaves_everything_raw() {
    let (tmp, config) = setup();
    let model = PromptedModel::new(Box::new(DisabledModel));

    let report = run_ingest(&config, &PlainTextExtractor, &model, IngestOptions::default()).unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(report.extract_failed, 1);

    let index = DocumentIndex::load(&config.index.path).unwrap();
    assert!(index.records().iter().all(|r| r.status == RecordStatus::Raw));
    assert!(index.list_available_dates(None).is_empty());
    assert!(!tmp.path().join("do_resumenes").exists());
}

#[test]
fn test_empty_scope_is_an_outcome_not_an_error() {
    let (_tmp, config) = setup();
    let (model, calls) = fixed_model();

    // nothing has been summarized yet
    let index = DocumentIndex::load(&config.index.path).unwrap();
    let assembler = ContextAssembler::from_config(&config);
    let digest = regulatory_digest(&index, &assembler, &model, date(), None).unwrap();
    assert_eq!(digest, RegulatoryDigest::NoDocuments);

    let news = NewsFeed::load(&config.news.path).unwrap();
    let qa = QuestionAnswerer::new(&config, &model);
    let answer = qa
        .ask(&index, &news, "¿Hay noticias de casinos?", Some(date()))
        .unwrap();
    assert!(!answer.answered);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
