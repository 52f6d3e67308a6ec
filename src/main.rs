//! # Gazette Harness CLI (`gzt`)
//!
//! The `gzt` binary is the primary interface for Gazette Harness. It provides
//! commands for summarizing indexed gazettes, browsing what is available,
//! writing daily digests, and asking questions.
//!
//! ## Usage
//!
//! ```bash
//! gzt --config ./config/gazette.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gzt ingest` | Extract and summarize every raw document in the index |
//! | `gzt register <id>` | Add a new raw document to the index |
//! | `gzt dates` | List dates with usable summaries |
//! | `gzt news-dates` | List dates with headlines |
//! | `gzt jurisdictions` | List jurisdictions with usable summaries |
//! | `gzt documents` | List usable documents for a date and jurisdiction |
//! | `gzt get <id>` | Show one index record and its summary |
//! | `gzt stats` | Record counts by status and jurisdiction |
//! | `gzt digest` | Regulatory digest for a date |
//! | `gzt news-digest` | News digest for a date |
//! | `gzt ask "<question>"` | Answer a question from news or gazettes |
//! | `gzt classify "<question>"` | Show how a question would be routed |
//!
//! ## Examples
//!
//! ```bash
//! # Summarize pending documents, at most 20 per run
//! gzt ingest --limit 20
//!
//! # Daily digest for one jurisdiction
//! gzt digest --date 2026-01-30 --jurisdiction veracruz
//!
//! # Ask about the latest day with headlines
//! gzt ask "¿Qué pasó con los impuestos?"
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).
//! Command output goes to stdout.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use gazette_harness::config;
use gazette_harness::digest::{NewsDigest, RegulatoryDigest};
use gazette_harness::get;
use gazette_harness::harness::Harness;
use gazette_harness::index::NewDocument;
use gazette_harness::ingest::{self, IngestOptions};
use gazette_harness::models::{parse_query_date, EvidenceSource};
use gazette_harness::stats;

/// Gazette Harness CLI: ingestion and retrieval for official gazettes and
/// daily news.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/gazette.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "gzt",
    about = "Gazette Harness: ingestion and retrieval for official gazettes and daily news",
    version,
    long_about = "Gazette Harness keeps a CSV index of official gazette PDFs, summarizes each \
    one with a language model, and assembles bounded context from those summaries or from a \
    headline feed to write daily digests and answer questions."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/gazette.toml`. Index, news, storage, limits,
    /// routing, and model settings are read from this file.
    #[arg(long, global = true, default_value = "./config/gazette.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Extract and summarize raw documents.
    ///
    /// Every record that is not yet `summary_ready` is extracted, summarized,
    /// and marked processed. Failures leave the record raw and the run goes
    /// on. Running it twice in a row does nothing the second time.
    Ingest {
        /// Count pending records without extracting or writing.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of records to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Add a new raw document to the index.
    Register {
        /// Document id, normally the PDF file name.
        id: String,

        /// Publication date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Jurisdiction code (e.g. `DOF`, `VERACRUZ`).
        #[arg(long)]
        jurisdiction: String,

        /// Directory holding the PDF.
        #[arg(long)]
        source_path: String,
    },

    /// List dates with usable summaries, most recent first.
    Dates {
        /// Only dates for this jurisdiction.
        #[arg(long)]
        jurisdiction: Option<String>,
    },

    /// List dates with news headlines, most recent first.
    NewsDates,

    /// List jurisdictions with usable summaries.
    Jurisdictions {
        /// Only jurisdictions with documents on this date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// List usable documents for a date and jurisdiction.
    Documents {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        #[arg(long)]
        jurisdiction: String,
    },

    /// Show one index record by id, whatever its status.
    Get {
        /// Document id.
        id: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Record counts by status and jurisdiction.
    Stats,

    /// Write the regulatory digest for a date.
    ///
    /// Calls the language model once per jurisdiction with summaries on that
    /// date, in the preferred jurisdiction order.
    Digest {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Only this jurisdiction.
        #[arg(long)]
        jurisdiction: Option<String>,
    },

    /// Write the news digest for a date, grouped by topic.
    NewsDigest {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Answer a question from the news feed or the gazette summaries.
    ///
    /// The question is routed by keyword. Without `--date` the most recent
    /// date with data for the routed scope is used.
    Ask {
        question: String,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show how a question would be routed, without answering it.
    Classify {
        question: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_query_date(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load_config(&cli.config)?;
    let harness = Harness::new(cfg);

    match cli.command {
        Commands::Ingest { dry_run, limit } => {
            if !dry_run && !harness.config().llm.is_enabled() {
                warn!("llm provider is disabled; every document will stay raw");
            }
            let options = IngestOptions { dry_run, limit };
            let report = harness.ingest(options)?;
            ingest::print_report(&report, options);
        }
        Commands::Register {
            id,
            date,
            jurisdiction,
            source_path,
        } => {
            let record = harness.register(NewDocument {
                id,
                date,
                jurisdiction,
                source_path,
            })?;
            println!("registered {} ({}, {})", record.id, record.jurisdiction, record.raw_date);
        }
        Commands::Dates { jurisdiction } => {
            let index = harness.index()?;
            for date in index.list_available_dates(jurisdiction.as_deref()) {
                println!("{}", date);
            }
        }
        Commands::NewsDates => {
            let feed = harness.news()?;
            for date in feed.available_dates() {
                println!("{}", date);
            }
        }
        Commands::Jurisdictions { date } => {
            let index = harness.index()?;
            for jurisdiction in index.list_jurisdictions(date) {
                println!("{}", jurisdiction);
            }
        }
        Commands::Documents { date, jurisdiction } => {
            let index = harness.index()?;
            let docs = index.documents_for(date, &jurisdiction);
            if docs.is_empty() {
                println!("No documents for {} on {}.", jurisdiction.to_uppercase(), date);
            }
            for doc in docs {
                println!(
                    "{}  {}",
                    doc.id,
                    harness.config().resolve(&doc.physical_path()).display()
                );
            }
        }
        Commands::Get { id, json } => {
            if json {
                let doc = get::get_document(harness.config(), &id)?;
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                get::run_get(harness.config(), &id)?;
            }
        }
        Commands::Stats => {
            stats::run_stats(harness.config())?;
        }
        Commands::Digest { date, jurisdiction } => {
            match harness.regulatory_digest(date, jurisdiction.as_deref())? {
                RegulatoryDigest::Ready(text) => println!("{}", text),
                RegulatoryDigest::NoDocuments => println!("No official gazettes for {}.", date),
                RegulatoryDigest::NoSummaries => {
                    println!("No regulatory summaries available for {}.", date)
                }
                RegulatoryDigest::JurisdictionMissing(j) => {
                    println!("No gazettes for jurisdiction '{}' on {}.", j, date)
                }
                RegulatoryDigest::NothingGenerated => {
                    println!("No relevant regulatory content was generated for {}.", date)
                }
            }
        }
        Commands::NewsDigest { date } => match harness.news_digest(date)? {
            NewsDigest::Ready(text) => println!("{}", text),
            NewsDigest::NoNews => println!("No news for {}.", date),
        },
        Commands::Ask {
            question,
            date,
            json,
        } => {
            let answer = harness.ask(&question, date)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.answer);
                if !answer.sources.is_empty() {
                    println!();
                    println!("--- Sources ({}, {}) ---", answer.intent.scope, answer.date);
                    for source in &answer.sources {
                        print_source(source);
                    }
                }
            }
        }
        Commands::Classify { question, json } => {
            let intent = harness.classify(&question);
            if json {
                println!("{}", serde_json::to_string_pretty(&intent)?);
            } else {
                println!("scope:        {}", intent.scope);
                println!(
                    "jurisdiction: {}",
                    intent.jurisdiction.as_deref().unwrap_or("-")
                );
                println!("topic:        {}", intent.topic.as_deref().unwrap_or("-"));
            }
        }
    }

    Ok(())
}

fn print_source(source: &EvidenceSource) {
    match source {
        EvidenceSource::News {
            topic,
            headline,
            outlet,
            link,
            ..
        } => println!("[{}] {} ({}) {}", topic, headline, outlet, link),
        EvidenceSource::Document {
            date,
            jurisdiction,
            id,
            ..
        } => println!("{} {} {}", jurisdiction, date, id),
    }
}
