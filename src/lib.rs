//! # Gazette Harness
//!
//! A local-first ingestion and retrieval toolkit for official gazettes and
//! daily news headlines.
//!
//! Gazette Harness keeps a CSV index of downloaded gazette PDFs, turns each
//! one into extracted text plus a model-written summary, and assembles
//! bounded context from those summaries (or from a headline feed) to answer
//! questions and write daily digests.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────┐
//! │ do_index.csv│──▶│  Ingestion   │──▶│ text + summary │
//! │  (raw rows) │   │ extract+sum. │   │  files per JUR │
//! └─────────────┘   └──────────────┘   └───────┬────────┘
//!                                              │
//! ┌─────────────┐   ┌──────────────┐   ┌───────▼────────┐
//! │ noticias.csv│──▶│   Context    │◀──│ usable records │
//! └─────────────┘   │  Assembler   │   └────────────────┘
//!                   └──────┬───────┘
//!                          ▼
//!              ┌───────────────────────┐
//!              │ digest / ask (+ router)│
//!              └───────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gzt ingest                        # summarize every raw document
//! gzt dates                         # days with usable summaries
//! gzt digest --date 2026-01-30      # regulatory digest for a day
//! gzt ask "¿Qué publicó la gaceta de Veracruz?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed index and extraction errors |
//! | [`index`] | CSV document index |
//! | [`news`] | CSV news headline feed |
//! | [`context`] | Context assembly and ordering |
//! | [`intent`] | Keyword question routing |
//! | [`extract`] | PDF text extraction |
//! | [`llm`] | Language-model collaborators |
//! | [`ingest`] | Ingestion pipeline |
//! | [`digest`] | Daily regulatory and news digests |
//! | [`answer`] | Question answering |
//! | [`harness`] | Component wiring from config |
//! | [`stats`] | Index statistics |
//! | [`get`] | Document lookup |

pub mod answer;
pub mod config;
pub mod context;
pub mod digest;
pub mod error;
pub mod extract;
pub mod get;
pub mod harness;
pub mod index;
pub mod ingest;
pub mod intent;
pub mod llm;
pub mod models;
pub mod news;
pub mod stats;
