//! Component wiring.
//!
//! [`Harness`] owns the loaded [`Config`] and builds every other component
//! from it on demand. Nothing here is global: the model client, the index,
//! and the news feed are all created per call and passed explicitly.
//!
//! The model client is only constructed when a prompt is actually sent, so
//! read-only commands, dry runs, and empty scopes work without
//! `OPENAI_API_KEY`. A real ingest run builds it up front so a missing key
//! fails the run instead of every record.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::answer::{Answer, QuestionAnswerer};
use crate::config::Config;
use crate::context::ContextAssembler;
use crate::digest::{self, NewsDigest, RegulatoryDigest};
use crate::extract::PdfExtractor;
use crate::index::{DocumentIndex, NewDocument};
use crate::ingest::{self, IngestOptions, IngestReport};
use crate::intent::IntentRouter;
use crate::llm::{create_model, LazyModel, PromptedModel};
use crate::models::{DocumentRecord, Intent, Scope};
use crate::news::NewsFeed;

pub struct Harness {
    config: Config,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> Result<DocumentIndex> {
        let path = &self.config.index.path;
        DocumentIndex::load(path)
            .with_context(|| format!("Failed to load index: {}", path.display()))
    }

    pub fn news(&self) -> Result<NewsFeed> {
        let path = &self.config.news.path;
        NewsFeed::load(path)
            .with_context(|| format!("Failed to load news feed: {}", path.display()))
    }

    pub fn assembler(&self) -> ContextAssembler {
        ContextAssembler::from_config(&self.config)
    }

    pub fn router(&self) -> IntentRouter {
        IntentRouter::from_config(&self.config)
    }

    pub fn model(&self) -> PromptedModel {
        PromptedModel::new(Box::new(LazyModel::new(self.config.llm.clone())))
    }

    pub fn ingest(&self, options: IngestOptions) -> Result<IngestReport> {
        let model = if options.dry_run {
            self.model()
        } else {
            PromptedModel::new(create_model(&self.config.llm)?)
        };
        ingest::run_ingest(&self.config, &PdfExtractor, &model, options)
    }

    /// Add a `raw` record and save the index. Creates the index file if it
    /// does not exist yet.
    pub fn register(&self, doc: NewDocument) -> Result<DocumentRecord> {
        let mut index = DocumentIndex::open_or_create(&self.config.index.path)?;
        let record = index.register(doc)?.clone();
        index.save()?;
        Ok(record)
    }

    pub fn classify(&self, question: &str) -> Intent {
        self.router().classify(question)
    }

    pub fn regulatory_digest(
        &self,
        date: NaiveDate,
        jurisdiction: Option<&str>,
    ) -> Result<RegulatoryDigest> {
        let index = self.index()?;
        let model = self.model();
        digest::regulatory_digest(&index, &self.assembler(), &model, date, jurisdiction)
    }

    pub fn news_digest(&self, date: NaiveDate) -> Result<NewsDigest> {
        let feed = self.news()?;
        let model = self.model();
        digest::news_digest(&feed, &self.assembler(), &model, date)
    }

    /// Classify `question` and answer it from the store its scope points at.
    /// Only that store is loaded.
    pub fn ask(&self, question: &str, date: Option<NaiveDate>) -> Result<Answer> {
        let model = self.model();
        let qa = QuestionAnswerer::new(&self.config, &model);
        let intent = qa.classify(question)?;
        match intent.scope {
            Scope::News => qa.answer_news(&self.news()?, question, intent, date),
            Scope::Regulatory => qa.answer_regulatory(&self.index()?, question, intent, date),
        }
    }
}
