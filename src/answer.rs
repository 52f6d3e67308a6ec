//! Question answering over the news feed and the regulatory index.
//!
//! `ask` = classify → resolve date → assemble evidence → answer. When the
//! assembled evidence is empty the model is not called at all and the answer
//! says nothing was found.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::context::{ContextAssembler, Evidence};
use crate::index::DocumentIndex;
use crate::intent::IntentRouter;
use crate::llm::{AnswerRequest, Answerer};
use crate::models::{EvidenceSource, Intent, Scope};
use crate::news::NewsFeed;

#[derive(Debug, Error)]
pub enum AskError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("cannot determine a date to answer for: no {0} data available")]
    NoDateAvailable(Scope),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub intent: Intent,
    pub date: NaiveDate,
    pub answer: String,
    pub sources: Vec<EvidenceSource>,
    /// False when no evidence was found and the model was skipped.
    pub answered: bool,
}

pub struct QuestionAnswerer<'a> {
    router: IntentRouter,
    assembler: ContextAssembler,
    answerer: &'a dyn Answerer,
    max_news_rows: usize,
    max_documents: usize,
}

impl<'a> QuestionAnswerer<'a> {
    pub fn new(config: &Config, answerer: &'a dyn Answerer) -> Self {
        Self {
            router: IntentRouter::from_config(config),
            assembler: ContextAssembler::from_config(config),
            answerer,
            max_news_rows: config.limits.max_news_rows,
            max_documents: config.limits.max_documents,
        }
    }

    /// Validate and classify a question.
    pub fn classify(&self, question: &str) -> Result<Intent, AskError> {
        if question.trim().is_empty() {
            return Err(AskError::EmptyQuestion);
        }
        Ok(self.router.classify(question))
    }

    /// Answer `question` from whichever source its intent points at.
    pub fn ask(
        &self,
        index: &DocumentIndex,
        news: &NewsFeed,
        question: &str,
        date: Option<NaiveDate>,
    ) -> Result<Answer> {
        let intent = self.classify(question)?;
        match intent.scope {
            Scope::News => self.answer_news(news, question, intent, date),
            Scope::Regulatory => self.answer_regulatory(index, question, intent, date),
        }
    }

    pub fn answer_news(
        &self,
        news: &NewsFeed,
        question: &str,
        intent: Intent,
        date: Option<NaiveDate>,
    ) -> Result<Answer> {
        let date = date
            .or_else(|| news.latest_date())
            .ok_or(AskError::NoDateAvailable(Scope::News))?;

        let items = news.for_date(date);
        let evidence = self.assembler.news_evidence(
            items.iter().copied(),
            intent.topic.as_deref(),
            self.max_news_rows,
        );
        let fallback = format!("No relevant news found for that question on {}.", date);
        self.finish(question, intent, date, evidence, fallback)
    }

    pub fn answer_regulatory(
        &self,
        index: &DocumentIndex,
        question: &str,
        intent: Intent,
        date: Option<NaiveDate>,
    ) -> Result<Answer> {
        let date = date
            .or_else(|| index.latest_date(None))
            .ok_or(AskError::NoDateAvailable(Scope::Regulatory))?;

        let records = index.load_for_date(date);
        let evidence = self.assembler.document_evidence(
            &records,
            intent.jurisdiction.as_deref(),
            self.max_documents,
        );
        let fallback = match intent.jurisdiction.as_deref() {
            Some(j) => format!("No relevant regulatory content found for {} on {}.", j, date),
            None => format!("No relevant regulatory content found on {}.", date),
        };
        self.finish(question, intent, date, evidence, fallback)
    }

    fn finish(
        &self,
        question: &str,
        intent: Intent,
        date: NaiveDate,
        evidence: Evidence,
        fallback: String,
    ) -> Result<Answer> {
        if evidence.is_empty() {
            debug!(scope = %intent.scope, %date, "no evidence; skipping model call");
            return Ok(Answer {
                intent,
                date,
                answer: fallback,
                sources: Vec::new(),
                answered: false,
            });
        }

        let answer = self.answerer.answer(&AnswerRequest {
            question,
            context: &evidence.context,
            date,
            jurisdiction: intent.jurisdiction.as_deref(),
            scope: intent.scope,
        })?;
        info!(scope = %intent.scope, %date, sources = evidence.sources.len(), "question answered");

        Ok(Answer {
            intent,
            date,
            answer: answer.trim().to_string(),
            sources: evidence.sources,
            answered: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Records every request's context and echoes it back.
    #[derive(Default)]
    struct RecordingAnswerer {
        contexts: RefCell<Vec<String>>,
    }

    impl Answerer for RecordingAnswerer {
        fn answer(&self, request: &AnswerRequest<'_>) -> Result<String> {
            self.contexts.borrow_mut().push(request.context.to_string());
            Ok(format!("{} | {}", request.scope, request.context))
        }
    }

    struct Stores {
        _tmp: TempDir,
        config: Config,
        index: DocumentIndex,
        news: NewsFeed,
    }

    fn stores() -> Stores {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("v.txt"), "- Veracruz publica acuerdo.").unwrap();
        fs::write(tmp.path().join("d.txt"), "- DOF publica decreto.").unwrap();
        fs::write(
            tmp.path().join("do_index.csv"),
            "id,date,jurisdiction,source_path,text_path,summary_path,status\n\
             v.pdf,2026-01-29,VERACRUZ,pdfs,,v.txt,summary_ready\n\
             d.pdf,2026-01-30,DOF,pdfs,,d.txt,summary_ready\n\
             r.pdf,2026-02-02,DOF,pdfs,,,raw\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("noticias.csv"),
            "date,headline,topic,link,outlet\n\
             2026-01-30,Nuevo impuesto local,impuesto,https://a,El Diario\n\
             2026-01-30,Sube el gas,gas,https://b,La Voz\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.index.path = tmp.path().join("do_index.csv");
        config.news.path = tmp.path().join("noticias.csv");
        let index = DocumentIndex::load(&config.index.path).unwrap();
        let news = NewsFeed::load(&config.news.path).unwrap();
        Stores {
            _tmp: tmp,
            config,
            index,
            news,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn news_question_uses_latest_news_date_and_topic() {
        let s = stores();
        let answerer = RecordingAnswerer::default();
        let qa = QuestionAnswerer::new(&s.config, &answerer);

        let answer = qa
            .ask(&s.index, &s.news, "¿Qué pasó con los impuestos?", None)
            .unwrap();
        assert!(answer.answered);
        assert_eq!(answer.date, date(30));
        assert_eq!(
            answer.answer,
            "news | [impuesto] Nuevo impuesto local (outlet: El Diario)"
        );
        assert_eq!(answer.sources.len(), 1);
    }

    #[test]
    fn regulatory_question_uses_latest_usable_date() {
        let s = stores();
        let answerer = RecordingAnswerer::default();
        let qa = QuestionAnswerer::new(&s.config, &answerer);

        // the raw record on 2026-02-02 does not count
        let answer = qa
            .ask(&s.index, &s.news, "¿Qué publicó el Diario Oficial?", None)
            .unwrap();
        assert_eq!(answer.date, date(30));
        assert_eq!(answer.intent.scope, Scope::Regulatory);
        assert_eq!(*answerer.contexts.borrow(), vec!["DOF:\n- DOF publica decreto."]);
        assert!(matches!(
            answer.sources[0],
            EvidenceSource::Document { ref id, .. } if id == "d.pdf"
        ));
    }

    #[test]
    fn explicit_date_and_jurisdiction() {
        let s = stores();
        let answerer = RecordingAnswerer::default();
        let qa = QuestionAnswerer::new(&s.config, &answerer);

        let answer = qa
            .ask(&s.index, &s.news, "gaceta de Veracruz", Some(date(29)))
            .unwrap();
        assert_eq!(answer.intent.jurisdiction.as_deref(), Some("VERACRUZ"));
        assert_eq!(
            answer.answer,
            "regulatory | VERACRUZ:\n- Veracruz publica acuerdo."
        );
    }

    #[test]
    fn empty_evidence_skips_the_model() {
        let s = stores();
        let answerer = RecordingAnswerer::default();
        let qa = QuestionAnswerer::new(&s.config, &answerer);

        let answer = qa
            .ask(&s.index, &s.news, "gaceta de Sonora", Some(date(30)))
            .unwrap();
        assert!(!answer.answered);
        assert!(answer.sources.is_empty());
        assert!(answer.answer.contains("SONORA"));
        assert!(answerer.contexts.borrow().is_empty());
    }

    #[test]
    fn no_data_means_no_date() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("noticias.csv"), "date,headline,topic,link,outlet\n").unwrap();
        let news = NewsFeed::load(&tmp.path().join("noticias.csv")).unwrap();
        let s = stores();
        let answerer = RecordingAnswerer::default();
        let qa = QuestionAnswerer::new(&s.config, &answerer);

        let err = qa.ask(&s.index, &news, "casinos", None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AskError>(),
            Some(AskError::NoDateAvailable(Scope::News))
        ));
    }

    #[test]
    fn blank_question_is_rejected() {
        let s = stores();
        let answerer = RecordingAnswerer::default();
        let qa = QuestionAnswerer::new(&s.config, &answerer);
        assert!(matches!(qa.classify("   "), Err(AskError::EmptyQuestion)));
    }
}
