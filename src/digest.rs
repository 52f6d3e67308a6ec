//! Daily digests.
//!
//! A digest rewrites one day's assembled context through the model. Every
//! "nothing to say" case is an outcome value rather than an error, so a
//! caller can tell an empty day apart from an unreadable index.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::context::ContextAssembler;
use crate::index::DocumentIndex;
use crate::llm::Digester;
use crate::models::normalize_jurisdiction;
use crate::news::NewsFeed;

/// Result of [`regulatory_digest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum RegulatoryDigest {
    /// No usable records on that date.
    NoDocuments,
    /// Usable records exist but none of their summaries could be read.
    NoSummaries,
    /// The requested jurisdiction has no summaries on that date.
    JurisdictionMissing(String),
    /// The model returned nothing for every jurisdiction.
    NothingGenerated,
    Ready(String),
}

/// Result of [`news_digest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum NewsDigest {
    NoNews,
    Ready(String),
}

/// Build the regulatory digest for `date`.
///
/// Jurisdictions are processed in preferred order (or just the one in
/// `jurisdiction`). Each one with a non-empty model reply contributes a block:
///
/// ```text
/// DOF
/// - ...
///
/// SONORA
/// - ...
/// ```
///
/// Model errors propagate.
pub fn regulatory_digest(
    index: &DocumentIndex,
    assembler: &ContextAssembler,
    digester: &dyn Digester,
    date: NaiveDate,
    jurisdiction: Option<&str>,
) -> Result<RegulatoryDigest> {
    let records = index.load_for_date(date);
    if records.is_empty() {
        return Ok(RegulatoryDigest::NoDocuments);
    }

    let contexts = assembler.build_by_jurisdiction(records.iter().copied());
    if contexts.is_empty() {
        return Ok(RegulatoryDigest::NoSummaries);
    }

    let targets = match jurisdiction.map(normalize_jurisdiction) {
        Some(j) if !contexts.contains_key(&j) => {
            return Ok(RegulatoryDigest::JurisdictionMissing(j));
        }
        Some(j) => vec![j],
        None => assembler.ordered_jurisdictions(&contexts),
    };

    let mut lines: Vec<String> = Vec::new();
    for j in &targets {
        let Some(context) = contexts.get(j).filter(|c| !c.trim().is_empty()) else {
            continue;
        };
        let digest = digester.regulatory_digest(j, date, context)?;
        let digest = digest.trim();
        if digest.is_empty() {
            debug!(jurisdiction = %j, "model returned an empty digest");
            continue;
        }
        lines.push(j.to_uppercase());
        lines.push(digest.to_string());
        lines.push(String::new());
    }

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        return Ok(RegulatoryDigest::NothingGenerated);
    }
    info!(%date, jurisdictions = targets.len(), "regulatory digest generated");
    Ok(RegulatoryDigest::Ready(text))
}

/// Build the news digest for `date` from `topic :: headline` lines.
pub fn news_digest(
    feed: &NewsFeed,
    assembler: &ContextAssembler,
    digester: &dyn Digester,
    date: NaiveDate,
) -> Result<NewsDigest> {
    let items = feed.for_date(date);
    if items.is_empty() {
        return Ok(NewsDigest::NoNews);
    }

    let context = assembler.build_topic_context(items.iter().copied());
    if context.trim().is_empty() {
        return Ok(NewsDigest::NoNews);
    }

    let digest = digester.news_digest(date, &context)?;
    info!(%date, headlines = items.len(), "news digest generated");
    Ok(NewsDigest::Ready(digest.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Replies with the first line of the context, or nothing for `SILENT`.
    #[derive(Default)]
    struct FirstLineDigester {
        seen: RefCell<Vec<String>>,
    }

    impl Digester for FirstLineDigester {
        fn regulatory_digest(&self, jurisdiction: &str, _date: NaiveDate, context: &str) -> Result<String> {
            self.seen.borrow_mut().push(jurisdiction.to_string());
            if jurisdiction == "SILENT" {
                return Ok("  ".to_string());
            }
            Ok(context.lines().next().unwrap_or_default().to_string())
        }

        fn news_digest(&self, _date: NaiveDate, context: &str) -> Result<String> {
            Ok(format!("{}\n", context))
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 30).unwrap()
    }

    fn write_index(dir: &Path, rows: &[(&str, &str, &str)]) -> DocumentIndex {
        let mut csv = String::from("id,date,jurisdiction,source_path,text_path,summary_path,status\n");
        for (id, jurisdiction, summary) in rows {
            let summary_path = if summary.is_empty() {
                String::new()
            } else {
                let name = format!("{}.txt", id);
                fs::write(dir.join(&name), summary).unwrap();
                name
            };
            csv.push_str(&format!(
                "{},2026-01-30,{},pdfs,,{},summary_ready\n",
                id, jurisdiction, summary_path
            ));
        }
        let path = dir.join("do_index.csv");
        fs::write(&path, csv).unwrap();
        DocumentIndex::load(&path).unwrap()
    }

    #[test]
    fn blocks_follow_preferred_order() {
        let tmp = TempDir::new().unwrap();
        let index = write_index(
            tmp.path(),
            &[
                ("v", "VERACRUZ", "- Veracruz acuerdo"),
                ("j", "JALISCO", "- Jalisco aviso"),
                ("d", "DOF", "- DOF decreto"),
            ],
        );
        let assembler = ContextAssembler::new(tmp.path());
        let digester = FirstLineDigester::default();

        let digest = regulatory_digest(&index, &assembler, &digester, day(), None).unwrap();
        assert_eq!(
            digest,
            RegulatoryDigest::Ready(
                "DOF\n- DOF decreto\n\nVERACRUZ\n- Veracruz acuerdo\n\nJALISCO\n- Jalisco aviso"
                    .to_string()
            )
        );
        assert_eq!(*digester.seen.borrow(), vec!["DOF", "VERACRUZ", "JALISCO"]);
    }

    #[test]
    fn filter_selects_one_jurisdiction() {
        let tmp = TempDir::new().unwrap();
        let index = write_index(
            tmp.path(),
            &[("v", "VERACRUZ", "- Veracruz acuerdo"), ("d", "DOF", "- DOF decreto")],
        );
        let assembler = ContextAssembler::new(tmp.path());
        let digester = FirstLineDigester::default();

        let digest =
            regulatory_digest(&index, &assembler, &digester, day(), Some("veracruz")).unwrap();
        assert_eq!(
            digest,
            RegulatoryDigest::Ready("VERACRUZ\n- Veracruz acuerdo".to_string())
        );

        let missing = regulatory_digest(&index, &assembler, &digester, day(), Some("cdmx")).unwrap();
        assert_eq!(missing, RegulatoryDigest::JurisdictionMissing("CDMX".to_string()));
    }

    #[test]
    fn empty_day_is_an_outcome() {
        let tmp = TempDir::new().unwrap();
        let index = write_index(tmp.path(), &[("d", "DOF", "- DOF decreto")]);
        let assembler = ContextAssembler::new(tmp.path());
        let other_day = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        let digest =
            regulatory_digest(&index, &assembler, &FirstLineDigester::default(), other_day, None)
                .unwrap();
        assert_eq!(digest, RegulatoryDigest::NoDocuments);
    }

    #[test]
    fn unreadable_summaries_are_an_outcome() {
        let tmp = TempDir::new().unwrap();
        let index = write_index(tmp.path(), &[("d", "DOF", "- DOF decreto")]);
        fs::remove_file(tmp.path().join("d.txt")).unwrap();
        let assembler = ContextAssembler::new(tmp.path());

        let digest =
            regulatory_digest(&index, &assembler, &FirstLineDigester::default(), day(), None)
                .unwrap();
        assert_eq!(digest, RegulatoryDigest::NoSummaries);
    }

    #[test]
    fn empty_model_replies_are_nothing_generated() {
        let tmp = TempDir::new().unwrap();
        let index = write_index(tmp.path(), &[("s", "SILENT", "- algo")]);
        let assembler = ContextAssembler::new(tmp.path());

        let digest =
            regulatory_digest(&index, &assembler, &FirstLineDigester::default(), day(), None)
                .unwrap();
        assert_eq!(digest, RegulatoryDigest::NothingGenerated);
    }

    #[test]
    fn news_digest_uses_topic_context() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("noticias.csv");
        fs::write(
            &path,
            "date,headline,topic,link,outlet\n\
             2026-01-30,Sube el gas,gas,https://a,El Diario\n\
             2026-01-30,Nueva planta,cemento,https://b,La Voz\n",
        )
        .unwrap();
        let feed = NewsFeed::load(&path).unwrap();
        let assembler = ContextAssembler::new(tmp.path());
        let digester = FirstLineDigester::default();

        let digest = news_digest(&feed, &assembler, &digester, day()).unwrap();
        assert_eq!(
            digest,
            NewsDigest::Ready("cemento :: Nueva planta\ngas :: Sube el gas".to_string())
        );

        let empty = news_digest(
            &feed,
            &assembler,
            &digester,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(empty, NewsDigest::NoNews);
    }
}
