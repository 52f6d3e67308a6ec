//! Context assembly: turning index records and headlines into bounded text
//! blocks for the language model.
//!
//! Everything here is read-only and deterministic. Ordering follows a fixed
//! preference list first and then whatever else was discovered, so the
//! headings of generated digests always come out in the same order.
//!
//! A summary file that is missing or unreadable is logged and skipped; it
//! never empties the whole context.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::Config;
use crate::models::{normalize_jurisdiction, normalize_topic, DocumentRecord, EvidenceSource, NewsItem};

/// Emit the preferred entries that are present (in preference order), then the
/// remaining available entries in their given order. Each value appears once.
pub fn order_with_preference<'a, I>(available: I, preferred: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let available: Vec<&str> = available.into_iter().collect();
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::with_capacity(available.len());

    for p in preferred {
        if available.contains(&p.as_str()) && seen.insert(p.clone()) {
            ordered.push(p.clone());
        }
    }
    for a in available {
        if seen.insert(a.to_string()) {
            ordered.push(a.to_string());
        }
    }
    ordered
}

/// Jurisdiction ordering used for digest headings.
pub fn order_jurisdictions<'a, I>(available: I, preferred: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    order_with_preference(available, preferred)
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Text handed to the model plus the records or headlines it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    pub context: String,
    pub sources: Vec<EvidenceSource>,
}

impl Evidence {
    pub fn is_empty(&self) -> bool {
        self.context.trim().is_empty()
    }
}

/// Builds context blocks from usable records and headlines.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    base_dir: PathBuf,
    max_context_chars: usize,
    max_topic_lines: usize,
    preferred_jurisdictions: Vec<String>,
    preferred_topics: Vec<String>,
}

impl ContextAssembler {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let defaults = Config::default();
        Self {
            base_dir: base_dir.into(),
            max_context_chars: defaults.limits.max_context_chars,
            max_topic_lines: defaults.limits.max_topic_lines,
            preferred_jurisdictions: defaults.routing.preferred_jurisdictions,
            preferred_topics: defaults.routing.preferred_topics,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_dir: config.base_dir(),
            max_context_chars: config.limits.max_context_chars,
            max_topic_lines: config.limits.max_topic_lines,
            preferred_jurisdictions: config.routing.preferred_jurisdictions.clone(),
            preferred_topics: config.routing.preferred_topics.clone(),
        }
    }

    pub fn with_max_context_chars(mut self, max: usize) -> Self {
        self.max_context_chars = max;
        self
    }

    pub fn with_max_topic_lines(mut self, max: usize) -> Self {
        self.max_topic_lines = max;
        self
    }

    pub fn preferred_jurisdictions(&self) -> &[String] {
        &self.preferred_jurisdictions
    }

    /// Group usable records by jurisdiction and join each group's summaries.
    ///
    /// Summaries are joined with a blank line in record order, and the joined
    /// text is cut to the character budget. Jurisdictions whose summaries
    /// could not be read at all are left out of the map.
    pub fn build_by_jurisdiction<'a, I>(&self, records: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = &'a DocumentRecord>,
    {
        let mut texts: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for record in records.into_iter().filter(|r| r.is_usable()) {
            let Some(summary_path) = record.summary_path.as_deref() else {
                continue;
            };
            if let Some(text) = self.read_summary(Path::new(summary_path)) {
                texts
                    .entry(record.jurisdiction.clone())
                    .or_default()
                    .push(text);
            }
        }

        texts
            .into_iter()
            .map(|(jurisdiction, parts)| {
                let joined = parts.join("\n\n");
                let bounded = truncate_chars(&joined, self.max_context_chars).to_string();
                (jurisdiction, bounded)
            })
            .collect()
    }

    fn read_summary(&self, path: &Path) -> Option<String> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        if !resolved.exists() {
            warn!(path = %resolved.display(), "summary file not found; skipping");
            return None;
        }
        match fs::read_to_string(&resolved) {
            Ok(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                warn!(path = %resolved.display(), error = %e, "failed to read summary; skipping");
                None
            }
        }
    }

    /// Order the keys of a [`build_by_jurisdiction`](Self::build_by_jurisdiction)
    /// result by the preferred jurisdiction list.
    pub fn ordered_jurisdictions(&self, contexts: &BTreeMap<String, String>) -> Vec<String> {
        order_jurisdictions(
            contexts.keys().map(String::as_str),
            &self.preferred_jurisdictions,
        )
    }

    /// Render headlines as `topic :: headline` lines grouped by topic.
    ///
    /// Topics follow the preferred order, then any others in order of first
    /// appearance. Each topic contributes at most `max_topic_lines` rows.
    pub fn build_topic_context<'a, I>(&self, items: I) -> String
    where
        I: IntoIterator<Item = &'a NewsItem>,
    {
        let items: Vec<&NewsItem> = items.into_iter().collect();

        let mut present: Vec<&str> = Vec::new();
        for item in &items {
            if !present.contains(&item.topic_key()) {
                present.push(item.topic_key());
            }
        }

        let mut lines = Vec::new();
        for topic in order_with_preference(present, &self.preferred_topics) {
            let normalized = normalize_topic(&topic);
            for item in items
                .iter()
                .filter(|i| i.topic_key() == topic)
                .take(self.max_topic_lines)
            {
                let headline = item.headline.trim();
                if !headline.is_empty() {
                    lines.push(format!("{} :: {}", normalized, headline));
                }
            }
        }
        lines.join("\n")
    }

    /// Evidence for a news question: up to `max_rows` headlines, optionally
    /// restricted to one topic.
    pub fn news_evidence<'a, I>(&self, items: I, topic: Option<&str>, max_rows: usize) -> Evidence
    where
        I: IntoIterator<Item = &'a NewsItem>,
    {
        let mut lines = Vec::new();
        let mut sources = Vec::new();

        for item in items
            .into_iter()
            .filter(|i| topic.map_or(true, |t| i.topic == t))
            .take(max_rows)
        {
            lines.push(format!(
                "[{}] {} (outlet: {})",
                item.topic_key(), item.headline, item.outlet
            ));
            sources.push(EvidenceSource::News {
                date: item.date.map(|d| d.to_string()).unwrap_or_default(),
                topic: item.topic_key().to_string(),
                headline: item.headline.clone(),
                outlet: item.outlet.clone(),
                link: item.link.clone(),
            });
        }

        Evidence {
            context: lines.join("\n"),
            sources,
        }
    }

    /// Evidence for a regulatory question: per-jurisdiction summary blocks
    /// plus up to `max_documents` source records.
    pub fn document_evidence(
        &self,
        records: &[&DocumentRecord],
        jurisdiction: Option<&str>,
        max_documents: usize,
    ) -> Evidence {
        let jurisdiction = jurisdiction.map(normalize_jurisdiction);
        let relevant: Vec<&DocumentRecord> = records
            .iter()
            .copied()
            .filter(|r| jurisdiction.as_ref().map_or(true, |j| &r.jurisdiction == j))
            .collect();
        if relevant.is_empty() {
            return Evidence::default();
        }

        let contexts = self.build_by_jurisdiction(relevant.iter().copied());
        let blocks: Vec<String> = self
            .ordered_jurisdictions(&contexts)
            .into_iter()
            .filter_map(|j| contexts.get(&j).map(|text| format!("{}:\n{}", j, text)))
            .collect();

        let sources = relevant
            .iter()
            .take(max_documents)
            .map(|r| EvidenceSource::Document {
                date: r
                    .date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| r.raw_date.clone()),
                jurisdiction: r.jurisdiction.clone(),
                id: r.id.clone(),
                source_path: r.source_path.clone(),
            })
            .collect();

        Evidence {
            context: blocks.join("\n\n"),
            sources,
        }
    }
}
