//! Question routing.
//!
//! [`IntentRouter::classify`] is a keyword heuristic, not a model. Each table
//! is an ordered list of [`KeywordRule`]s evaluated front to back; the first
//! rule with a matching keyword wins, so ambiguous questions always resolve
//! the same way.

use crate::config::{Config, KeywordTable, RoutingConfig};
use crate::models::{Intent, Scope};

/// A result paired with the keywords that select it. Keywords are matched as
/// case-insensitive substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule<T> {
    keywords: Vec<String>,
    result: T,
}

impl<T> KeywordRule<T> {
    pub fn new<S: AsRef<str>>(keywords: &[S], result: T) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
            result,
        }
    }

    /// `text` must already be lowercased.
    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Result of the first rule in `rules` matching `text`.
fn first_match<'a, T>(rules: &'a [KeywordRule<T>], text: &str) -> Option<&'a T> {
    rules.iter().find(|r| r.matches(text)).map(|r| &r.result)
}

fn rules_from(tables: &[KeywordTable]) -> Vec<KeywordRule<String>> {
    tables
        .iter()
        .map(|t| KeywordRule::new(&t.keywords, t.name.clone()))
        .collect()
}

#[derive(Debug, Clone)]
pub struct IntentRouter {
    jurisdictions: Vec<KeywordRule<String>>,
    regulatory: KeywordRule<Scope>,
    topics: Vec<KeywordRule<String>>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::from_routing(&RoutingConfig::default())
    }
}

impl IntentRouter {
    pub fn from_config(config: &Config) -> Self {
        Self::from_routing(&config.routing)
    }

    pub fn from_routing(routing: &RoutingConfig) -> Self {
        Self {
            jurisdictions: rules_from(&routing.jurisdictions),
            regulatory: KeywordRule::new(&routing.regulatory_keywords, Scope::Regulatory),
            topics: rules_from(&routing.topics),
        }
    }

    /// Classify a free-text question.
    ///
    /// 1. The first jurisdiction rule that matches sets `jurisdiction`.
    /// 2. Scope is regulatory if a regulatory keyword matches or a
    ///    jurisdiction was found; news otherwise.
    /// 3. The first topic rule that matches sets `topic`.
    pub fn classify(&self, question: &str) -> Intent {
        let text = question.to_lowercase();

        let jurisdiction = first_match(&self.jurisdictions, &text).cloned();
        let scope = if self.regulatory.matches(&text) || jurisdiction.is_some() {
            Scope::Regulatory
        } else {
            Scope::News
        };
        let topic = first_match(&self.topics, &text).cloned();

        Intent {
            scope,
            jurisdiction,
            topic,
        }
    }
}
