//! Language-model collaborators.
//!
//! The core never talks to a model directly. It depends on three narrow
//! capabilities:
//!
//! - [`Summarizer`]: digest one document's extracted text.
//! - [`Digester`]: rewrite assembled context into a daily digest.
//! - [`Answerer`]: answer a question from assembled context.
//!
//! [`PromptedModel`] implements all three on top of any [`ChatModel`]
//! transport. Two transports exist:
//!
//! - **[`DisabledModel`]**: always errors; used when no provider is set.
//! - **[`OpenAiChatModel`]**: OpenAI-compatible `POST /chat/completions`
//!   with retry and backoff.
//!
//! # Retry Strategy
//!
//! - HTTP 429 and 5xx → retry
//! - other 4xx → fail immediately
//! - network errors → retry
//! - backoff: 1s, 2s, 4s, 8s, ... (capped at 2^5)

use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::models::Scope;

/// A chat-completion transport: one system message, one user message, one
/// text reply.
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Input for a per-document summary.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub text: &'a str,
    pub jurisdiction: &'a str,
    pub date: &'a str,
    pub id: &'a str,
}

/// Input for a question answer.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRequest<'a> {
    pub question: &'a str,
    pub context: &'a str,
    pub date: NaiveDate,
    pub jurisdiction: Option<&'a str>,
    pub scope: Scope,
}

pub trait Summarizer {
    /// Bullet-formatted factual digest of one document.
    fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String>;
}

pub trait Digester {
    /// Daily digest for one jurisdiction from its joined summaries.
    fn regulatory_digest(&self, jurisdiction: &str, date: NaiveDate, context: &str) -> Result<String>;

    /// Daily digest of `topic :: headline` lines, grouped by topic.
    fn news_digest(&self, date: NaiveDate, context: &str) -> Result<String>;
}

pub trait Answerer {
    fn answer(&self, request: &AnswerRequest<'_>) -> Result<String>;
}

// ============ Disabled Model ============

/// A model that refuses every call. Selected by `llm.provider = "disabled"`.
pub struct DisabledModel;

impl ChatModel for DisabledModel {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        bail!("language model provider is disabled")
    }
}

// ============ OpenAI-compatible Model ============

/// Chat-completions client. Reads `OPENAI_API_KEY` from the environment.
pub struct OpenAiChatModel {
    model: String,
    base_url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::blocking::Client,
}

impl OpenAiChatModel {
    /// # Errors
    ///
    /// Returns an error if `llm.model` is unset or `OPENAI_API_KEY` is not
    /// in the environment.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }
}

impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                debug!(attempt, delay_secs = delay.as_secs(), "retrying chat completion");
                std::thread::sleep(delay);
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send();

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json()?;
                        return parse_chat_response(&json);
                    }

                    let body_text = response.text().unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(%status, "chat completion failed; will retry");
                        last_err = Some(anyhow::anyhow!("LLM API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("LLM API error {}: {}", status, body_text);
                }
                Err(e) => {
                    warn!(error = %e, "chat completion request failed; will retry");
                    last_err = Some(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("chat completion failed after retries")))
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))?;
    Ok(content.trim().to_string())
}

/// Create the [`ChatModel`] named by `llm.provider`.
///
/// | Config Value | Model |
/// |-------------|-------|
/// | `"disabled"` | [`DisabledModel`] |
/// | `"openai"` | [`OpenAiChatModel`] |
pub fn create_model(config: &LlmConfig) -> Result<Box<dyn ChatModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledModel)),
        "openai" => Ok(Box::new(OpenAiChatModel::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

/// Defers [`create_model`] until the first completion.
///
/// Commands that may end without calling the model (an empty digest, a
/// question with no evidence, a dry run) then need no API key.
pub struct LazyModel {
    config: LlmConfig,
    client: OnceLock<Box<dyn ChatModel>>,
}

impl LazyModel {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&dyn ChatModel> {
        if let Some(client) = self.client.get() {
            return Ok(client.as_ref());
        }
        let client = create_model(&self.config)?;
        debug!(provider = %self.config.provider, "model client created");
        Ok(self.client.get_or_init(|| client).as_ref())
    }
}

impl ChatModel for LazyModel {
    fn model_name(&self) -> &str {
        self.config.model.as_deref().unwrap_or(self.config.provider.as_str())
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.client()?.complete(system, user)
    }
}

// ============ Prompts ============

const FACTUAL_RULES: &str = "\
- Always answer in Spanish.
- Do not invent information or add outside context.
- Do not interpret, evaluate impact, or explain why something matters.
- Never use phrases such as \"lo que indica\", \"lo que podría implicar\", \
\"esto muestra que\", \"esto sugiere\" or \"esto evidencia\".";

const DOCUMENT_SYSTEM: &str = "\
You summarize official gazettes and parliamentary bulletins for a public-affairs firm.

RULES
{rules}
- Describe only normative content: decrees, agreements, reforms, guidelines, appointments.

FORMAT
- 3 to 8 bullets, each starting with \"- \".
- Each bullet is one clear, factual sentence about one concrete measure.
- No links, no outlet names, no closing remarks.";

const REGULATORY_DIGEST_SYSTEM: &str = "\
You write the daily regulatory digest of official gazettes for a public-affairs firm.

RULES
{rules}

EDITORIAL CRITERIA
- Prioritize substantive measures: decrees, reforms, agreements with general effect, taxes,
  tariffs, subsidies, expropriations, programs, regulatory guidelines, relevant appointments.
- Collapse into a single bullet: internal congressional procedure, session openings or
  closings, received correspondence, edicts, notarial notices.
- If the day only has procedural content, edicts or notarial acts, say so in ONE bullet.

FORMAT
- At most 5 bullets, each starting with \"- \" and one sentence long.
- No links, volume numbers or edition times.
- No introduction, no conclusion.";

const NEWS_DIGEST_SYSTEM: &str = "\
You write a factual news digest for a public-affairs firm.

RULES
{rules}
- Describe only the facts reported in the headlines.

FORMAT
- One block per topic that has news:
TOPIC_NAME_IN_CAPITALS
- bullet
- bullet
- At most 4 bullets per topic, each starting with \"- \" and one sentence long.
- No links, outlet names or explicit dates.
- No text before the first topic and nothing after the last bullet.";

const NEWS_ANSWER_SYSTEM: &str = "\
You answer questions about the day's news for a public-affairs firm.

RULES
{rules}
- Use ONLY the headlines provided.
- Use 2 to 5 bullets when the question asks for a rundown. Be concrete.";

const REGULATORY_ANSWER_SYSTEM: &str = "\
You answer questions about official gazettes and parliamentary bulletins for a public-affairs firm.

RULES
{rules}
- Use ONLY the regulatory context provided.
- Do not invent articles, laws, dates or background.
- Use 2 to 5 bullets when the question asks for a rundown.";

fn system_prompt(template: &str) -> String {
    template.replace("{rules}", FACTUAL_RULES)
}

/// Prompted capabilities on top of a [`ChatModel`].
pub struct PromptedModel {
    model: Box<dyn ChatModel>,
}

impl PromptedModel {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }
}

impl Summarizer for PromptedModel {
    fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String> {
        let user = format!(
            "Write a bullet summary of the following document.\n\n\
             Metadata:\n- Jurisdiction: {}\n- Publication date: {}\n- Document id: {}\n\n\
             Document text (may be truncated):\n\"\"\"{}\"\"\"",
            request.jurisdiction, request.date, request.id, request.text
        );
        self.model.complete(&system_prompt(DOCUMENT_SYSTEM), &user)
    }
}

impl Digester for PromptedModel {
    fn regulatory_digest(&self, jurisdiction: &str, date: NaiveDate, context: &str) -> Result<String> {
        let user = format!(
            "Write the daily regulatory digest of what {} published on {}.\n\n\
             Below are the summaries of each volume or edition of that day. \
             Rewrite them following the editorial criteria strictly:\n\n\"\"\"{}\"\"\"",
            jurisdiction, date, context
        );
        self.model
            .complete(&system_prompt(REGULATORY_DIGEST_SYSTEM), &user)
    }

    fn news_digest(&self, date: NaiveDate, context: &str) -> Result<String> {
        let user = format!(
            "Write the topic digest for {}.\n\n\
             Each context line has the format:\ntopic :: headline\n\n\
             Context (the day's headlines):\n{}",
            date, context
        );
        self.model.complete(&system_prompt(NEWS_DIGEST_SYSTEM), &user)
    }
}

impl Answerer for PromptedModel {
    fn answer(&self, request: &AnswerRequest<'_>) -> Result<String> {
        let (system, user) = match request.scope {
            Scope::News => (
                system_prompt(NEWS_ANSWER_SYSTEM),
                format!(
                    "User question:\n\"\"\"{}\"\"\"\n\nReference date: {}\n\n\
                     The day's headlines, one per line:\n\"\"\"{}\"\"\"\n\n\
                     Answer using ONLY what appears in those headlines.",
                    request.question, request.date, request.context
                ),
            ),
            Scope::Regulatory => (
                system_prompt(REGULATORY_ANSWER_SYSTEM),
                format!(
                    "User question:\n\"\"\"{}\"\"\"\n\nReference date: {}\nJurisdiction: {}\n\n\
                     Regulatory summaries from official gazettes:\n\"\"\"{}\"\"\"\n\n\
                     Answer using ONLY what appears in this context.",
                    request.question,
                    request.date,
                    request.jurisdiction.unwrap_or("all available"),
                    request.context
                ),
            ),
        };
        self.model.complete(&system, &user)
    }
}
