//! TOML configuration parsing.
//!
//! Every section is optional. A missing section falls back to the defaults
//! below, so an empty file is a valid configuration that points at
//! `do_index.csv` / `noticias.csv` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("do_index.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsConfig {
    #[serde(default = "default_news_path")]
    pub path: PathBuf,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            path: default_news_path(),
        }
    }
}

fn default_news_path() -> PathBuf {
    PathBuf::from("noticias.csv")
}

/// Where extracted text and summaries are written. Relative paths are
/// resolved against the directory containing the index file.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_text_dir")]
    pub text_dir: PathBuf,
    #[serde(default = "default_summary_dir")]
    pub summary_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            text_dir: default_text_dir(),
            summary_dir: default_summary_dir(),
        }
    }
}

fn default_text_dir() -> PathBuf {
    PathBuf::from("do_textos")
}
fn default_summary_dir() -> PathBuf {
    PathBuf::from("do_resumenes")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_max_summary_input_chars")]
    pub max_summary_input_chars: usize,
    #[serde(default = "default_max_news_rows")]
    pub max_news_rows: usize,
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
    #[serde(default = "default_max_topic_lines")]
    pub max_topic_lines: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            max_summary_input_chars: default_max_summary_input_chars(),
            max_news_rows: default_max_news_rows(),
            max_documents: default_max_documents(),
            max_topic_lines: default_max_topic_lines(),
        }
    }
}

fn default_max_context_chars() -> usize {
    24_000
}
fn default_max_summary_input_chars() -> usize {
    20_000
}
fn default_max_news_rows() -> usize {
    40
}
fn default_max_documents() -> usize {
    10
}
fn default_max_topic_lines() -> usize {
    10
}

/// A named keyword list. Table order is significant: the first entry whose
/// keywords match wins.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    pub name: String,
    pub keywords: Vec<String>,
}

impl KeywordTable {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default = "default_preferred_jurisdictions")]
    pub preferred_jurisdictions: Vec<String>,
    #[serde(default = "default_preferred_topics")]
    pub preferred_topics: Vec<String>,
    #[serde(default = "default_regulatory_keywords")]
    pub regulatory_keywords: Vec<String>,
    #[serde(default = "default_jurisdiction_keywords")]
    pub jurisdictions: Vec<KeywordTable>,
    #[serde(default = "default_topic_keywords")]
    pub topics: Vec<KeywordTable>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            preferred_jurisdictions: default_preferred_jurisdictions(),
            preferred_topics: default_preferred_topics(),
            regulatory_keywords: default_regulatory_keywords(),
            jurisdictions: default_jurisdiction_keywords(),
            topics: default_topic_keywords(),
        }
    }
}

fn default_preferred_jurisdictions() -> Vec<String> {
    ["DOF", "SONORA", "VERACRUZ", "CDMX"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_preferred_topics() -> Vec<String> {
    default_topic_keywords().into_iter().map(|t| t.name).collect()
}

fn default_regulatory_keywords() -> Vec<String> {
    [
        "dof",
        "diario oficial",
        "gaceta",
        "congreso",
        "parlamentaria",
        "ley",
        "reforma",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_jurisdiction_keywords() -> Vec<KeywordTable> {
    vec![
        KeywordTable::new("DOF", &["dof", "diario oficial de la federación"]),
        KeywordTable::new("SONORA", &["sonora"]),
        KeywordTable::new("VERACRUZ", &["veracruz"]),
        KeywordTable::new("CDMX", &["cdmx", "ciudad de méxico"]),
    ]
}

fn default_topic_keywords() -> Vec<KeywordTable> {
    vec![
        KeywordTable::new(
            "industria_alimentaria",
            &["industria alimentaria", "alimentos", "alimentaria"],
        ),
        KeywordTable::new("cemento", &["cemento"]),
        KeywordTable::new("gas", &["gas"]),
        KeywordTable::new("impuesto", &["impuesto", "impuestos", "tributario", "fiscal"]),
        KeywordTable::new("casinos", &["casino", "casinos", "juegos de azar"]),
        KeywordTable::new(
            "movilidad",
            &["movilidad", "transporte público", "tráfico", "transito", "tránsito"],
        ),
        KeywordTable::new("seguridad", &["seguridad", "violencia", "delincuencia"]),
        KeywordTable::new("agenda nacional", &["agenda nacional", "noticias nacionales"]),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Directory that relative storage and summary paths hang off: the
    /// directory containing the index file.
    pub fn base_dir(&self) -> PathBuf {
        match self.index.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Resolve a path from the index or config against [`Config::base_dir`].
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let limits = &config.limits;
    for (name, value) in [
        ("limits.max_context_chars", limits.max_context_chars),
        ("limits.max_summary_input_chars", limits.max_summary_input_chars),
        ("limits.max_news_rows", limits.max_news_rows),
        ("limits.max_documents", limits.max_documents),
        ("limits.max_topic_lines", limits.max_topic_lines),
    ] {
        if value == 0 {
            anyhow::bail!("{} must be > 0", name);
        }
    }

    for table in config.routing.jurisdictions.iter().chain(&config.routing.topics) {
        if table.keywords.iter().any(|k| k.trim().is_empty()) {
            anyhow::bail!("routing table '{}' contains an empty keyword", table.name);
        }
    }

    match config.llm.provider.as_str() {
        "disabled" => {}
        "openai" => {
            if config.llm.model.is_none() {
                anyhow::bail!("llm.model must be specified when provider is 'openai'");
            }
        }
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        validate(&config).unwrap();
        assert_eq!(config.limits.max_context_chars, 24_000);
        assert_eq!(config.limits.max_summary_input_chars, 20_000);
        assert_eq!(config.limits.max_news_rows, 40);
        assert_eq!(config.limits.max_documents, 10);
        assert_eq!(
            config.routing.preferred_jurisdictions,
            vec!["DOF", "SONORA", "VERACRUZ", "CDMX"]
        );
        assert_eq!(config.routing.preferred_topics[0], "industria_alimentaria");
        assert_eq!(config.routing.preferred_topics[7], "agenda nacional");
        assert!(!config.llm.is_enabled());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let config: Config = toml::from_str("[limits]\nmax_documents = 0\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("max_documents"));
    }

    #[test]
    fn openai_requires_model() {
        let config: Config = toml::from_str("[llm]\nprovider = \"openai\"\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config: Config = toml::from_str("[llm]\nprovider = \"local\"\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn keyword_tables_override_in_order() {
        let config: Config = toml::from_str(
            r#"
[[routing.jurisdictions]]
name = "JALISCO"
keywords = ["jalisco", "guadalajara"]
"#,
        )
        .unwrap();
        assert_eq!(config.routing.jurisdictions.len(), 1);
        assert_eq!(config.routing.jurisdictions[0].name, "JALISCO");
        // untouched tables keep their defaults
        assert_eq!(config.routing.topics.len(), 8);
    }

    #[test]
    fn relative_paths_resolve_against_index_dir() {
        let mut config = Config::default();
        config.index.path = PathBuf::from("/srv/data/do_index.csv");
        assert_eq!(
            config.resolve(Path::new("do_resumenes/DOF/a.txt")),
            PathBuf::from("/srv/data/do_resumenes/DOF/a.txt")
        );
        assert_eq!(config.resolve(Path::new("/abs/a.txt")), PathBuf::from("/abs/a.txt"));

        config.index.path = PathBuf::from("do_index.csv");
        assert_eq!(config.base_dir(), PathBuf::from("."));
    }
}
