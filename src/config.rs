use serde::Deserialize;
use std::path::Path;

/// Labels offered to the zero-shot model when the config does not override them.
pub const DEFAULT_CATEGORIES: [&str; 4] = [
    "Terrorism/Protest/Political Unrest/Riot",
    "Positive/Uplifting",
    "Natural Disasters",
    "Others",
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Pause before each classification, in milliseconds
    #[serde(default = "default_process_delay_ms")]
    pub process_delay_ms: u64,
    #[serde(default = "default_max_concurrent_classifications")]
    pub max_concurrent_classifications: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub feeds: Vec<FeedConfig>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_database_url() -> String {
    "sqlite:news_articles.db?mode=rwc".to_string()
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn default_process_delay_ms() -> u64 {
    1000
}

fn default_max_concurrent_classifications() -> usize {
    8
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the bearer token, if any
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub multi_label: bool,
}

fn default_classifier_endpoint() -> String {
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli".to_string()
}

fn default_api_token_env() -> String {
    "HF_API_TOKEN".to_string()
}

fn default_classifier_timeout() -> u64 {
    60
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
            api_token_env: default_api_token_env(),
            timeout_secs: default_classifier_timeout(),
            multi_label: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Replace feed summaries with text scraped from the article page
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_extraction_timeout")]
    pub timeout_secs: u64,
}

fn default_extraction_timeout() -> u64 {
    30
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_extraction_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.categories.is_empty() {
            anyhow::bail!("at least one category is required");
        }
        if self.max_concurrent_classifications == 0 {
            anyhow::bail!("max_concurrent_classifications must be positive");
        }
        Ok(())
    }

    /// `DATABASE_URL` in the environment wins over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database_url = url;
            }
        }
    }
}
