use serde::Deserialize;
use std::time::Duration;

use crate::services::resolver::MatchPolicy;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorProvider {
    #[default]
    Gemini,
    Openai,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicyKind {
    #[default]
    FirstResult,
    TitleSimilarity,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Which generative text backend to call
    #[serde(default)]
    pub generator_provider: GeneratorProvider,

    pub generator_api_key: String,

    /// Backend default model when unset
    pub generator_model: Option<String>,

    /// Backend default endpoint when unset
    pub generator_api_url: Option<String>,

    pub catalog_api_key: String,

    #[serde(default = "default_catalog_api_url")]
    pub catalog_api_url: String,

    #[serde(default = "default_catalog_locale")]
    pub catalog_locale: String,

    #[serde(default = "default_catalog_image_base_url")]
    pub catalog_image_base_url: String,

    #[serde(default)]
    pub match_policy: MatchPolicyKind,

    #[serde(default = "default_title_similarity_threshold")]
    pub title_similarity_threshold: f64,

    /// Unbounded when unset
    pub max_concurrent_lookups: Option<usize>,

    /// Catalog responses are cached only when set
    pub redis_url: Option<String>,

    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_catalog_locale() -> String {
    "en-US".to_string()
}

fn default_catalog_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_title_similarity_threshold() -> f64 {
    0.6
}

/// Longest an idle quiz flow is kept, whatever `SESSION_TTL_SECS` says
const MAX_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

fn default_session_ttl_secs() -> u64 {
    1800
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn match_policy(&self) -> MatchPolicy {
        match self.match_policy {
            MatchPolicyKind::FirstResult => MatchPolicy::FirstResult,
            MatchPolicyKind::TitleSimilarity => MatchPolicy::TitleSimilarity {
                threshold: self.title_similarity_threshold.clamp(0.0, 1.0),
            },
        }
    }

    /// Idle quiz lifetime, clamped to 1s..=7 days
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs.clamp(1, MAX_SESSION_TTL_SECS))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
