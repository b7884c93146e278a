use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    /// `json` switches the log output to JSON lines
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Engine tuning, read from `RELEVANCE_*` environment variables
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default = "default_follow_up_limit")]
    pub follow_up_limit: usize,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default)]
    pub honor_blocked_categories: bool,
    /// Fixed seed for template selection; entropy when unset
    #[serde(default)]
    pub response_seed: Option<u64>,
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,
    #[serde(default = "default_llm_min_confidence")]
    pub llm_min_confidence: f64,
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_cache_max_entries() -> usize {
    1000
}

fn default_min_relevance() -> f64 {
    0.1
}

fn default_suggestion_limit() -> usize {
    3
}

fn default_follow_up_limit() -> usize {
    10
}

fn default_history_window() -> usize {
    5
}

fn default_llm_timeout_ms() -> u64 {
    10_000
}

fn default_llm_min_confidence() -> f64 {
    0.3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            min_relevance: default_min_relevance(),
            suggestion_limit: default_suggestion_limit(),
            follow_up_limit: default_follow_up_limit(),
            history_window: default_history_window(),
            honor_blocked_categories: false,
            response_seed: None,
            llm_timeout_ms: default_llm_timeout_ms(),
            llm_min_confidence: default_llm_min_confidence(),
        }
    }
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("RELEVANCE_").from_env::<EngineConfig>()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        let log_format = match env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "relevance-service".to_string()),
                log_format,
            },
            engine: EngineConfig::from_env()?,
        })
    }
}
