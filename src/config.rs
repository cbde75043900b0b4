use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for mongo-nlq
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub groq: GroqConfig,
    pub mongo: MongoConfig,
    pub retry: RetryConfig,
    pub limits: LimitsConfig,
    pub guard: GuardConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    Cli,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub interface: Interface,
    /// host:port for the HTTP interface
    pub http_bind: String,
    /// Optional bearer token required on HTTP requests (except /health)
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Ask the API for a JSON object on the query-generation call
    pub json_mode: bool,
    pub max_tokens: i32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Documents shown when a query matches nothing
    pub sample_size: i64,
    /// None summarizes every row
    pub max_summarized_rows: Option<usize>,
    pub max_question_chars: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Permit `$out` / `$merge` in generated pipelines
    pub allow_write_stages: bool,
}

const PLACEHOLDER_GROQ_API_KEY: &str = "PLACEHOLDER_GROQ_API_KEY";

/// Most documents the empty-result fallback may show
const MAX_SAMPLE_SIZE: i64 = 3;

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
            }
        }

        if !env_loaded {
            tracing::warn!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("NLQ_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match Self::from_yaml(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::debug!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok());

        for warning in config.validate() {
            tracing::warn!("Config validation warning: {} - continuing anyway", warning);
        }

        config
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(interface) = var("NLQ_INTERFACE") {
            match interface.to_lowercase().as_str() {
                "cli" | "stdio" => self.server.interface = Interface::Cli,
                "http" => self.server.interface = Interface::Http,
                other => tracing::warn!("Unknown NLQ_INTERFACE '{}', keeping default", other),
            }
        }
        if let Some(bind) = var("NLQ_HTTP_BIND") {
            self.server.http_bind = bind;
        }
        if let Some(token) = var("NLQ_BEARER_TOKEN").filter(|t| !t.is_empty()) {
            self.server.bearer_token = Some(token);
        }

        // Groq overrides
        if let Some(api_key) = var("GROQ_API_KEY") {
            self.groq.api_key = api_key;
        }
        if let Some(model) = var("GROQ_MODEL") {
            self.groq.model = model;
        }
        if let Some(base_url) = var("GROQ_BASE_URL") {
            self.groq.base_url = base_url;
        }
        if let Some(json_mode) = var("GROQ_JSON_MODE") {
            if let Ok(flag) = json_mode.parse() {
                self.groq.json_mode = flag;
            }
        }

        // Mongo overrides
        if let Some(uri) = var("MONGO_URI") {
            self.mongo.uri = uri;
        }
        if let Some(database) = var("MONGO_DATABASE") {
            self.mongo.database = database;
        }

        // Retry overrides
        if let Some(attempts) = var("NLQ_RETRY_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.retry.max_attempts = n;
            }
        }

        // Limits overrides
        if let Some(size) = var("NLQ_SAMPLE_SIZE") {
            match size.parse::<i64>() {
                Ok(n) if (1..=MAX_SAMPLE_SIZE).contains(&n) => self.limits.sample_size = n,
                _ => tracing::warn!(
                    "Ignoring NLQ_SAMPLE_SIZE '{}', expected 1..={}",
                    size,
                    MAX_SAMPLE_SIZE
                ),
            }
        }
        if let Some(rows) = var("NLQ_MAX_SUMMARIZED_ROWS") {
            match rows.parse::<usize>() {
                Ok(0) => self.limits.max_summarized_rows = None,
                Ok(n) => self.limits.max_summarized_rows = Some(n),
                Err(_) => tracing::warn!("Ignoring invalid NLQ_MAX_SUMMARIZED_ROWS '{}'", rows),
            }
        }

        // Guard overrides
        if let Some(allow) = var("NLQ_ALLOW_WRITE_STAGES") {
            if let Ok(flag) = allow.parse() {
                self.guard.allow_write_stages = flag;
            }
        }
    }

    /// Every problem found, empty when the config is usable as-is
    fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.groq.api_key == PLACEHOLDER_GROQ_API_KEY || self.groq.api_key.is_empty() {
            warnings.push("GROQ_API_KEY environment variable must be set".to_string());
        }
        if self.mongo.uri.is_empty() {
            warnings.push("MONGO_URI environment variable must be set".to_string());
        }
        if self.retry.max_attempts == 0 {
            warnings.push("Retry max_attempts cannot be 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            warnings.push("Retry jitter factor must be between 0.0 and 1.0".to_string());
        }
        if !(1..=MAX_SAMPLE_SIZE).contains(&self.limits.sample_size) {
            warnings.push(format!(
                "limits.sample_size must be between 1 and {MAX_SAMPLE_SIZE}"
            ));
        }
        if self.limits.max_question_chars == 0 {
            warnings.push("limits.max_question_chars cannot be 0".to_string());
        }
        warnings
    }

    /// Chat completions endpoint derived from the base URL
    pub fn chat_completions_url(&self) -> String {
        let base = self.groq.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{base}/chat/completions")
        }
    }

    pub fn groq_timeout(&self) -> Duration {
        Duration::from_secs(self.groq.timeout_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interface: Interface::Cli,
            http_bind: "127.0.0.1:8787".to_string(),
            bearer_token: None,
        }
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_GROQ_API_KEY.to_string(),
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            json_mode: true,
            max_tokens: 1500,
            timeout_seconds: 120,
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            database: "sample_analytics".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 30_000,
            jitter_factor: 0.2,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            sample_size: MAX_SAMPLE_SIZE,
            max_summarized_rows: None,
            max_question_chars: 2000,
        }
    }
}
