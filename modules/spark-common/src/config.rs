use std::env;

use tracing::info;

use crate::scoring::{ScoreVariant, DEFAULT_AGE_CUTOFF_MINUTES};

/// Application configuration loaded from environment variables. Every
/// deployment-tuned constant lives here; the core never hardcodes
/// thresholds or model names.
#[derive(Debug, Clone)]
pub struct Config {
    // Scoring
    pub score_variant: ScoreVariant,
    pub gate_threshold: i64,
    pub age_cutoff_minutes: i64,
    pub reply_noise_threshold: u64,

    // Timeline scanning
    pub target_unique_count: usize,
    pub max_scan_attempts: u32,
    pub settle_delay_ms: u64,
    pub dispatch_delay_ms: u64,

    // Generation
    pub gemini_models: Vec<String>,
    pub gemini_api_keys: Vec<String>,
    pub suggestion_count: usize,
    pub knowledge_path: Option<String>,

    // Ingestion boundary
    pub ingest_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            score_variant: ScoreVariant::from_str_loose(
                &env::var("SCORE_VARIANT").unwrap_or_else(|_| "view_weighted".to_string()),
            ),
            gate_threshold: parsed_env("GATE_THRESHOLD", 200),
            age_cutoff_minutes: parsed_env("AGE_CUTOFF_MINUTES", DEFAULT_AGE_CUTOFF_MINUTES),
            reply_noise_threshold: parsed_env("REPLY_NOISE_THRESHOLD", 20),
            target_unique_count: parsed_env("SCAN_TARGET_COUNT", 50),
            max_scan_attempts: parsed_env("SCAN_MAX_ATTEMPTS", 100),
            settle_delay_ms: parsed_env("SCAN_SETTLE_DELAY_MS", 1500),
            dispatch_delay_ms: parsed_env("DISPATCH_DELAY_MS", 3000),
            gemini_models: parse_list(
                &env::var("GEMINI_MODELS")
                    .unwrap_or_else(|_| "gemini-2.0-flash,gemini-1.5-flash".to_string()),
            ),
            gemini_api_keys: parse_list(&required_env("GEMINI_API_KEYS")),
            suggestion_count: parsed_env("SUGGESTION_COUNT", 3),
            knowledge_path: env::var("KNOWLEDGE_PATH").ok(),
            ingest_url: env::var("INGEST_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api/replies".to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parsed_env("WEB_PORT", 3000),
        }
    }

    /// Log the non-secret configuration surface at startup.
    pub fn log_redacted(&self) {
        info!(
            variant = %self.score_variant,
            gate_threshold = self.gate_threshold,
            age_cutoff_minutes = self.age_cutoff_minutes,
            reply_noise_threshold = self.reply_noise_threshold,
            target_unique_count = self.target_unique_count,
            max_scan_attempts = self.max_scan_attempts,
            models = ?self.gemini_models,
            credentials = self.gemini_api_keys.len(),
            suggestion_count = self.suggestion_count,
            "Config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got: {v}")),
        Err(_) => default,
    }
}

/// Split a comma-separated env value into trimmed, non-empty entries,
/// preserving order (the order is the preference order).
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
