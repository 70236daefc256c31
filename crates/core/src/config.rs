use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub sink: SinkConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `KBPREP_PROFILE`. When set (e.g. `STAGING`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("KBPREP_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        Self {
            sink: SinkConfig::from_env_profiled(&p),
            profile: p,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  sink:  host={}, dataset={}, api_key={}",
            self.sink.host,
            self.sink.dataset_id.as_deref().unwrap_or("(none)"),
            if self.sink.api_key.is_some() { "set" } else { "(none)" },
        );
    }
}

// ── Sink (Dify-style knowledge base) ──────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Base URL of the knowledge-base service, without trailing slash.
    pub host: String,
    pub api_key: Option<String>,
    /// Target dataset (knowledge base) identifier.
    pub dataset_id: Option<String>,
    pub indexing_technique: String,
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            api_key: None,
            dataset_id: None,
            indexing_technique: "high_quality".to_string(),
            timeout_secs: 60,
        }
    }
}

impl SinkConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            host: profiled_env_or(p, "DIFY_HOST", &defaults.host)
                .trim_end_matches('/')
                .to_string(),
            api_key: profiled_env_opt(p, "DIFY_API_KEY"),
            dataset_id: profiled_env_opt(p, "DIFY_KB_ID"),
            indexing_technique: profiled_env_or(
                p,
                "DIFY_INDEXING_TECHNIQUE",
                &defaults.indexing_technique,
            ),
            timeout_secs: profiled_env_u64(p, "DIFY_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }

    /// Replace the dataset id when an explicit override is given.
    pub fn with_dataset_id(mut self, dataset_id: Option<String>) -> Self {
        if let Some(id) = dataset_id.filter(|s| !s.is_empty()) {
            self.dataset_id = Some(id);
        }
        self
    }

    /// Fail before any input is processed if credentials or the target are missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials().map(|_| ())
    }

    /// The `(api_key, dataset_id)` pair, once every setting checks out.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing("DIFY_API_KEY"))?;
        let dataset_id = self
            .dataset_id
            .as_deref()
            .ok_or(ConfigError::Missing("DIFY_KB_ID"))?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "DIFY_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok((api_key, dataset_id))
    }
}
