use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// OpenAI-compatible text-generation endpoint (question + feedback generation).
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub voice_api_base_url: String,
    pub voice_api_key: String,
    /// Shared secret the provider sends in `x-vapi-secret`; unchecked when unset.
    pub voice_webhook_secret: Option<String>,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Public host used to build shareable interview links.
    pub host_url: String,
    /// Root directory for per-tab and per-user durable storage.
    pub data_dir: PathBuf,
    pub voice_connect_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            llm_base_url: optional_env("LLM_BASE_URL", crate::llm_client::DEFAULT_BASE_URL),
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_model: optional_env("LLM_MODEL", crate::llm_client::DEFAULT_MODEL),
            voice_api_base_url: optional_env(
                "VOICE_API_BASE_URL",
                crate::voice::client::DEFAULT_VOICE_API_BASE_URL,
            ),
            voice_api_key: require_env("VOICE_API_KEY")?,
            voice_webhook_secret: std::env::var("VOICE_WEBHOOK_SECRET").ok(),
            supabase_url: require_env("SUPABASE_URL")?,
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            host_url: require_env("HOST_URL")?,
            data_dir: PathBuf::from(optional_env("DATA_DIR", "./data")),
            voice_connect_timeout: Duration::from_secs(
                optional_env("VOICE_CONNECT_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("VOICE_CONNECT_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Config for router tests: no real endpoints are ever called.
    pub fn for_tests(data_dir: &std::path::Path) -> Self {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            llm_base_url: crate::llm_client::DEFAULT_BASE_URL.to_string(),
            llm_api_key: "test".to_string(),
            llm_model: crate::llm_client::DEFAULT_MODEL.to_string(),
            voice_api_base_url: crate::voice::client::DEFAULT_VOICE_API_BASE_URL.to_string(),
            voice_api_key: "test".to_string(),
            voice_webhook_secret: None,
            supabase_url: "https://proj.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            host_url: "https://hire.example/interview".to_string(),
            data_dir: data_dir.to_path_buf(),
            voice_connect_timeout: Duration::from_secs(30),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
