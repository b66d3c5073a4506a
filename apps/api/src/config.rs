use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable is present but malformed.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// `None` disables the remote embedding and chat backends.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub embedding_cache_dir: PathBuf,
    pub scoring_pacing: Duration,
    pub remote_timeout: Duration,
    /// Attempts per remote call, including the first.
    pub remote_max_retries: u32,
    pub max_upload_bytes: usize,
    /// Screenings kept in memory before the oldest is dropped.
    pub max_screenings: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let remote_mode = optional_env("REMOTE_BACKEND").unwrap_or_else(|| "auto".to_string());
        let openai_api_key = match remote_mode.to_ascii_lowercase().as_str() {
            "auto" => optional_env("OPENAI_API_KEY"),
            "disabled" => None,
            other => bail!("REMOTE_BACKEND must be 'auto' or 'disabled', got '{other}'"),
        };

        Ok(Config {
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            openai_api_key,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            chat_model: optional_env("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            embedding_cache_dir: optional_env("EMBEDDING_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("emb_cache")),
            scoring_pacing: Duration::from_millis(
                parse_env("SCORING_PACING_MS", 50u64)
                    .context("SCORING_PACING_MS must be a number of milliseconds")?,
            ),
            remote_timeout: Duration::from_secs(
                parse_env("REMOTE_TIMEOUT_SECS", 60u64)
                    .context("REMOTE_TIMEOUT_SECS must be a number of seconds")?,
            ),
            remote_max_retries: parse_env("REMOTE_MAX_RETRIES", 3u32)
                .context("REMOTE_MAX_RETRIES must be a whole number")?,
            max_upload_bytes: parse_env("MAX_UPLOAD_MB", 25usize)
                .context("MAX_UPLOAD_MB must be a number of megabytes")?
                * 1024
                * 1024,
            max_screenings: parse_env("MAX_SCREENINGS", 100usize)
                .context("MAX_SCREENINGS must be a whole number")?,
        })
    }

    pub fn remote_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("embedding_cache_dir", &self.embedding_cache_dir)
            .field("scoring_pacing", &self.scoring_pacing)
            .field("remote_timeout", &self.remote_timeout)
            .field("remote_max_retries", &self.remote_max_retries)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_screenings", &self.max_screenings)
            .finish()
    }
}

/// Returns the variable's value, treating unset and blank as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for environment variable '{key}'")),
        None => Ok(default),
    }
}
