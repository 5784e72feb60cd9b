use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Process configuration, read once at startup and passed into the app
/// state. External-service credentials are optional: without them the
/// summary client falls back to keyword summaries and flipbook conversion
/// fails as an upstream error.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub output_dir: PathBuf,
    pub public_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub flipbook_client_id: Option<String>,
    pub flipbook_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;

        Ok(Config {
            database_url,
            bind_address: env_or("NEWSDESK_BIND_ADDRESS", "0.0.0.0:3000"),
            output_dir: PathBuf::from(env_or("NEWSDESK_OUTPUT_DIR", "generated_pdfs")),
            public_base_url: non_empty_var("NEWSDESK_PUBLIC_BASE_URL"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            flipbook_client_id: non_empty_var("FLIPBOOK_CLIENT_ID"),
            flipbook_api_key: non_empty_var("FLIPBOOK_API_KEY"),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
