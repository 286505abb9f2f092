//! Runtime configuration
//!
//! Built once at startup from the environment and passed by reference into
//! constructors; nothing reads env vars after boot.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the language-model backend.
    pub model_api_key: String,
    /// Base URL for the financial gateway the remote-call tool posts to.
    pub gateway_base_url: Option<String>,
    /// Optional Postgres URL for the durable session checkpoint store.
    pub database_url: Option<String>,
    /// HTTP port for the API server binary.
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let model_api_key = env::var("MODEL_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .unwrap_or_default();

        let gateway_base_url = env::var("GATEWAY_BASE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string());

        let database_url = env::var("POSTGRES_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);

        Self {
            model_api_key,
            gateway_base_url,
            database_url,
            port,
        }
    }
}
