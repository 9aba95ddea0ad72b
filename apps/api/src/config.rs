use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the agent runtime, without a trailing slash.
    pub agent_base_url: String,
    pub agent_app_name: String,
    pub agent_user_id: String,
    pub upstream_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            agent_base_url: env_or("AGENT_BASE_URL", "http://localhost:8000")
                .trim_end_matches('/')
                .to_string(),
            agent_app_name: env_or("AGENT_APP_NAME", "linkedin_post_agent"),
            agent_user_id: env_or("AGENT_USER_ID", "web_user"),
            upstream_timeout_secs: env_or("UPSTREAM_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
