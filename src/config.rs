use anyhow::Context;
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-4o-mini";

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openrouter_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid number, got '{}'", raw))?,
            None => 8080,
        };

        let llm_timeout_secs = match lookup("LLM_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse().with_context(|| {
                format!("LLM_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw)
            })?),
            None => None,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            openrouter_api_key: lookup("OPENROUTER_API_KEY").filter(|key| !key.trim().is_empty()),
            llm_model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_timeout_secs,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn llm_timeout(&self) -> Option<Duration> {
        self.llm_timeout_secs.map(Duration::from_secs)
    }
}

// Keeps the API key out of the startup log.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "***API_KEY***"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .finish()
    }
}
