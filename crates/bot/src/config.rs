//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Which backend answers customer messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Workflow-automation webhook (`WEBHOOK_URL`).
    Webhook,
    /// OpenAI-compatible chat completions (`LLM_*`).
    Llm,
    /// Echo the customer's text, for local testing.
    Echo,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(Backend::Webhook),
            "llm" => Ok(Backend::Llm),
            "echo" => Ok(Backend::Echo),
            _ => Err(ConfigError::Invalid {
                var: "BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Bridge daemon base URL.
    pub bridge_url: String,
    /// Bridge session name, when the daemon hosts several.
    pub bridge_session: Option<String>,
    /// Key the bridge session blob is stored under.
    pub client_id: String,
    pub tenant_id: i64,
    /// Phone number that receives handoff and error alerts.
    pub operator_number: Option<String>,
    pub backend: Backend,
    pub webhook_url: Option<String>,
    pub backend_timeout: Duration,
    /// Logged messages passed to the backend as history.
    pub history_limit: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PORT` | HTTP port | `3000` |
    /// | `DATABASE_URL` | SQLite database URL | (required) |
    /// | `BRIDGE_URL` | Bridge daemon URL | (required) |
    /// | `BRIDGE_SESSION` | Bridge session name | (none) |
    /// | `BOT_CLIENT_ID` | Session key | (required) |
    /// | `TENANT_ID` | Tenant for logged messages | `1` |
    /// | `OPERATOR_NUMBER` | Operator phone number | (none) |
    /// | `BACKEND` | `webhook`, `llm` or `echo` | `webhook` |
    /// | `WEBHOOK_URL` | Webhook endpoint | (required for `webhook`) |
    /// | `LLM_API_KEY` | LLM API key | (required for `llm`) |
    /// | `BACKEND_TIMEOUT_SECS` | Backend timeout | `60` |
    /// | `HISTORY_LIMIT` | History messages | `10` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let port: u16 = parse_or(var("PORT"), "PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let backend = match var("BACKEND") {
            Some(value) => value.parse()?,
            None => Backend::Webhook,
        };

        let webhook_url = var("WEBHOOK_URL");
        match backend {
            Backend::Webhook if webhook_url.is_none() => {
                return Err(ConfigError::Missing("WEBHOOK_URL"))
            }
            Backend::Llm => {
                required("LLM_API_KEY")?;
            }
            _ => {}
        }

        Ok(Self {
            addr,
            database_url: required("DATABASE_URL")?,
            bridge_url: required("BRIDGE_URL")?,
            bridge_session: var("BRIDGE_SESSION"),
            client_id: required("BOT_CLIENT_ID")?,
            tenant_id: parse_or(var("TENANT_ID"), "TENANT_ID", 1)?,
            operator_number: var("OPERATOR_NUMBER"),
            backend,
            webhook_url,
            backend_timeout: Duration::from_secs(parse_or(
                var("BACKEND_TIMEOUT_SECS"),
                "BACKEND_TIMEOUT_SECS",
                60,
            )?),
            history_limit: parse_or(var("HISTORY_LIMIT"), "HISTORY_LIMIT", 10)?,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
