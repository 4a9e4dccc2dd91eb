//! Gateway configuration.
//!
//! The base URL is resolved once when the gateway is built and never
//! re-read. `from_env` is the production entry point; `from_lookup` takes
//! any key lookup so tests don't have to touch the process environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "PORTAL_API_URL";
pub const TIMEOUT_VAR: &str = "PORTAL_API_TIMEOUT_SECS";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

fn default_user_agent() -> String {
    concat!("portal-gateway/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Handed to the transport's client only; the gateway enforces none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                var: TIMEOUT_VAR,
                value: raw.clone(),
            })?),
            None => None,
        };
        let config = Self {
            base_url,
            timeout_secs,
            user_agent: default_user_agent(),
        };
        config.resolved_base_url()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The base URL with trailing slashes removed, after checking it is an
    /// absolute `http`/`https` URL.
    pub fn resolved_base_url(&self) -> Result<String, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(trimmed.to_string()),
            other => Err(invalid(format!("unsupported scheme {other:?}"))),
        }
    }
}
