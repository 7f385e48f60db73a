//! Web API client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::DEFAULT_API_VERSION;
use crate::error::Result;
use crate::http::RetryConfig;

/// Connection settings for [`WebApiClient`](super::WebApiClient).
///
/// Loadable from TOML:
///
/// ```toml
/// org_url = "https://org.crm.dynamics.com"
/// access_token = "eyJ0eXAi..."
/// timeout_secs = 60
/// rate_limit_per_second = 20
///
/// [retry]
/// max_retries = 2
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebApiConfig {
    /// Organization URL, without the `/api/data` suffix.
    pub org_url: String,
    /// API version segment.
    pub api_version: String,
    /// Bearer token sent with every request.
    pub access_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry policy. Retries are off unless configured.
    pub retry: RetryConfig,
    /// Optional client-side request rate limit.
    pub rate_limit_per_second: Option<u32>,
}

impl Default for WebApiConfig {
    fn default() -> Self {
        Self {
            org_url: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: None,
            timeout_secs: 30,
            retry: RetryConfig::disabled(),
            rate_limit_per_second: None,
        }
    }
}

impl WebApiConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Parse configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
