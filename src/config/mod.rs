//! Configuration Management
//!
//! This module handles client configuration including API credentials,
//! base URL, request timeout and the rate-limiter delay.

pub mod credentials;

pub use credentials::{Credentials, SecretString};

use std::time::Duration;

/// Default Keepa API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.keepa.com";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default minimum delay between two upstream calls
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(1000);

/// Client configuration for the Keepa API
#[derive(Clone, Debug)]
pub struct KeepaConfig {
    /// API key sent with every request
    pub api_key: SecretString,
    /// Base URL for the Keepa API (default: <https://api.keepa.com>)
    pub base_url: String,
    /// Per-request timeout bounding each individual upstream call
    pub timeout: Duration,
    /// Minimum delay enforced between consecutive upstream calls
    pub rate_limit_delay: Duration,
}

impl KeepaConfig {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }

    /// Loads the API key from `KEEPA_API_KEY` with default settings
    pub fn from_env() -> Result<Self, String> {
        let credentials = Credentials::from_env()?;
        Ok(Self::new(credentials.api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }
}

impl From<SecretString> for KeepaConfig {
    fn from(api_key: SecretString) -> Self {
        Self::new(api_key)
    }
}
