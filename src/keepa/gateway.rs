//! Rate-limited request gateway
//!
//! Every upstream call goes through one [`RequestGateway`]: it enforces the
//! configured minimum delay between consecutive calls and classifies error
//! payloads (token exhaustion vs. generic upstream failure). It never
//! retries and never caches responses.

use std::time::Instant;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{KeepaConfig, SecretString};
use crate::error::KeepaError;

const USER_AGENT: &str = concat!("keepa-analytics/", env!("CARGO_PKG_VERSION"));

/// Single chokepoint for Keepa API requests
///
/// The `last_call` timestamp is the only shared mutable state in the crate.
/// The lock is held across the throttle sleep, so concurrent callers
/// serialize and no two upstream calls ever start closer together than the
/// configured delay.
pub struct RequestGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    min_delay: std::time::Duration,
    last_call: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("min_delay", &self.min_delay)
            .finish()
    }
}

impl RequestGateway {
    pub fn new(config: &KeepaConfig) -> Result<Self, KeepaError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(KeepaError::from)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            min_delay: config.rate_limit_delay,
            last_call: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a GET request against the given endpoint
    ///
    /// The API key is appended to the caller's parameters. Returns the raw
    /// JSON body on success; failures are classified into the
    /// [`KeepaError`] taxonomy.
    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Value, KeepaError> {
        self.throttle().await;

        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, params = params.len(), "issuing Keepa request");

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .query(params)
            .send()
            .await
            .map_err(KeepaError::from)?;

        let status = response.status();
        if !status.is_success() {
            let payload = response.json::<Value>().await.ok();
            return Err(classify_failure(status.as_u16(), payload));
        }

        let body: Value = response.json().await.map_err(KeepaError::from)?;
        if let Some(tokens) = body.get("tokensLeft").and_then(Value::as_i64) {
            debug!(tokens_left = tokens, endpoint, "Keepa request completed");
        }
        Ok(body)
    }

    /// Suspends the caller until the minimum inter-call delay has elapsed,
    /// then records the new last-call time.
    async fn throttle(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

/// Classifies a non-success response payload
///
/// A token budget at or below zero wins over everything else; otherwise the
/// upstream `error` field is surfaced (stringified when structured), and a
/// missing payload falls back to a generic message.
fn classify_failure(status: u16, payload: Option<Value>) -> KeepaError {
    let Some(body) = payload else {
        return KeepaError::Upstream {
            message: format!("API request failed with HTTP {status}"),
            status: Some(status),
        };
    };

    if let Some(tokens_left) = body.get("tokensLeft").and_then(Value::as_i64) {
        if tokens_left <= 0 {
            return KeepaError::TokenExhausted { tokens_left };
        }
    }

    let message = match body.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(value) if !value.is_null() => {
            serde_json::to_string(value).unwrap_or_else(|_| "API request failed".to_string())
        }
        _ => "API request failed".to_string(),
    };

    KeepaError::Upstream {
        message,
        status: Some(status),
    }
}
