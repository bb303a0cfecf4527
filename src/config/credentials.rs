//! API Credential Management
//!
//! Handling of the Keepa API key loaded from environment variables.
//! The key is never logged in full and is masked when displayed.

use std::fmt;

/// Secure string wrapper that masks sensitive data in logs
///
/// Wraps the API key so it is never accidentally exposed in logs or error
/// messages. Debug output shows only `SecretString(***)` and Display shows
/// the truncated form `first4...last4`.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: String) -> Self {
        SecretString(value)
    }

    /// Returns a reference to the inner string
    ///
    /// Only use this when actually building the request query; never log
    /// or display the returned value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns a masked version of the secret for safe logging
    ///
    /// Format: `first4...last4` (e.g., "abcd...wxyz")
    pub fn masked(&self) -> String {
        let s = &self.0;
        if s.len() <= 8 {
            return "***".to_string();
        }
        format!("{}...{}", &s[..4], &s[s.len() - 4..])
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(***)")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        SecretString::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        SecretString::new(s.to_string())
    }
}

/// Keepa API credentials loaded from environment variables
#[derive(Clone, Debug)]
pub struct Credentials {
    /// Keepa API key (sent as the `key` query parameter on every call)
    pub api_key: SecretString,
}

impl Credentials {
    /// Loads credentials from the environment
    ///
    /// Reads `KEEPA_API_KEY`, trims whitespace and validates non-empty.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("KEEPA_API_KEY")
            .map_err(|_| "KEEPA_API_KEY not set".to_string())?;

        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err("KEEPA_API_KEY is empty after trimming whitespace".to_string());
        }

        Ok(Self {
            api_key: SecretString::new(api_key),
        })
    }
}
