use thiserror::Error;

/// Main error type for the Keepa analytics client
///
/// Logical not-found is never an error: single product lookups return
/// `Option` and list operations return (possibly empty) vectors.
#[derive(Error, Debug)]
pub enum KeepaError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "Keepa token budget exhausted: {tokens_left} tokens remaining. \
         Wait for tokens to refresh or upgrade the Keepa plan."
    )]
    TokenExhausted { tokens_left: i64 },

    #[error("Keepa API error: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
    },

    #[error("Response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl KeepaError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, KeepaError::Upstream { status, .. } if matches!(status, Some(s) if *s >= 500))
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            KeepaError::InvalidArgument(_) => "invalid_argument",
            KeepaError::TokenExhausted { .. } => "token_exhausted",
            KeepaError::Upstream { .. } => "upstream_error",
            KeepaError::Parse(_) => "parse_error",
        }
    }
}

impl From<reqwest::Error> for KeepaError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            "Request timeout while contacting the Keepa API".to_string()
        } else if err.is_connect() {
            "Failed to connect to the Keepa API".to_string()
        } else if err.is_decode() {
            format!("Invalid response body from the Keepa API: {err}")
        } else {
            err.to_string()
        };
        KeepaError::Upstream { message, status }
    }
}

pub type Result<T> = std::result::Result<T, KeepaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_exhausted_message_carries_remaining_count() {
        let err = KeepaError::TokenExhausted { tokens_left: 0 };
        assert!(err.to_string().contains("0 tokens remaining"));
        assert_eq!(err.error_type(), "token_exhausted");
    }

    #[test]
    fn test_retryable_classification() {
        let server = KeepaError::Upstream {
            message: "internal".into(),
            status: Some(503),
        };
        let client = KeepaError::Upstream {
            message: "bad selection".into(),
            status: Some(400),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!KeepaError::InvalidArgument("x".into()).is_retryable());
    }
}
