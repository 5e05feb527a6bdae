//! Error type shared by the fetch and shaping layers.
//!
//! Every variant renders as the message shown to the dashboard user, so the
//! handlers only ever need `err.to_string()`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("Zero Holding of {contract} #{token_id}")]
    ZeroHolding { contract: String, token_id: u64 },
    #[error("Upstream Request Failed: {message}")]
    Upstream { url: String, message: String },
    #[error("Malformed Upstream Response: {message}")]
    Decode { url: String, message: String },
    #[error("HTTP client build error: {0}")]
    HttpClientBuild(String),
    #[error("Request Worker Failed: {0}")]
    Worker(String),
}

impl AppError {
    pub fn not_found(noun: &str) -> Self {
        Self::NotFound(format!("Non-existent {noun}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            AppError::not_found("Creation").to_string(),
            "Non-existent Creation"
        );
        let err = AppError::Upstream {
            url: "https://api.akaswap.com/v2/gachas".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream Request Failed: connection refused");
    }
}
