//! Error types surfaced by the advisor core
//!
//! Only request-level problems become errors. Provider outages and
//! per-strategy failures are recovered inside the engines.

use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    /// The request itself cannot be served as given
    #[error("invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("no candidates to rank")]
    NoCandidates,

    /// A mandatory data source failed
    #[error("{provider} provider failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("deadline exceeded with {completed} of {total} candidates enhanced")]
    DeadlineExceeded { completed: usize, total: usize },
}

impl AdvisorError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AdvisorError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn provider(provider: &'static str, err: impl Display) -> Self {
        AdvisorError::Provider {
            provider,
            message: err.to_string(),
        }
    }

    /// True when the caller supplied bad input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AdvisorError::InvalidInput { .. } | AdvisorError::NoCandidates
        )
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AdvisorError::invalid("weights", "at least one weight must be positive");
        assert_eq!(
            err.to_string(),
            "invalid weights: at least one weight must be positive"
        );
        assert!(err.is_input_error());

        let err = AdvisorError::provider("spot_data", anyhow::anyhow!("connection reset"));
        assert_eq!(err.to_string(), "spot_data provider failed: connection reset");
        assert!(!err.is_input_error());

        let err = AdvisorError::DeadlineExceeded {
            completed: 0,
            total: 12,
        };
        assert!(err.to_string().contains("0 of 12"));
    }
}
