//! Error types for analysis, modification, and synthesis.

use hnm_model::ModelError;
use thiserror::Error;

/// Result type for HNM engine operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors that can occur during analysis, modification, or synthesis.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Input signal or modification request violates its contract.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Raw input audio is unusable.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Streaming synthesis was driven past its last frame.
    #[error("no analysis frame left to synthesize (frame {index} of {total})")]
    StreamExhausted {
        /// Index that was requested.
        index: usize,
        /// Total number of frames.
        total: usize,
    },

    /// Internal numeric failure.
    #[error("synthesis error: {message}")]
    Synthesis {
        /// Error message.
        message: String,
    },
}

impl SynthError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a synthesis error.
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }

    /// Stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            SynthError::Model(_) => "HNM_001",
            SynthError::InvalidInput { .. } => "HNM_002",
            SynthError::InvalidParameter { .. } => "HNM_003",
            SynthError::StreamExhausted { .. } => "HNM_004",
            SynthError::Synthesis { .. } => "HNM_005",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnm_model::{ErrorCode, ValidationError};

    #[test]
    fn test_invalid_param_helper() {
        let err = SynthError::invalid_param("f0_min_hz", "must be positive");
        assert!(err.to_string().contains("f0_min_hz"));
        assert!(err.to_string().contains("must be positive"));
        assert_eq!(err.code(), "HNM_003");
    }

    #[test]
    fn test_model_error_is_transparent() {
        let model = ModelError::Validation(vec![ValidationError::new(
            ErrorCode::MismatchedControlArrays,
            "time_scale factors (2) and times (1) differ in length",
        )]);
        let err: SynthError = model.into();
        assert_eq!(err.code(), "HNM_001");
        assert!(err.to_string().contains("E010"));
    }
}
