//! Error types for model validation and (de)serialization.

use thiserror::Error;

/// Error codes for input-contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Signal errors (E001-E009)
    /// E001: Signal has no frames or no samples
    EmptySignal,
    /// E002: Sampling rate is zero or negative
    InvalidSamplingRate,
    /// E003: Frame analysis times are not strictly increasing
    NonMonotonicFrameTimes,
    /// E004: Frame field out of range (negative f0, non-finite value)
    InvalidFrame,
    /// E005: Transient segment is malformed
    InvalidTransient,
    /// E006: Signal duration is not positive
    InvalidDuration,

    // Modification errors (E010-E012)
    /// E010: Scale factors and times differ in length
    MismatchedControlArrays,
    /// E011: Scale factor is zero, negative, or non-finite
    InvalidScaleFactor,

    // Parameter errors (E020-E021)
    /// E020: Analysis or synthesis parameter out of range
    InvalidParam,
    /// E021: Parameter combination is inconsistent (e.g. f0 min above f0 max)
    InconsistentParams,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::EmptySignal => "E001",
            ErrorCode::InvalidSamplingRate => "E002",
            ErrorCode::NonMonotonicFrameTimes => "E003",
            ErrorCode::InvalidFrame => "E004",
            ErrorCode::InvalidTransient => "E005",
            ErrorCode::InvalidDuration => "E006",
            ErrorCode::MismatchedControlArrays => "E010",
            ErrorCode::InvalidScaleFactor => "E011",
            ErrorCode::InvalidParam => "E020",
            ErrorCode::InconsistentParams => "E021",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for suspicious but accepted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Signal has fewer than two frames; synthesis yields silence
    TooFewFrames,
    /// W002: Voiced frame carries no harmonic amplitudes
    VoicedWithoutHarmonics,
    /// W003: Two control points share a timestamp
    CoincidentControlPoints,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::TooFewFrames => "W001",
            WarningCode::VoicedWithoutHarmonics => "W002",
            WarningCode::CoincidentControlPoints => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "frames\[3\].t_analysis").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a field path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Top-level error type for model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Validation failed with one or more errors.
    #[error("validation failed: {}", .0.first().map(|e| e.to_string()).unwrap_or_default())]
    Validation(Vec<ValidationError>),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ModelError {
    /// Returns the first validation error code, if this is a validation failure.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ModelError::Validation(errors) => errors.first().map(|e| e.code),
            ModelError::JsonParse(_) => None,
        }
    }
}

/// Result of model validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates an empty (successful) validation result.
    pub fn success() -> Self {
        Self::default()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merges another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts to a Result, returning `ModelError::Validation` if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ModelError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ModelError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ErrorCode::EmptySignal.code(), "E001");
        assert_eq!(ErrorCode::MismatchedControlArrays.code(), "E010");
        assert_eq!(ErrorCode::InvalidParam.to_string(), "E020");
        assert_eq!(WarningCode::TooFewFrames.code(), "W001");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(ErrorCode::InvalidSamplingRate, "must be positive");
        assert_eq!(err.to_string(), "E002: must be positive");

        let err = ValidationError::with_path(
            ErrorCode::NonMonotonicFrameTimes,
            "time decreases",
            "frames[2].t_analysis",
        );
        assert_eq!(
            err.to_string(),
            "E003: time decreases (at frames[2].t_analysis)"
        );
    }

    #[test]
    fn test_validation_result_into_result() {
        let mut result = ValidationResult::success();
        assert!(result.is_ok());
        result.add_warning(ValidationWarning::new(WarningCode::TooFewFrames, "one frame"));
        assert!(result.clone().into_result().is_ok());

        result.add_error(ValidationError::new(ErrorCode::EmptySignal, "no frames"));
        let err = result.into_result().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmptySignal));
        assert!(err.to_string().contains("E001"));
    }
}
