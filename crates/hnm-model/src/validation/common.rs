//! Range checks shared by signal, modification, and parameter validation.

use std::fmt;

/// Error type for common validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonValidationError {
    /// Human-readable error message.
    pub message: String,
}

impl CommonValidationError {
    /// Creates a new validation error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommonValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommonValidationError {}

/// Validate that a value is finite and strictly positive.
///
/// # Example
/// ```
/// use hnm_model::validation::common::validate_positive;
///
/// assert!(validate_positive("window_size_s", 0.04).is_ok());
/// assert!(validate_positive("window_size_s", 0.0).is_err());
/// ```
pub fn validate_positive(name: &str, value: f64) -> Result<(), CommonValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CommonValidationError::new(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate that a value is finite and non-negative.
pub fn validate_non_negative(name: &str, value: f64) -> Result<(), CommonValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CommonValidationError::new(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate that a value is in [0, 1].
///
/// # Example
/// ```
/// use hnm_model::validation::common::validate_unit_interval;
///
/// assert!(validate_unit_interval("noise_envelope_start", 0.15).is_ok());
/// assert!(validate_unit_interval("noise_envelope_start", 1.5).is_err());
/// ```
pub fn validate_unit_interval(name: &str, value: f64) -> Result<(), CommonValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CommonValidationError::new(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate that a value is in [min, max].
pub fn validate_range(
    name: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), CommonValidationError> {
    if !(min..=max).contains(&value) {
        return Err(CommonValidationError::new(format!(
            "{} must be in [{}, {}], got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Validate that a sequence is strictly increasing, returning the first offending index.
pub fn validate_strictly_increasing(
    name: &str,
    values: &[f64],
) -> Result<(), (usize, CommonValidationError)> {
    for (i, pair) in values.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err((
                i + 1,
                CommonValidationError::new(format!(
                    "{} must be strictly increasing: {} follows {}",
                    name, pair[1], pair[0]
                )),
            ));
        }
    }
    Ok(())
}
