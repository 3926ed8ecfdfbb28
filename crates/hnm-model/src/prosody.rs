//! Time- and pitch-scale modification requests.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::validation::validate_prosody;

/// Piecewise-linear scale control curves over the analysis time axis.
///
/// Each curve is a list of factors with matching control times. A curve with
/// a single factor and no times is a constant; an empty curve is neutral (1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProsodyModificationSpec {
    /// Time-scale factors (>1 lengthens).
    #[serde(default)]
    pub time_scale_factors: Vec<f64>,
    /// Analysis times of the time-scale factors.
    #[serde(default)]
    pub time_scale_times: Vec<f64>,
    /// Pitch-scale factors (>1 raises F0).
    #[serde(default)]
    pub pitch_scale_factors: Vec<f64>,
    /// Analysis times of the pitch-scale factors.
    #[serde(default)]
    pub pitch_scale_times: Vec<f64>,
}

impl ProsodyModificationSpec {
    /// No modification.
    pub fn identity() -> Self {
        Self::constant(1.0, 1.0)
    }

    /// Constant time and pitch scaling over the whole signal.
    pub fn constant(time_scale: f64, pitch_scale: f64) -> Self {
        Self {
            time_scale_factors: vec![time_scale],
            time_scale_times: Vec::new(),
            pitch_scale_factors: vec![pitch_scale],
            pitch_scale_times: Vec::new(),
        }
    }

    /// Time-varying time scale, constant pitch.
    pub fn time_curve(factors: Vec<f64>, times: Vec<f64>) -> Self {
        Self {
            time_scale_factors: factors,
            time_scale_times: times,
            pitch_scale_factors: vec![1.0],
            pitch_scale_times: Vec::new(),
        }
    }

    /// Time-varying pitch scale, constant time.
    pub fn pitch_curve(factors: Vec<f64>, times: Vec<f64>) -> Self {
        Self {
            time_scale_factors: vec![1.0],
            time_scale_times: Vec::new(),
            pitch_scale_factors: factors,
            pitch_scale_times: times,
        }
    }

    /// Returns true if every factor equals 1.0.
    pub fn is_identity(&self) -> bool {
        self.time_scale_factors
            .iter()
            .chain(self.pitch_scale_factors.iter())
            .all(|&f| (f - 1.0).abs() < 1e-10)
    }

    /// Validates the request, failing on the first batch of contract violations.
    pub fn check(&self) -> Result<(), ModelError> {
        validate_prosody(self).into_result().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_identity() {
        assert!(ProsodyModificationSpec::identity().is_identity());
        assert!(ProsodyModificationSpec::default().is_identity());
        assert!(!ProsodyModificationSpec::constant(2.0, 1.0).is_identity());
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let spec = ProsodyModificationSpec::time_curve(vec![1.0, 2.0], vec![0.1]);
        let err = spec.check().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MismatchedControlArrays));
    }

    #[test]
    fn test_non_positive_factor_fails() {
        let spec = ProsodyModificationSpec::constant(1.0, 0.0);
        let err = spec.check().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidScaleFactor));
    }
}
