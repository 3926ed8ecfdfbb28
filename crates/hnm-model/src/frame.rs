//! Analysis frame types: one frame per analysis instant.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// F0 values at or below this are treated as unvoiced by modification and synthesis.
pub const VOICING_F0_FLOOR_HZ: f64 = 10.0;

/// Aperiodic part of a frame.
///
/// LPC coefficients follow the predictor convention: `x[n] ≈ Σ coeffs[k-1]·x[n-k]`,
/// so the synthesis filter is `y[n] = gain·e[n] + Σ coeffs[k-1]·y[n-k]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoiseModel {
    /// No aperiodic component (fully harmonic frame, or silence).
    #[default]
    None,
    /// All-pole model of the noise spectrum plus the noise level it was fitted to.
    Lpc {
        /// Predictor coefficients a1..ap.
        coeffs: Vec<f64>,
        /// Prediction error gain.
        gain: f64,
        /// Standard deviation of the analysed noise segment.
        original_std: f64,
    },
    /// Raw captured noise, spliced back during synthesis.
    Waveform {
        /// Noise samples centered on the analysis instant.
        samples: Vec<f64>,
        /// Samples immediately preceding `samples`.
        #[serde(default)]
        left_context: Vec<f64>,
        /// Samples immediately following `samples`.
        #[serde(default)]
        right_context: Vec<f64>,
    },
}

impl NoiseModel {
    /// Returns true unless the variant is `None`.
    pub fn is_present(&self) -> bool {
        !matches!(self, NoiseModel::None)
    }

    /// Returns true for the LPC variant.
    pub fn is_lpc(&self) -> bool {
        matches!(self, NoiseModel::Lpc { .. })
    }

    /// Returns true for the waveform variant.
    pub fn is_waveform(&self) -> bool {
        matches!(self, NoiseModel::Waveform { .. })
    }
}

/// A single HNM analysis frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechFrame {
    /// Analysis instant in seconds.
    pub t_analysis: f64,
    /// Fundamental frequency in Hz (0 for unvoiced).
    #[serde(default)]
    pub f0_hz: f64,
    /// Frequency up to which harmonic structure is modelled.
    #[serde(default)]
    pub max_voicing_freq_hz: f64,
    /// Complex amplitudes of harmonics 1..=K. Empty for unvoiced frames.
    #[serde(default)]
    pub harmonics: Vec<Complex64>,
    /// Aperiodic component.
    #[serde(default)]
    pub noise: NoiseModel,
    /// Frame lies inside a transient segment.
    #[serde(default)]
    pub is_transient: bool,
}

impl SpeechFrame {
    /// Creates an unvoiced frame with no noise model at the given instant.
    pub fn unvoiced(t_analysis: f64) -> Self {
        Self {
            t_analysis,
            f0_hz: 0.0,
            max_voicing_freq_hz: 0.0,
            harmonics: Vec::new(),
            noise: NoiseModel::None,
            is_transient: false,
        }
    }

    /// Creates a voiced frame with the given harmonic amplitudes.
    pub fn voiced(t_analysis: f64, f0_hz: f64, harmonics: Vec<Complex64>) -> Self {
        let max_voicing_freq_hz = f0_hz * (harmonics.len() as f64 + 0.5);
        Self {
            t_analysis,
            f0_hz,
            max_voicing_freq_hz,
            harmonics,
            noise: NoiseModel::None,
            is_transient: false,
        }
    }

    /// Sets the noise model, builder style.
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }

    /// Voiced means a usable F0 and at least one harmonic amplitude.
    pub fn is_voiced(&self) -> bool {
        self.f0_hz > VOICING_F0_FLOOR_HZ && !self.harmonics.is_empty()
    }

    /// Number of modelled harmonics.
    pub fn num_harmonics(&self) -> usize {
        self.harmonics.len()
    }

    /// Harmonic magnitudes in harmonic order.
    pub fn harmonic_magnitudes(&self) -> Vec<f64> {
        self.harmonics.iter().map(|c| c.norm()).collect()
    }

    /// Whether this frame contributes to the aperiodic part.
    ///
    /// A frame is noised when its voicing cutoff leaves some band below
    /// Nyquist and it carries a noise model.
    pub fn is_noised(&self, sampling_rate_hz: f64) -> bool {
        self.noise.is_present() && self.max_voicing_freq_hz < 0.5 * sampling_rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_voicing_requires_f0_and_harmonics() {
        assert!(!SpeechFrame::unvoiced(0.1).is_voiced());
        assert!(SpeechFrame::voiced(0.1, 120.0, vec![Complex64::new(1.0, 0.0)]).is_voiced());
        assert!(!SpeechFrame::voiced(0.1, 120.0, Vec::new()).is_voiced());
        assert!(!SpeechFrame::voiced(0.1, 5.0, vec![Complex64::new(1.0, 0.0)]).is_voiced());
    }

    #[test]
    fn test_noised_depends_on_mvf() {
        let lpc = NoiseModel::Lpc {
            coeffs: vec![0.5],
            gain: 1.0,
            original_std: 0.1,
        };
        let mut frame = SpeechFrame::unvoiced(0.0).with_noise(lpc);
        assert!(frame.is_noised(16000.0));
        frame.max_voicing_freq_hz = 8000.0;
        assert!(!frame.is_noised(16000.0));
        assert!(!SpeechFrame::unvoiced(0.0).is_noised(16000.0));
    }

    #[test]
    fn test_noise_model_tagged_json() {
        let noise = NoiseModel::Waveform {
            samples: vec![0.1, -0.1],
            left_context: vec![],
            right_context: vec![0.05],
        };
        let json = serde_json::to_value(&noise).unwrap();
        assert_eq!(json["type"], "waveform");
        let back: NoiseModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, noise);

        let none: NoiseModel = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert_eq!(none, NoiseModel::None);
    }
}
