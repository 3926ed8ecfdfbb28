//! HNM speech model
//!
//! Data types for the harmonic-plus-noise representation of speech:
//! analysis frames, signals with optional transient segments, prosody
//! modification requests, and the parameter bundles that drive analysis
//! and synthesis.
//!
//! ## Example
//!
//! ```
//! use hnm_model::{SpeechFrame, SpeechSignal, validate_signal};
//! use num_complex::Complex64;
//!
//! let frames = vec![
//!     SpeechFrame::voiced(0.01, 120.0, vec![Complex64::new(0.3, 0.0); 10]),
//!     SpeechFrame::voiced(0.02, 122.0, vec![Complex64::new(0.3, 0.1); 10]),
//! ];
//! let signal = SpeechSignal::new(16000, 0.03, frames);
//! assert!(validate_signal(&signal).is_ok());
//! ```

pub mod error;
pub mod frame;
pub mod params;
pub mod prosody;
pub mod signal;
pub mod validation;

pub use error::{
    ErrorCode, ModelError, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
pub use frame::{NoiseModel, SpeechFrame, VOICING_F0_FLOOR_HZ};
pub use params::{AmplitudeSource, AnalyzerParams, CepstrumParams, CepstrumWarping, SynthesisParams};
pub use prosody::ProsodyModificationSpec;
pub use signal::{SpeechSignal, TransientSegment};
pub use validation::{
    validate_analyzer_params, validate_prosody, validate_signal, validate_synthesis_params,
};
