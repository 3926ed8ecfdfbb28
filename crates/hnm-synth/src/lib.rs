//! HNM Speech Engine
//!
//! Analysis, prosody modification and resynthesis of speech under the
//! harmonic-plus-noise model.
//!
//! # Overview
//!
//! A [`hnm_model::SpeechSignal`] holds one frame per analysis instant: F0,
//! maximum voicing frequency, complex harmonic amplitudes and an aperiodic
//! noise model. This crate produces such signals from PCM, modifies their
//! timing and pitch, and turns them back into PCM:
//!
//! - **Analysis** - [`PitchVoicingAnalyzer`] estimates F0, voicing and the
//!   maximum voicing frequency; [`FrameBuilder`] adds harmonic amplitudes
//!   and LPC noise models
//! - **Modification** - [`ProsodyTimeWarper`] applies time- and pitch-scale
//!   curves while leaving transient regions untouched
//! - **Synthesis** - [`HarmonicSynthesizer`] renders phase-continuous
//!   harmonic tracks; [`LpcNoiseSynthesizer`] and [`WaveformNoiseSynthesizer`]
//!   render the aperiodic part; [`SignalCompositor`] sums everything, in one
//!   call or as a [`SynthesisStream`]
//!
//! # Determinism
//!
//! Synthesis is deterministic. The only randomness is LPC excitation noise,
//! drawn from PCG32 streams whose seeds are derived per frame via BLAKE3
//! hashing of the base seed.
//!
//! # Example
//!
//! ```
//! use hnm_model::{SpeechFrame, SpeechSignal, SynthesisParams};
//! use hnm_synth::SignalCompositor;
//! use num_complex::Complex64;
//!
//! let frames: Vec<SpeechFrame> = (1..=10)
//!     .map(|i| SpeechFrame::voiced(0.01 * i as f64, 120.0, vec![Complex64::new(0.2, 0.0); 8]))
//!     .collect();
//! let signal = SpeechSignal::new(16000, 0.11, frames);
//!
//! let compositor = SignalCompositor::new(SynthesisParams::default()).unwrap();
//! let out = compositor.synthesize(&signal).unwrap();
//! assert_eq!(out.len(), signal.output_len());
//! ```
//!
//! # Crate Structure
//!
//! - [`analysis`] - Pitch, voicing, and frame building
//! - [`cepstrum`] - Regularized cepstral envelopes
//! - [`compositor`] - Batch and streaming composition
//! - [`dsp`] - Windows, spectra, filters, LPC
//! - [`modification`] - Time and pitch scaling
//! - [`rng`] - Deterministic RNG with seed derivation
//! - [`synthesis`] - Harmonic, noise, and transient synthesis

pub mod analysis;
pub mod cepstrum;
pub mod compositor;
pub mod dsp;
pub mod error;
pub mod modification;
pub mod rng;
pub mod synthesis;

#[cfg(test)]
mod test_signals;

pub use analysis::{FrameBuilder, PitchVoicingAnalyzer};
pub use cepstrum::RegularizedCepstrum;
pub use compositor::{SignalCompositor, StreamState, SynthesisStream, SynthesizedSignal};
pub use error::{SynthError, SynthResult};
pub use modification::ProsodyTimeWarper;
pub use synthesis::{
    HarmonicSynthesizer, LpcNoiseSynthesizer, NoiseSynthesizer, WaveformNoiseSynthesizer,
};
