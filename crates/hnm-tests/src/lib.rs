//! HNM End-to-End Test Infrastructure
//!
//! This crate hosts integration tests for the analysis, modification and
//! synthesis flows:
//!
//! - Resynthesis: PCM -> frames -> PCM
//! - Modification: time and pitch scaling, transient preservation
//! - **Determinism**: identical PCM hashes across runs and across batch and
//!   streaming synthesis
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hnm-tests
//! ```
//!
//! ## Determinism Testing
//!
//! ```rust,ignore
//! use hnm_tests::determinism::verify_determinism;
//!
//! let result = verify_determinism(|| compositor.synthesize(&signal).unwrap().output, 3);
//! result.assert_deterministic();
//! ```

pub mod determinism;
pub mod fixtures;
pub mod signal_analysis;

pub use determinism::{pcm_hash, verify_determinism, DeterminismResult};
pub use signal_analysis::{correlation, is_silent, peak_amplitude, rms, snr_db};
