//! Analysis and synthesis parameter bundles.
//!
//! All tunables live here and are passed explicitly into analysis and
//! synthesis calls. Every field has a default, so partial JSON documents
//! deserialize into a fully populated bundle.

use serde::{Deserialize, Serialize};

use crate::error::ValidationResult;
use crate::validation::{validate_analyzer_params, validate_synthesis_params};

/// Frequency warping applied when fitting a regularized cepstrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CepstrumWarping {
    /// Fit on the linear frequency axis.
    None,
    /// Map harmonic frequencies onto the Bark scale before fitting.
    PreBark,
    /// Fit linearly, then refit on a uniform Mel grid.
    #[default]
    PostMel,
}

/// Source of per-harmonic amplitudes during harmonic synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeSource {
    /// Magnitude of the stored complex amplitude.
    #[default]
    Direct,
    /// Regularized cepstral envelope evaluated at `k·f0`.
    Cepstrum,
}

/// Regularized cepstrum fitting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CepstrumParams {
    /// Number of cepstral coefficients beyond c0.
    pub order: usize,
    /// Regularization weight on spectral-envelope roughness.
    pub lambda: f64,
    /// Frequency warping.
    pub warping: CepstrumWarping,
}

impl Default for CepstrumParams {
    fn default() -> Self {
        Self {
            order: Self::DEFAULT_ORDER,
            lambda: Self::DEFAULT_LAMBDA,
            warping: CepstrumWarping::PostMel,
        }
    }
}

impl CepstrumParams {
    /// Default cepstrum order.
    pub const DEFAULT_ORDER: usize = 24;

    /// Default regularization weight.
    pub const DEFAULT_LAMBDA: f64 = 5.0e-4;
}

/// Pitch, voicing, and frame-building parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerParams {
    /// Analysis window length in seconds.
    pub window_size_s: f64,
    /// Hop between analysis frames in seconds.
    pub skip_size_s: f64,
    /// Lowest F0 searched.
    pub f0_min_hz: f64,
    /// Highest F0 searched.
    pub f0_max_hz: f64,
    /// Periodicity error above which a period is not a pitch candidate.
    pub max_period_error: f64,
    /// Neighbours on each side a local minimum of the period error must beat.
    pub candidate_neighbours: usize,
    /// Frames on each side jointly searched to suppress octave errors.
    pub search_radius: usize,

    /// Harmonics spanned by the voicing-ratio band.
    pub num_harmonics_for_voicing: usize,
    /// Band widening around the voicing-ratio band, as a fraction of f0.
    pub voicing_band_epsilon: f64,
    /// Voiced iff the peak/valley ratio exceeds this.
    pub voicing_threshold_db: f64,
    /// Max deviation of a harmonic peak from `k·f0`, in percent of f0.
    pub harmonic_deviation_percent: f64,
    /// Cumulative amplitude ratio test threshold.
    pub cumulative_amp_threshold: f64,
    /// Single-neighbour amplitude test threshold.
    pub maximum_amp_threshold_db: f64,
    /// Isolated sharp peak test threshold above the band median.
    pub sharp_peak_amp_diff_db: f64,
    /// Lower clamp of the max voicing frequency, in harmonics.
    pub min_harmonics_for_mvf: usize,
    /// Upper clamp of the max voicing frequency, in harmonics.
    pub max_harmonics_for_mvf: usize,
    /// Median filter length over per-band voicing decisions.
    pub voicing_median_filter_len: usize,
    /// Median-smooth max voicing frequency across voiced frames.
    pub smooth_max_voicing_freq: bool,
    /// Median filter length for max voicing frequency smoothing.
    pub mvf_median_filter_len: usize,

    /// Refine F0 by matching spectral peaks to a harmonic comb.
    pub refine_pitch: bool,
    /// Pitch periods spanned by the harmonic amplitude estimation window.
    pub harmonic_extraction_periods: f64,
    /// LPC order for noise modelling; derived from the sampling rate when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lpc_order: Option<usize>,
    /// Noise analysis window length in seconds.
    pub noise_window_s: f64,
    /// Spectral envelope fitting.
    pub cepstrum: CepstrumParams,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            window_size_s: 0.040,
            skip_size_s: 0.010,
            f0_min_hz: 60.0,
            f0_max_hz: 500.0,
            max_period_error: 0.5,
            candidate_neighbours: 2,
            search_radius: 0,
            num_harmonics_for_voicing: 4,
            voicing_band_epsilon: 0.3,
            voicing_threshold_db: 6.0,
            harmonic_deviation_percent: 20.0,
            cumulative_amp_threshold: 2.0,
            maximum_amp_threshold_db: 13.0,
            sharp_peak_amp_diff_db: 1.0,
            min_harmonics_for_mvf: 20,
            max_harmonics_for_mvf: 50,
            voicing_median_filter_len: 3,
            smooth_max_voicing_freq: false,
            mvf_median_filter_len: 5,
            refine_pitch: true,
            harmonic_extraction_periods: 3.0,
            lpc_order: None,
            noise_window_s: 0.040,
            cepstrum: CepstrumParams::default(),
        }
    }
}

impl AnalyzerParams {
    /// LPC order: explicit, or `fs/1000 + 2`.
    pub fn lpc_order_for(&self, sampling_rate_hz: f64) -> usize {
        self.lpc_order
            .unwrap_or_else(|| (sampling_rate_hz / 1000.0) as usize + 2)
    }

    /// Checks ranges and cross-field consistency.
    pub fn validate(&self) -> ValidationResult {
        validate_analyzer_params(self)
    }
}

/// Harmonic, noise, and streaming synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthesisParams {
    /// Harmonic amplitude model.
    pub amplitude_source: AmplitudeSource,
    /// Envelope fitting for `AmplitudeSource::Cepstrum` and pitch-scale resampling.
    pub cepstrum: CepstrumParams,
    /// Hamming-weight each harmonic segment over an extended span and normalize.
    pub overlapping_harmonic_synthesis: bool,
    /// Extension of each harmonic segment on both sides, in seconds.
    pub harmonic_overlap_s: f64,
    /// Onset/offset ramp length of a harmonic track, in seconds.
    pub unvoiced_voiced_transition_s: f64,

    /// Minimum LPC noise window length in seconds.
    pub noise_window_s: f64,
    /// Window widening when entering or leaving a noised region, in seconds.
    pub noise_transition_overlap_s: f64,
    /// High-pass LPC noise above each frame's max voicing frequency.
    pub high_pass_noise: bool,
    /// Modulate voiced-region noise with a triangular envelope.
    pub triangular_noise_envelope: bool,
    /// Relative position where the envelope starts rising.
    pub noise_envelope_start: f64,
    /// Relative position where the envelope has fallen back.
    pub noise_envelope_end: f64,
    /// Envelope value outside the triangle.
    pub noise_envelope_floor: f64,
    /// Preemphasis coefficient applied to the noise before LPC analysis.
    pub noise_preemphasis: f64,

    /// Frames of lookahead before the streaming synthesizer emits samples.
    ///
    /// Released samples also stay clear of the onset ramp and overlap of
    /// frames not yet processed, so any value streams the batch output.
    pub frames_to_accumulate: usize,
    /// Base seed for LPC excitation noise.
    pub noise_seed: u32,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            amplitude_source: AmplitudeSource::Direct,
            cepstrum: CepstrumParams::default(),
            overlapping_harmonic_synthesis: false,
            harmonic_overlap_s: 0.005,
            unvoiced_voiced_transition_s: 0.002,
            noise_window_s: 0.060,
            noise_transition_overlap_s: 0.010,
            high_pass_noise: true,
            triangular_noise_envelope: false,
            noise_envelope_start: 0.15,
            noise_envelope_end: 0.85,
            noise_envelope_floor: 0.2,
            noise_preemphasis: 0.0,
            frames_to_accumulate: Self::DEFAULT_FRAMES_TO_ACCUMULATE,
            noise_seed: 0,
        }
    }
}

impl SynthesisParams {
    /// Default streaming lookahead in frames.
    pub const DEFAULT_FRAMES_TO_ACCUMULATE: usize = 3;

    /// Checks ranges and cross-field consistency.
    pub fn validate(&self) -> ValidationResult {
        validate_synthesis_params(self)
    }
}
