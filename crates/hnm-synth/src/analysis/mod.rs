//! Pitch, voicing, and HNM frame analysis of raw PCM.
//!
//! [`PitchVoicingAnalyzer`] produces per-frame F0, voicing decisions and
//! maximum voicing frequencies. [`FrameBuilder`] turns those into a full
//! [`hnm_model::SpeechSignal`] with harmonic amplitudes and LPC noise.

mod builder;
pub mod pitch;
mod refine;
pub mod voicing;

pub use builder::FrameBuilder;
pub use pitch::{estimate_initial_pitch, PitchCandidate, PitchContour};
pub use refine::refine_frame_pitch;
pub use voicing::{analyze_voicings, estimate_frame_voicing, FrameVoicing};

use tracing::debug;

use hnm_model::{validate_analyzer_params, AnalyzerParams, VOICING_F0_FLOOR_HZ};

use crate::dsp::filter::median_filter;
use crate::dsp::time_to_sample;
use crate::error::{SynthError, SynthResult};

/// Frame layout shared by pitch and voicing analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    /// Window length in samples.
    pub window_len: usize,
    /// Hop between frames in samples.
    pub skip_len: usize,
    /// Number of frames covering the signal.
    pub num_frames: usize,
}

impl Framing {
    /// Periods of the shortest candidate pitch that must fit in a window.
    pub const MIN_PERIODS_PER_WINDOW: usize = 3;

    /// Derives the framing for a signal of `num_samples` samples.
    pub fn new(num_samples: usize, sampling_rate: f64, params: &AnalyzerParams) -> Self {
        let p_min = (sampling_rate / params.f0_max_hz + 0.5).floor() as usize;
        let window_len = (time_to_sample(params.window_size_s, sampling_rate).max(2) as usize)
            .max(Self::MIN_PERIODS_PER_WINDOW * p_min);
        let skip_len = time_to_sample(params.skip_size_s, sampling_rate).max(1) as usize;
        let covered = num_samples as f64 - 0.5 * window_len as f64;
        let num_frames = ((covered / skip_len as f64 + 0.5).floor().max(0.0) as usize).max(1);
        Self {
            window_len,
            skip_len,
            num_frames,
        }
    }

    /// Center of frame `index` in seconds.
    pub fn center_time(&self, index: usize, sampling_rate: f64) -> f64 {
        (index * self.skip_len) as f64 / sampling_rate + 0.5 * self.window_len as f64 / sampling_rate
    }

    /// Samples of frame `index`, zero-padded past the end of the signal.
    pub fn frame(&self, samples: &[f64], index: usize) -> Vec<f64> {
        let start = index * self.skip_len;
        let mut frame = vec![0.0; self.window_len];
        if start < samples.len() {
            let end = (start + self.window_len).min(samples.len());
            frame[..end - start].copy_from_slice(&samples[start..end]);
        }
        frame
    }
}

/// Pitch and voicing analysis driven by one parameter bundle.
#[derive(Debug, Clone)]
pub struct PitchVoicingAnalyzer {
    params: AnalyzerParams,
}

impl PitchVoicingAnalyzer {
    /// Creates an analyzer after validating its parameters.
    pub fn new(params: AnalyzerParams) -> SynthResult<Self> {
        validate_analyzer_params(&params).into_result()?;
        Ok(Self { params })
    }

    /// Analysis parameters.
    pub fn params(&self) -> &AnalyzerParams {
        &self.params
    }

    /// Per-frame initial F0 estimates.
    pub fn estimate_initial_pitch(&self, samples: &[f64], sampling_rate: f64) -> SynthResult<PitchContour> {
        check_input(samples, sampling_rate)?;
        Ok(estimate_initial_pitch(samples, sampling_rate, &self.params))
    }

    /// Voicing flag and maximum voicing frequency per pitch frame.
    pub fn analyze_voicings(
        &self,
        samples: &[f64],
        sampling_rate: f64,
        contour: &PitchContour,
    ) -> SynthResult<Vec<FrameVoicing>> {
        check_input(samples, sampling_rate)?;
        Ok(analyze_voicings(samples, sampling_rate, contour, &self.params))
    }

    /// Full pipeline: initial pitch, voicing, optional smoothing of the
    /// maximum voicing frequency, and optional pitch refinement.
    pub fn analyze(&self, samples: &[f64], sampling_rate: f64) -> SynthResult<Vec<FrameVoicing>> {
        let contour = self.estimate_initial_pitch(samples, sampling_rate)?;
        let mut frames = self.analyze_voicings(samples, sampling_rate, &contour)?;

        if self.params.smooth_max_voicing_freq {
            smooth_max_voicing_freqs(&mut frames, sampling_rate, &self.params);
        }
        if self.params.refine_pitch {
            for frame in frames.iter_mut().filter(|f| f.is_voiced) {
                frame.f0_hz = refine_frame_pitch(frame.f0_hz, frame.max_voicing_freq_hz, &frame.peak_freqs_hz);
            }
        }

        debug!(
            frames = frames.len(),
            voiced = frames.iter().filter(|f| f.is_voiced).count(),
            "pitch and voicing analysis complete"
        );
        Ok(frames)
    }
}

fn check_input(samples: &[f64], sampling_rate: f64) -> SynthResult<()> {
    if samples.is_empty() {
        return Err(SynthError::invalid_input("cannot analyze an empty signal"));
    }
    if sampling_rate.is_nan() || sampling_rate <= 0.0 {
        return Err(SynthError::invalid_param(
            "sampling_rate",
            format!("must be positive, got {}", sampling_rate),
        ));
    }
    Ok(())
}

/// Median-smooths the maximum voicing frequency contour and re-applies the
/// harmonic-count constraints.
fn smooth_max_voicing_freqs(frames: &mut [FrameVoicing], sampling_rate: f64, params: &AnalyzerParams) {
    let mvfs: Vec<f64> = frames.iter().map(|f| f.max_voicing_freq_hz).collect();
    let smoothed = median_filter(&mvfs, params.mvf_median_filter_len);
    for (frame, mvf) in frames.iter_mut().zip(smoothed) {
        if frame.is_voiced && frame.f0_hz > VOICING_F0_FLOOR_HZ {
            frame.max_voicing_freq_hz = voicing::constrain_max_voicing_freq(mvf, frame.f0_hz, sampling_rate, params);
        }
    }
}
