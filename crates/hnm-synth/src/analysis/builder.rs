//! HNM frame building: harmonic amplitudes and LPC noise per analysis frame.

use std::f64::consts::PI;

use num_complex::Complex64;
use tracing::{debug, trace};

use hnm_model::{
    validate_synthesis_params, AnalyzerParams, NoiseModel, SpeechFrame, SpeechSignal, SynthesisParams,
};

use super::{FrameVoicing, PitchVoicingAnalyzer};
use crate::dsp::filter::apply_preemphasis;
use crate::dsp::lpc::fit_lpc;
use crate::dsp::spectrum::fd_band_filter;
use crate::dsp::window::{hamming, normalize_sum};
use crate::dsp::{std_dev, time_to_sample};
use crate::error::{SynthError, SynthResult};
use crate::synthesis::HarmonicSynthesizer;

/// Builds a complete [`SpeechSignal`] from PCM.
///
/// Runs pitch and voicing analysis, projects each voiced frame onto its
/// harmonics, resynthesizes the harmonic part and fits an all-pole model to
/// the residual around every frame.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    analyzer: PitchVoicingAnalyzer,
    synth_params: SynthesisParams,
}

impl FrameBuilder {
    /// Creates a builder after validating both parameter bundles.
    pub fn new(analyzer_params: AnalyzerParams, synth_params: SynthesisParams) -> SynthResult<Self> {
        let analyzer = PitchVoicingAnalyzer::new(analyzer_params)?;
        validate_synthesis_params(&synth_params).into_result()?;
        Ok(Self {
            analyzer,
            synth_params,
        })
    }

    /// Analysis parameters.
    pub fn analyzer_params(&self) -> &AnalyzerParams {
        self.analyzer.params()
    }

    /// Synthesis parameters used for the residual.
    pub fn synth_params(&self) -> &SynthesisParams {
        &self.synth_params
    }

    /// Analyzes `samples` recorded at `sampling_rate_hz`.
    pub fn analyze(&self, samples: &[f64], sampling_rate_hz: u32) -> SynthResult<SpeechSignal> {
        if sampling_rate_hz == 0 {
            return Err(SynthError::invalid_param("sampling_rate_hz", "must be positive"));
        }
        let fs = sampling_rate_hz as f64;
        let voicings = self.analyzer.analyze(samples, fs)?;
        let params = self.analyzer.params();

        let frames: Vec<SpeechFrame> = voicings
            .iter()
            .map(|v| harmonic_frame(samples, fs, v, params))
            .collect();
        // inputs shorter than half a window still yield one frame at its center
        let last_t = frames.last().map_or(0.0, |f| f.t_analysis);
        let duration_s = (samples.len() as f64 / fs).max(last_t);
        let mut signal = SpeechSignal::new(sampling_rate_hz, duration_s, frames);

        let mut residual = samples.to_vec();
        if signal.len() >= 2 {
            let harmonic = HarmonicSynthesizer::new(signal.clone(), self.synth_params.clone()).synthesize_all();
            for (r, h) in residual.iter_mut().zip(&harmonic) {
                *r -= h;
            }
        }
        if self.synth_params.noise_preemphasis > 0.0 {
            residual = apply_preemphasis(&residual, self.synth_params.noise_preemphasis);
        }

        let order = params.lpc_order_for(fs);
        let window_len = odd_length(time_to_sample(params.noise_window_s, fs).max(1) as usize);
        for frame in signal.frames.iter_mut() {
            frame.noise = noise_model(&residual, fs, frame, window_len, order);
        }

        debug!(
            frames = signal.len(),
            voiced = signal.frames.iter().filter(|f| f.is_voiced()).count(),
            noised = signal.frames.iter().filter(|f| f.noise.is_present()).count(),
            "hnm frames built"
        );
        Ok(signal)
    }
}

fn odd_length(len: usize) -> usize {
    if len % 2 == 0 {
        len + 1
    } else {
        len
    }
}

/// Samples `center - half ..= center + half`, zero outside the signal.
fn centered_segment(x: &[f64], center: i64, half: usize) -> Vec<f64> {
    (-(half as i64)..=half as i64)
        .map(|offset| {
            let n = center + offset;
            if n < 0 || n >= x.len() as i64 {
                0.0
            } else {
                x[n as usize]
            }
        })
        .collect()
}

/// Voiced frames get complex amplitudes of harmonics `1..=floor(mvf/f0)`,
/// everything else an empty unvoiced frame.
fn harmonic_frame(samples: &[f64], fs: f64, voicing: &FrameVoicing, params: &AnalyzerParams) -> SpeechFrame {
    if !voicing.is_voiced {
        return SpeechFrame::unvoiced(voicing.time_s);
    }
    let f0 = voicing.f0_hz;
    let nyquist = 0.5 * fs;
    let mut count = (voicing.max_voicing_freq_hz / f0).floor() as usize;
    while count > 0 && count as f64 * f0 >= nyquist {
        count -= 1;
    }
    if count == 0 {
        return SpeechFrame::unvoiced(voicing.time_s);
    }

    let harmonics = estimate_harmonics(samples, fs, voicing.time_s, f0, count, params.harmonic_extraction_periods);
    trace!(t = voicing.time_s, f0, harmonics = count, "harmonic amplitudes estimated");
    SpeechFrame {
        t_analysis: voicing.time_s,
        f0_hz: f0,
        max_voicing_freq_hz: voicing.max_voicing_freq_hz,
        harmonics,
        noise: NoiseModel::None,
        is_transient: false,
    }
}

/// Windowed projection onto `k·f0` for `k = 1..=count`.
///
/// With a window summing to one, a harmonic `A·cos(2πkf0τ + φ)` projects to
/// `A·e^{jφ}` when the sum is doubled.
fn estimate_harmonics(samples: &[f64], fs: f64, t: f64, f0: f64, count: usize, periods: f64) -> Vec<Complex64> {
    let len = odd_length(((periods * fs / f0) + 0.5).floor().max(3.0) as usize);
    let half = len / 2;
    let mut window = hamming(len);
    normalize_sum(&mut window, 1.0);
    let segment = centered_segment(samples, time_to_sample(t, fs), half);

    (1..=count)
        .map(|k| {
            let omega = 2.0 * PI * k as f64 * f0 / fs;
            let sum: Complex64 = segment
                .iter()
                .zip(&window)
                .enumerate()
                .map(|(j, (x, w))| {
                    let tau = j as f64 - half as f64;
                    Complex64::from_polar(w * x, -omega * tau)
                })
                .sum();
            2.0 * sum
        })
        .collect()
}

/// LPC model of the residual around one frame.
///
/// Voiced frames only model the band above their maximum voicing
/// frequency. Frames harmonic up to Nyquist, and silent segments, carry no
/// noise.
fn noise_model(residual: &[f64], fs: f64, frame: &SpeechFrame, window_len: usize, order: usize) -> NoiseModel {
    let nyquist = 0.5 * fs;
    if frame.max_voicing_freq_hz >= nyquist {
        return NoiseModel::None;
    }
    let mut segment = centered_segment(residual, time_to_sample(frame.t_analysis, fs), window_len / 2);
    if frame.is_voiced() {
        segment = fd_band_filter(&segment, frame.max_voicing_freq_hz, nyquist, fs);
    }
    let original_std = std_dev(&segment);
    if original_std <= 0.0 {
        return NoiseModel::None;
    }

    let window = hamming(segment.len());
    let windowed: Vec<f64> = segment.iter().zip(&window).map(|(x, w)| x * w).collect();
    match fit_lpc(&windowed, order) {
        Some(model) => NoiseModel::Lpc {
            coeffs: model.coeffs,
            gain: model.gain,
            original_std,
        },
        None => NoiseModel::None,
    }
}
