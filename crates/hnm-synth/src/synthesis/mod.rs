//! Harmonic, noise, and transient synthesis.

pub mod harmonic;
pub mod noise_lpc;
pub mod noise_waveform;
pub mod transient;

pub use harmonic::{plan_track, HarmonicSynthesizer, TrackSegment, TrackState};
pub use noise_lpc::{LpcNoiseSynthesizer, NoiseSegment};
pub use noise_waveform::WaveformNoiseSynthesizer;
pub use transient::place_transients;

use hnm_model::{NoiseModel, SpeechFrame, SpeechSignal, SynthesisParams};

/// A strategy producing the aperiodic part of a signal.
///
/// Each strategy renders the frames whose noise model it handles into a
/// zero-initialized buffer of `signal.output_len()` samples and leaves every
/// other region silent, so strategies can be summed.
pub trait NoiseSynthesizer {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy renders frames carrying `noise`.
    fn handles(&self, noise: &NoiseModel) -> bool;

    /// Renders the handled frames of `signal`.
    fn synthesize(&self, signal: &SpeechSignal, params: &SynthesisParams) -> Vec<f64>;
}

/// All built-in noise strategies.
pub fn noise_strategies() -> Vec<Box<dyn NoiseSynthesizer>> {
    vec![Box::new(LpcNoiseSynthesizer), Box::new(WaveformNoiseSynthesizer)]
}

/// Sum of every strategy that handles at least one frame of `signal`.
pub fn synthesize_noise(signal: &SpeechSignal, params: &SynthesisParams) -> Vec<f64> {
    let mut out = vec![0.0; signal.output_len()];
    for strategy in noise_strategies() {
        if !signal.frames.iter().any(|f| strategy.handles(&f.noise)) {
            continue;
        }
        tracing::trace!(strategy = strategy.name(), "running noise strategy");
        for (o, v) in out.iter_mut().zip(strategy.synthesize(signal, params)) {
            *o += v;
        }
    }
    out
}

/// Frames that contribute to the aperiodic part: noised and outside transients.
pub(crate) fn is_noise_frame(frame: &SpeechFrame, sampling_rate: f64) -> bool {
    !frame.is_transient && frame.is_noised(sampling_rate)
}
