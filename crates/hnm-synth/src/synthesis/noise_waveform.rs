//! Splicing of captured noise waveforms.

use tracing::debug;

use hnm_model::{NoiseModel, SpeechSignal, SynthesisParams};

use super::{is_noise_frame, NoiseSynthesizer};
use crate::dsp::time_to_sample;
use crate::dsp::window::{hamming, normalize_peak};

/// Aperiodic part from raw noise waveforms stored in the frames.
///
/// Each frame's samples are joined with their left and right context,
/// Hamming-weighted, centred on the frame instant and overlap-added with
/// weight normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveformNoiseSynthesizer;

impl NoiseSynthesizer for WaveformNoiseSynthesizer {
    fn name(&self) -> &'static str {
        "waveform"
    }

    fn handles(&self, noise: &NoiseModel) -> bool {
        noise.is_waveform()
    }

    fn synthesize(&self, signal: &SpeechSignal, _params: &SynthesisParams) -> Vec<f64> {
        let fs = signal.fs();
        let len = signal.output_len();
        let mut out = vec![0.0; len];
        let mut weights = vec![0.0; len];
        let mut spliced = 0usize;

        for frame in signal.frames.iter().filter(|f| is_noise_frame(f, fs)) {
            let NoiseModel::Waveform {
                samples,
                left_context,
                right_context,
            } = &frame.noise
            else {
                continue;
            };
            let union: Vec<f64> = left_context
                .iter()
                .chain(samples)
                .chain(right_context)
                .copied()
                .collect();
            if union.is_empty() {
                continue;
            }
            let mut window = hamming(union.len());
            normalize_peak(&mut window, 1.0);
            let start = time_to_sample(frame.t_analysis, fs)
                - (samples.len() / 2) as i64
                - left_context.len() as i64;

            for (j, (x, w)) in union.iter().zip(&window).enumerate() {
                let n = start + j as i64;
                if n < 0 || n >= len as i64 {
                    continue;
                }
                out[n as usize] += x * w;
                weights[n as usize] += w;
            }
            spliced += 1;
        }

        for (o, w) in out.iter_mut().zip(&weights) {
            if *w > 0.0 {
                *o /= w;
            }
        }
        debug!(frames = spliced, samples = len, "waveform noise spliced");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnm_model::SpeechFrame;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_frame_is_reproduced() {
        let frame = SpeechFrame::unvoiced(0.01).with_noise(NoiseModel::Waveform {
            samples: vec![0.5; 20],
            left_context: vec![0.25; 4],
            right_context: vec![-0.25; 4],
        });
        let signal = SpeechSignal::new(16000, 0.02, vec![frame]);
        let out = WaveformNoiseSynthesizer.synthesize(&signal, &SynthesisParams::default());
        assert_eq!(out.len(), 321);
        // centre 160, samples start at 150, left context at 146
        assert_eq!(out[145], 0.0);
        assert!((out[146] - 0.25).abs() < 1e-12);
        assert!((out[150] - 0.5).abs() < 1e-12);
        assert!((out[169] - 0.5).abs() < 1e-12);
        assert!((out[170] + 0.25).abs() < 1e-12);
        assert_eq!(out[174], 0.0);
    }

    #[test]
    fn test_overlap_blends_frames() {
        let mk = |t: f64, v: f64| {
            SpeechFrame::unvoiced(t).with_noise(NoiseModel::Waveform {
                samples: vec![v; 240],
                left_context: Vec::new(),
                right_context: Vec::new(),
            })
        };
        let signal = SpeechSignal::new(16000, 0.04, vec![mk(0.01, 1.0), mk(0.02, 3.0)]);
        let out = WaveformNoiseSynthesizer.synthesize(&signal, &SynthesisParams::default());
        // overlap region [200, 280) mixes the two levels
        assert!((out[100] - 1.0).abs() < 1e-12);
        assert!((out[300] - 3.0).abs() < 1e-12);
        assert!(out[240] > 1.0 && out[240] < 3.0);
    }

    #[test]
    fn test_lpc_frames_are_ignored() {
        let frame = SpeechFrame::unvoiced(0.01).with_noise(NoiseModel::Lpc {
            coeffs: vec![0.5],
            gain: 1.0,
            original_std: 0.1,
        });
        let signal = SpeechSignal::new(16000, 0.02, vec![frame]);
        let out = WaveformNoiseSynthesizer.synthesize(&signal, &SynthesisParams::default());
        assert!(out.iter().all(|&v| v == 0.0));
    }
}
