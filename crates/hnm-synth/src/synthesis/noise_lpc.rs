//! LPC-filtered white noise, overlap-added frame by frame.

use tracing::{debug, trace};

use hnm_model::{NoiseModel, SpeechSignal, SynthesisParams};

use super::{is_noise_frame, NoiseSynthesizer};
use crate::dsp::filter::{ar_filter, remove_preemphasis};
use crate::dsp::spectrum::fd_band_filter;
use crate::dsp::window::{hamming, normalize_peak};
use crate::dsp::{adjust_std_dev, remove_mean, time_to_sample};
use crate::rng::{create_frame_rng, gaussian_noise};

/// One frame's filtered noise before overlap-add.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSegment {
    /// First output sample covered by the segment (may be negative).
    pub start: i64,
    /// Filtered, level-adjusted noise.
    pub samples: Vec<f64>,
    /// Peak-normalized Hamming window applied before filtering.
    pub window: Vec<f64>,
}

/// Aperiodic part from per-frame all-pole noise models.
#[derive(Debug, Clone, Copy, Default)]
pub struct LpcNoiseSynthesizer;

impl LpcNoiseSynthesizer {
    /// Generates the noise segment of frame `index`, or `None` when the
    /// frame carries no LPC noise.
    ///
    /// The window spans at least the configured noise window and two frame
    /// hops when the next frame is noised too, widened by the transition
    /// overlap at the edges of a noised region and forced to odd length.
    pub fn frame_segment(
        &self,
        signal: &SpeechSignal,
        params: &SynthesisParams,
        index: usize,
    ) -> Option<NoiseSegment> {
        let fs = signal.fs();
        let frame = &signal.frames[index];
        if !is_noise_frame(frame, fs) {
            return None;
        }
        let NoiseModel::Lpc {
            coeffs,
            original_std,
            ..
        } = &frame.noise
        else {
            return None;
        };

        let prev_noised = index
            .checked_sub(1)
            .map_or(false, |p| is_noise_frame(&signal.frames[p], fs));
        let next = signal.frames.get(index + 1);
        let next_noised = next.map_or(false, |n| is_noise_frame(n, fs));

        let mut duration = params.noise_window_s;
        if let Some(n) = next.filter(|_| next_noised) {
            duration = duration.max(2.0 * (n.t_analysis - frame.t_analysis));
        }
        let mut len = time_to_sample(duration, fs).max(1) as usize;
        if !prev_noised || !next_noised {
            len += time_to_sample(params.noise_transition_overlap_s, fs).max(0) as usize;
        }
        if len % 2 == 0 {
            len += 1;
        }
        let start = if index == 0 {
            0
        } else {
            time_to_sample(frame.t_analysis, fs) - (len / 2) as i64
        };

        let mut window = hamming(len);
        normalize_peak(&mut window, 1.0);
        let mut rng = create_frame_rng(params.noise_seed, index);
        let excitation: Vec<f64> = gaussian_noise(&mut rng, len, 1.0)
            .iter()
            .zip(&window)
            .map(|(e, w)| e * w)
            .collect();

        let mut samples = ar_filter(&excitation, coeffs, 1.0);
        if params.high_pass_noise && frame.max_voicing_freq_hz > 0.0 {
            samples = fd_band_filter(&samples, frame.max_voicing_freq_hz, 0.5 * fs, fs);
        }
        adjust_std_dev(&mut samples, *original_std);

        trace!(frame = index, start, len, "lpc noise segment generated");
        Some(NoiseSegment {
            start,
            samples,
            window,
        })
    }
}

/// Triangular energy envelope: floor, linear rise to 1 at the midpoint,
/// linear fall back to the floor, floor again.
fn triangular_envelope(u: f64, params: &SynthesisParams) -> f64 {
    let floor = params.noise_envelope_floor;
    let (rise, fall) = (params.noise_envelope_start, params.noise_envelope_end);
    if u < rise || u >= fall {
        floor
    } else if u < 0.5 {
        floor + (1.0 - floor) * (u - rise) / (0.5 - rise).max(f64::EPSILON)
    } else {
        1.0 - (1.0 - floor) * (u - 0.5) / (fall - 0.5).max(f64::EPSILON)
    }
}

impl NoiseSynthesizer for LpcNoiseSynthesizer {
    fn name(&self) -> &'static str {
        "lpc"
    }

    fn handles(&self, noise: &NoiseModel) -> bool {
        noise.is_lpc()
    }

    fn synthesize(&self, signal: &SpeechSignal, params: &SynthesisParams) -> Vec<f64> {
        let fs = signal.fs();
        let len = signal.output_len();
        let mut out = vec![0.0; len];
        let mut weights = vec![0.0; len];
        let mut segments = 0usize;

        for index in 0..signal.frames.len() {
            let Some(seg) = self.frame_segment(signal, params, index) else {
                continue;
            };
            segments += 1;
            for (j, (y, w)) in seg.samples.iter().zip(&seg.window).enumerate() {
                let n = seg.start + j as i64;
                if n < 0 || n >= len as i64 {
                    continue;
                }
                out[n as usize] += y * w * w;
                weights[n as usize] += w * w * w;
            }
        }
        for (o, w) in out.iter_mut().zip(&weights) {
            if *w > 0.0 {
                *o /= w;
            }
        }

        if params.triangular_noise_envelope {
            for pair in signal.frames.windows(2) {
                if pair[0].max_voicing_freq_hz <= 0.0 {
                    continue;
                }
                let s = time_to_sample(pair[0].t_analysis, fs).clamp(0, len as i64) as usize;
                let e = time_to_sample(pair[1].t_analysis, fs).clamp(0, len as i64) as usize;
                if e <= s {
                    continue;
                }
                let span = (e - s) as f64;
                for (j, o) in out[s..e].iter_mut().enumerate() {
                    *o *= triangular_envelope(j as f64 / span, params);
                }
            }
        }

        if params.noise_preemphasis > 0.0 {
            out = remove_preemphasis(&out, params.noise_preemphasis);
        }
        remove_mean(&mut out);

        debug!(segments, samples = len, "lpc noise synthesized");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::std_dev;
    use hnm_model::SpeechFrame;
    use pretty_assertions::assert_eq;

    fn noise_signal(num_frames: usize, std: f64) -> SpeechSignal {
        let frames = (0..num_frames)
            .map(|i| {
                SpeechFrame::unvoiced(0.01 * (i + 1) as f64).with_noise(NoiseModel::Lpc {
                    coeffs: vec![0.6, -0.2],
                    gain: 1.0,
                    original_std: std,
                })
            })
            .collect();
        SpeechSignal::new(16000, 0.01 * (num_frames + 1) as f64, frames)
    }

    #[test]
    fn test_segment_restores_original_std() {
        let signal = noise_signal(5, 0.05);
        let synth = LpcNoiseSynthesizer;
        for i in 0..5 {
            let seg = synth.frame_segment(&signal, &SynthesisParams::default(), i).unwrap();
            assert!((std_dev(&seg.samples) - 0.05).abs() < 1e-9);
            assert_eq!(seg.samples.len() % 2, 1);
            assert_eq!(seg.samples.len(), seg.window.len());
        }
    }

    #[test]
    fn test_segment_widened_at_region_edges() {
        let signal = noise_signal(5, 0.05);
        let params = SynthesisParams::default();
        let synth = LpcNoiseSynthesizer;
        let edge = synth.frame_segment(&signal, &params, 4).unwrap();
        let inner = synth.frame_segment(&signal, &params, 2).unwrap();
        // 0.060 s window, plus 0.010 s at the region edge
        assert_eq!(inner.samples.len(), 961);
        assert_eq!(edge.samples.len(), 1121);
    }

    #[test]
    fn test_output_level_and_determinism() {
        let signal = noise_signal(20, 0.1);
        let params = SynthesisParams::default();
        let a = LpcNoiseSynthesizer.synthesize(&signal, &params);
        let b = LpcNoiseSynthesizer.synthesize(&signal, &params);
        assert_eq!(a, b);
        assert_eq!(a.len(), signal.output_len());
        let s = std_dev(&a[800..2800]);
        assert!(s > 0.03 && s < 0.3, "std = {}", s);

        let other = SynthesisParams {
            noise_seed: 99,
            ..Default::default()
        };
        assert_ne!(LpcNoiseSynthesizer.synthesize(&signal, &other), a);
    }

    #[test]
    fn test_fully_voiced_frames_are_skipped() {
        let mut signal = noise_signal(3, 0.1);
        for frame in &mut signal.frames {
            frame.max_voicing_freq_hz = 8000.0;
        }
        let out = LpcNoiseSynthesizer.synthesize(&signal, &SynthesisParams::default());
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_triangular_envelope_shape() {
        let params = SynthesisParams::default();
        assert_eq!(triangular_envelope(0.0, &params), 0.2);
        assert_eq!(triangular_envelope(0.9, &params), 0.2);
        assert!((triangular_envelope(0.5, &params) - 1.0).abs() < 1e-12);
        let up = triangular_envelope(0.3, &params);
        assert!(up > 0.2 && up < 1.0);
    }
}
