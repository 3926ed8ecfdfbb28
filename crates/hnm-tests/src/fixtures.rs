//! Synthetic PCM and HNM signal fixtures.

use std::f64::consts::PI;

use hnm_model::{NoiseModel, SpeechFrame, SpeechSignal, TransientSegment};
use hnm_synth::rng::{create_rng, gaussian_noise};
use num_complex::Complex64;

/// Sampling rate used by most fixtures.
pub const FS: u32 = 16000;

/// Analysis hop of the fixture signals in seconds.
pub const HOP_S: f64 = 0.01;

/// Sum of harmonics `1..=n_harmonics` of `f0` with amplitudes `1/k`,
/// alternating sine and cosine phase. Harmonics at or above Nyquist are
/// left out.
pub fn harmonic_tone(f0: f64, sampling_rate: f64, duration_s: f64, n_harmonics: usize) -> Vec<f64> {
    let len = (duration_s * sampling_rate).floor() as usize;
    (0..len)
        .map(|n| {
            let t = n as f64 / sampling_rate;
            (1..=n_harmonics)
                .filter(|&k| (k as f64) * f0 < 0.5 * sampling_rate)
                .map(|k| {
                    let arg = 2.0 * PI * k as f64 * f0 * t;
                    let wave = if k % 2 == 1 { arg.sin() } else { arg.cos() };
                    wave / k as f64
                })
                .sum()
        })
        .collect()
}

/// Unit-variance Gaussian white noise.
pub fn white_noise(duration_s: f64, sampling_rate: f64, seed: u32) -> Vec<f64> {
    let len = (duration_s * sampling_rate).floor() as usize;
    gaussian_noise(&mut create_rng(seed), len, 1.0)
}

/// Voiced frame whose harmonic phases follow a steady tone started at t = 0,
/// with amplitudes `amplitude / k`.
pub fn voiced_frame(t: f64, f0: f64, n_harmonics: usize, amplitude: f64) -> SpeechFrame {
    let harmonics = (1..=n_harmonics)
        .map(|k| {
            let phase = (2.0 * PI * k as f64 * f0 * t).rem_euclid(2.0 * PI);
            Complex64::from_polar(amplitude / k as f64, phase)
        })
        .collect();
    SpeechFrame::voiced(t, f0, harmonics)
}

/// First-order LPC noise model with the given level.
pub fn lpc_noise(original_std: f64) -> NoiseModel {
    NoiseModel::Lpc {
        coeffs: vec![0.5],
        gain: 1.0,
        original_std,
    }
}

/// Frame instants `HOP_S, 2·HOP_S, ...` strictly before `duration_s`.
pub fn frame_times(duration_s: f64) -> Vec<f64> {
    let count = ((duration_s - 1e-9) / HOP_S).floor() as usize;
    (1..=count).map(|i| i as f64 * HOP_S).collect()
}

/// Steady voiced signal with weak LPC noise above the voiced band.
pub fn vowel_signal(duration_s: f64, f0: f64) -> SpeechSignal {
    let frames = frame_times(duration_s)
        .into_iter()
        .map(|t| voiced_frame(t, f0, 20, 0.3).with_noise(lpc_noise(0.01)))
        .collect();
    SpeechSignal::new(FS, duration_s, frames)
}

/// Voiced first half, unvoiced noisy second half.
pub fn mixed_signal(duration_s: f64, f0: f64) -> SpeechSignal {
    let times = frame_times(duration_s);
    let half = times.len() / 2;
    let frames = times
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            if i < half {
                voiced_frame(t, f0, 20, 0.3).with_noise(lpc_noise(0.01))
            } else {
                SpeechFrame::unvoiced(t).with_noise(lpc_noise(0.05))
            }
        })
        .collect();
    SpeechSignal::new(FS, duration_s, frames)
}

/// Adds a transient of `len` samples of `value` starting at `start_s`, and
/// flags the frames it covers.
pub fn with_transient(signal: SpeechSignal, start_s: f64, len: usize, value: f64) -> SpeechSignal {
    let mut signal = signal.with_transients(vec![TransientSegment::new(start_s, vec![value; len])]);
    signal.mark_transient_frames();
    signal
}

/// Raw noise captured around every frame of an unvoiced signal.
pub fn waveform_noise_signal(duration_s: f64, seed: u32) -> SpeechSignal {
    let fs = FS as f64;
    let frames = frame_times(duration_s)
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let mut samples = white_noise(0.01, fs, seed.wrapping_add(i as u32));
            samples.iter_mut().for_each(|s| *s *= 0.05);
            SpeechFrame::unvoiced(t).with_noise(NoiseModel::Waveform {
                samples,
                left_context: Vec::new(),
                right_context: Vec::new(),
            })
        })
        .collect();
    SpeechSignal::new(FS, duration_s, frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnm_model::validate_signal;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_times() {
        let times = frame_times(0.05);
        assert_eq!(times.len(), 4);
        assert!((times[3] - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_fixture_signals_are_valid() {
        assert!(validate_signal(&vowel_signal(0.2, 120.0)).is_ok());
        assert!(validate_signal(&mixed_signal(0.2, 120.0)).is_ok());
        assert!(validate_signal(&waveform_noise_signal(0.1, 1)).is_ok());
        let transient = with_transient(vowel_signal(0.2, 120.0), 0.1, 80, 0.2);
        assert!(validate_signal(&transient).is_ok());
        assert!(transient.frames.iter().any(|f| f.is_transient));
    }

    #[test]
    fn test_voiced_frame_phases_follow_tone() {
        let frame = voiced_frame(0.01, 100.0, 3, 1.0);
        // one full period of f0 at t = 0.01
        for c in &frame.harmonics {
            let wrapped = c.arg().rem_euclid(2.0 * PI);
            assert!(wrapped < 1e-6 || 2.0 * PI - wrapped < 1e-6);
        }
    }
}
