//! Synthetic signals shared by unit tests.

use std::f64::consts::PI;

use crate::rng::{create_rng, gaussian_noise};

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
