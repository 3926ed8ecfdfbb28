//! Analysis and synthesis windows.

use std::f64::consts::PI;

/// Hamming window of length `len`.
pub fn hamming(len: usize) -> Vec<f64> {
    cosine_window(len, 0.54, 0.46)
}

/// Hanning window of length `len`.
pub fn hanning(len: usize) -> Vec<f64> {
    cosine_window(len, 0.5, 0.5)
}

fn cosine_window(len: usize, a0: f64, a1: f64) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (len - 1) as f64;
            (0..len)
                .map(|n| a0 - a1 * (2.0 * PI * n as f64 / denom).cos())
                .collect()
        }
    }
}

/// Scales the window so its largest coefficient equals `peak`.
pub fn normalize_peak(w: &mut [f64], peak: f64) {
    let max = w.iter().cloned().fold(0.0f64, f64::max);
    if max > 0.0 {
        for v in w.iter_mut() {
            *v *= peak / max;
        }
    }
}

/// Scales the window so its coefficients sum to `total`.
pub fn normalize_sum(w: &mut [f64], total: f64) {
    let sum: f64 = w.iter().sum();
    if sum.abs() > 0.0 {
        for v in w.iter_mut() {
            *v *= total / sum;
        }
    }
}

/// Rising and falling halves of a peak-normalized Hamming window of length `2·half_len`.
pub fn half_hamming(half_len: usize) -> (Vec<f64>, Vec<f64>) {
    let mut w = hamming(2 * half_len);
    normalize_peak(&mut w, 1.0);
    let right = w.split_off(half_len);
    (w, right)
}
