//! Signal processing primitives shared by analysis and synthesis.

pub mod extrema;
pub mod filter;
pub mod lpc;
pub mod spectrum;
pub mod window;

/// Converts a time in seconds to the nearest sample index.
pub fn time_to_sample(t: f64, sampling_rate: f64) -> i64 {
    (t * sampling_rate + 0.5).floor() as i64
}

/// Converts a sample index to its time in seconds.
pub fn sample_to_time(n: i64, sampling_rate: f64) -> f64 {
    n as f64 / sampling_rate
}

/// Maps a frequency onto a spectrum with bins `0..=max_index` spanning `[0, fs/2]`.
pub fn freq_to_index(freq: f64, sampling_rate: f64, max_index: usize) -> usize {
    let idx = (freq / (0.5 * sampling_rate) * max_index as f64 + 0.5).floor();
    idx.clamp(0.0, max_index as f64) as usize
}

/// Inverse of [`freq_to_index`].
pub fn index_to_freq(index: usize, sampling_rate: f64, max_index: usize) -> f64 {
    if max_index == 0 {
        return 0.0;
    }
    index as f64 * 0.5 * sampling_rate / max_index as f64
}

/// Zwicker-style Bark scale.
pub fn freq_to_bark(freq: f64) -> f64 {
    13.0 * (0.00076 * freq).atan() + 3.5 * (freq / 7500.0).powi(2).atan()
}

/// O'Shaughnessy Mel scale.
pub fn freq_to_mel(freq: f64) -> f64 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

/// Inverse of [`freq_to_mel`].
pub fn mel_to_freq(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Linear interpolation of `y` at `x` between `(x1, y1)` and `(x2, y2)`.
///
/// Falls back to the midpoint value when the abscissas coincide.
pub fn interpolate(x1: f64, x: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    let span = x2 - x1;
    if span.abs() < 1e-12 {
        return 0.5 * (y1 + y2);
    }
    y1 + (y2 - y1) * (x - x1) / span
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population standard deviation.
pub fn std_dev(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    (x.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / x.len() as f64).sqrt()
}

/// Rescales `x` around its mean so its standard deviation becomes `target`.
pub fn adjust_std_dev(x: &mut [f64], target: f64) {
    let m = mean(x);
    let s = std_dev(x);
    if s <= f64::EPSILON {
        return;
    }
    let g = target / s;
    for v in x.iter_mut() {
        *v = m + (*v - m) * g;
    }
}

/// Removes the mean of `x` in place.
pub fn remove_mean(x: &mut [f64]) {
    let m = mean(x);
    for v in x.iter_mut() {
        *v -= m;
    }
}

/// Median of a slice (average of the middle pair for even lengths).
pub fn median(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Amplitude to decibels with a floor to keep silence finite.
pub fn amp_to_db(a: f64) -> f64 {
    20.0 * a.max(1e-10).log10()
}
