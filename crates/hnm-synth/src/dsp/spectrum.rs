//! FFT-based magnitude spectra and frequency-domain filtering.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::amp_to_db;

/// Default FFT size for spectral analysis at a given sampling rate,
/// doubled until it holds at least `min_len` samples.
pub fn fft_size_for(sampling_rate: f64, min_len: usize) -> usize {
    let mut size = if sampling_rate < 10000.0 {
        2048
    } else if sampling_rate < 20000.0 {
        4096
    } else {
        8192
    };
    while size < min_len {
        size *= 2;
    }
    size
}

/// Reusable forward FFT of a fixed size.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
}

impl SpectrumAnalyzer {
    /// Plans a forward FFT of `size` points.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(size),
            size,
        }
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Index of the Nyquist bin; spectra hold `max_index() + 1` bins.
    pub fn max_index(&self) -> usize {
        self.size / 2
    }

    /// Complex spectrum of a zero-padded frame.
    pub fn complex(&self, frame: &[f64]) -> Vec<Complex<f64>> {
        let mut buf: Vec<Complex<f64>> = frame
            .iter()
            .take(self.size)
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        buf.resize(self.size, Complex::new(0.0, 0.0));
        self.fft.process(&mut buf);
        buf
    }

    /// Linear magnitude spectrum, bins `0..=size/2`.
    pub fn magnitude(&self, frame: &[f64]) -> Vec<f64> {
        self.complex(frame)
            .iter()
            .take(self.max_index() + 1)
            .map(|c| c.norm())
            .collect()
    }

    /// Magnitude spectrum in dB, bins `0..=size/2`.
    pub fn magnitude_db(&self, frame: &[f64]) -> Vec<f64> {
        self.magnitude(frame).into_iter().map(amp_to_db).collect()
    }
}

/// Zero-phase band-pass filter in the frequency domain.
///
/// Bins outside `[low_hz, high_hz]` are zeroed on both spectrum halves.
pub fn fd_band_filter(x: &[f64], low_hz: f64, high_hz: f64, sampling_rate: f64) -> Vec<f64> {
    if x.is_empty() {
        return Vec::new();
    }
    let size = x.len().next_power_of_two().max(2);
    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let mut buf: Vec<Complex<f64>> = x.iter().map(|&s| Complex::new(s, 0.0)).collect();
    buf.resize(size, Complex::new(0.0, 0.0));
    forward.process(&mut buf);

    let bin_hz = sampling_rate / size as f64;
    for (k, c) in buf.iter_mut().enumerate() {
        let folded = if k <= size / 2 { k } else { size - k };
        let f = folded as f64 * bin_hz;
        if f < low_hz || f > high_hz {
            *c = Complex::new(0.0, 0.0);
        }
    }

    inverse.process(&mut buf);
    let scale = 1.0 / size as f64;
    buf.iter().take(x.len()).map(|c| c.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_fft_size_for() {
        assert_eq!(fft_size_for(8000.0, 100), 2048);
        assert_eq!(fft_size_for(16000.0, 100), 4096);
        assert_eq!(fft_size_for(44100.0, 100), 8192);
        assert_eq!(fft_size_for(16000.0, 5000), 8192);
    }

    #[test]
    fn test_magnitude_peak_at_tone() {
        let fs = 16000.0;
        let analyzer = SpectrumAnalyzer::new(4096);
        let spec = analyzer.magnitude(&sine(1000.0, fs, 1024));
        assert_eq!(spec.len(), 2049);
        let peak = spec
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        assert_eq!(peak, super::super::freq_to_index(1000.0, fs, 2048));
    }

    #[test]
    fn test_band_filter_removes_low_tone() {
        let fs = 16000.0;
        let low = sine(250.0, fs, 4096);
        let high = sine(4000.0, fs, 4096);
        let mixed: Vec<f64> = low.iter().zip(&high).map(|(a, b)| a + b).collect();
        let filtered = fd_band_filter(&mixed, 1000.0, 8000.0, fs);
        let err: f64 = filtered
            .iter()
            .zip(&high)
            .skip(100)
            .take(3800)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        assert!(err < 0.05, "max error {}", err);
    }
}
