//! Signal measurements for checking synthesized PCM.

/// Root mean square of the samples, 0 for empty input.
///
/// # Example
///
/// ```rust
/// use hnm_tests::rms;
///
/// assert_eq!(rms(&[0.0; 10]), 0.0);
/// assert_eq!(rms(&[0.5; 10]), 0.5);
/// ```
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Largest absolute sample value.
pub fn peak_amplitude(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0f64, |m, s| m.max(s.abs()))
}

/// Whether every sample is within `threshold` of zero.
pub fn is_silent(samples: &[f64], threshold: f64) -> bool {
    samples.iter().all(|s| s.abs() <= threshold)
}

/// Normalized cross-correlation at lag 0 over the common length.
///
/// Returns 0 when either input has no energy.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let ea: f64 = a.iter().map(|x| x * x).sum();
    let eb: f64 = b.iter().map(|y| y * y).sum();
    if ea <= 0.0 || eb <= 0.0 {
        return 0.0;
    }
    dot / (ea * eb).sqrt()
}

/// Signal-to-noise ratio in dB of `estimate` against `reference`.
pub fn snr_db(reference: &[f64], estimate: &[f64]) -> f64 {
    let n = reference.len().min(estimate.len());
    let signal: f64 = reference[..n].iter().map(|x| x * x).sum();
    let noise: f64 = reference[..n]
        .iter()
        .zip(&estimate[..n])
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    if noise <= 0.0 {
        return f64::INFINITY;
    }
    10.0 * (signal / noise).log10()
}

/// Number of sign changes per sample.
pub fn zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (samples.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_bounds() {
        let x: Vec<f64> = (0..100).map(|n| (n as f64 * 0.1).sin()).collect();
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((correlation(&x, &x) - 1.0).abs() < 1e-12);
        assert!((correlation(&x, &neg) + 1.0).abs() < 1e-12);
        assert_eq!(correlation(&x, &[0.0; 100]), 0.0);
    }

    #[test]
    fn test_snr() {
        let x = vec![1.0; 100];
        let y = vec![1.1; 100];
        assert!((snr_db(&x, &y) - 20.0).abs() < 1e-9);
        assert_eq!(snr_db(&x, &x), f64::INFINITY);
    }

    #[test]
    fn test_zero_crossing_rate() {
        assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0, 1.0]), 1.0);
        assert_eq!(zero_crossing_rate(&[1.0; 5]), 0.0);
    }

    #[test]
    fn test_peak_and_silence() {
        assert_eq!(peak_amplitude(&[0.1, -0.7, 0.3]), 0.7);
        assert!(is_silent(&[0.0005, -0.0002], 0.001));
        assert!(!is_silent(&[0.0, 0.5], 0.001));
    }
}
