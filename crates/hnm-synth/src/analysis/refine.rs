//! Pitch refinement against detected harmonic peaks.

/// Search half-width around the initial estimate, in Hz.
const SEARCH_RANGE_HZ: f64 = 20.0;

/// Grid step of the search, in Hz.
const SEARCH_STEP_HZ: f64 = 0.1;

/// Refines `f0_hz` so that `k·f0` best matches the `k`-th harmonic peak.
///
/// Searches `f0 ± 20 Hz` in 0.1 Hz steps for the value minimizing
/// `Σ |peak_k − k·f0|` over peaks below `max_voicing_freq_hz`. Returns the
/// input unchanged when there is nothing to fit.
pub fn refine_frame_pitch(f0_hz: f64, max_voicing_freq_hz: f64, peak_freqs_hz: &[f64]) -> f64 {
    let peaks: Vec<(f64, f64)> = peak_freqs_hz
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p < max_voicing_freq_hz)
        .map(|(i, &p)| ((i + 1) as f64, p))
        .collect();
    if peaks.is_empty() || f0_hz <= 0.0 {
        return f0_hz;
    }

    let steps = (2.0 * SEARCH_RANGE_HZ / SEARCH_STEP_HZ).round() as usize;
    let mut best = f0_hz;
    let mut best_err = f64::INFINITY;
    for step in 0..=steps {
        let candidate = f0_hz - SEARCH_RANGE_HZ + step as f64 * SEARCH_STEP_HZ;
        if candidate <= 0.0 {
            continue;
        }
        let err: f64 = peaks.iter().map(|(k, p)| (p - k * candidate).abs()).sum();
        if err < best_err {
            best_err = err;
            best = candidate;
        }
    }
    best
}
