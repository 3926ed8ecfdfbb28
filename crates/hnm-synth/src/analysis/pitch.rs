//! Initial F0 estimation from normalized windowed autocorrelation errors.

use tracing::{debug, trace};

use hnm_model::AnalyzerParams;

use super::Framing;
use crate::dsp::extrema::{find_extrema, Extremum};
use crate::dsp::window::{hamming, normalize_sum};

/// Candidates kept per frame before the multi-frame search.
pub const MAX_CANDIDATES_PER_FRAME: usize = 4;

/// A longer-period candidate must beat a shorter divisor candidate by this
/// much error to survive octave suppression.
const OCTAVE_ERROR_MARGIN: f64 = 0.1;

/// Relative period tolerance when testing for integer multiples.
const OCTAVE_PERIOD_TOLERANCE: f64 = 0.03;

/// A local minimum of the period error curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCandidate {
    /// Period in samples.
    pub period: usize,
    /// Normalized error at that period.
    pub error: f64,
}

/// Per-frame F0 estimates on the analysis grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchContour {
    /// Framing the contour was computed on.
    pub framing: Framing,
    /// Frame center times in seconds.
    pub times: Vec<f64>,
    /// F0 per frame in Hz, 0 where no candidate was found.
    pub f0_hz: Vec<f64>,
}

impl PitchContour {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.f0_hz.len()
    }

    /// Returns true when the contour has no frames.
    pub fn is_empty(&self) -> bool {
        self.f0_hz.is_empty()
    }
}

/// Window-derived constants of the error function.
struct ErrorWeights {
    squared: Vec<f64>,
    fourth_sum: f64,
}

impl ErrorWeights {
    fn new(len: usize) -> Self {
        let mut w = hamming(len);
        normalize_sum(&mut w, 1.0);
        let mut squared: Vec<f64> = w.iter().map(|v| v * v).collect();
        normalize_sum(&mut squared, 1.0);
        let fourth_sum = squared.iter().map(|v| v * v).sum();
        Self {
            squared,
            fourth_sum,
        }
    }
}

/// Period search range in samples.
pub fn period_range(sampling_rate: f64, params: &AnalyzerParams) -> (usize, usize) {
    let p_min = (sampling_rate / params.f0_max_hz + 0.5).floor().max(2.0) as usize;
    let p_max = (sampling_rate / params.f0_min_hz + 0.5).floor() as usize;
    (p_min, p_max.max(p_min))
}

/// Normalized error `E(P)` for every period in `[p_min, p_max]`.
///
/// ```text
/// E(P) = (Σ x²w² − P·Σ_l r(lP)) / (Σ x²w² · (1 − P·Σ w⁴))
/// ```
///
/// where `r` is the autocorrelation of the weighted frame. Returns `None`
/// for a silent frame.
fn period_errors(frame: &[f64], weights: &ErrorWeights, p_min: usize, p_max: usize) -> Option<Vec<f64>> {
    let len = frame.len();
    let energy: f64 = frame
        .iter()
        .zip(&weights.squared)
        .map(|(x, w)| x * x * w)
        .sum();
    if energy <= 1e-20 {
        return None;
    }

    let y: Vec<f64> = frame
        .iter()
        .zip(&weights.squared)
        .map(|(x, w)| x * w)
        .collect();
    let autocorr: Vec<f64> = (0..len)
        .map(|lag| (0..len - lag).map(|t| y[t] * y[t + lag]).sum())
        .collect();

    let errors = (p_min..=p_max)
        .map(|period| {
            let mut cross = autocorr[0];
            let mut lag = period;
            while lag < len {
                cross += 2.0 * autocorr[lag];
                lag += period;
            }
            let bias = 1.0 - period as f64 * weights.fourth_sum;
            if bias <= 1e-6 {
                return f64::INFINITY;
            }
            (energy - period as f64 * cross) / (energy * bias)
        })
        .collect();
    Some(errors)
}

/// Local minima of the error curve below the error ceiling, best first.
fn select_candidates(errors: &[f64], p_min: usize, params: &AnalyzerParams) -> Vec<PitchCandidate> {
    if errors.is_empty() {
        return Vec::new();
    }
    let mut candidates: Vec<PitchCandidate> = find_extrema(
        errors,
        params.candidate_neighbours.max(1),
        Extremum::Minimum,
        0,
        errors.len() - 1,
    )
    .into_iter()
    .filter(|&i| errors[i] < params.max_period_error)
    .map(|i| PitchCandidate {
        period: p_min + i,
        error: errors[i],
    })
    .collect();

    candidates.sort_by(|a, b| a.period.cmp(&b.period));
    let mut kept: Vec<PitchCandidate> = Vec::with_capacity(candidates.len());
    for cand in candidates {
        let is_subharmonic = kept.iter().any(|short| {
            let ratio = cand.period as f64 / short.period as f64;
            let multiple = ratio.round();
            multiple >= 2.0
                && (ratio - multiple).abs() <= OCTAVE_PERIOD_TOLERANCE * multiple
                && cand.error > short.error - OCTAVE_ERROR_MARGIN
        });
        if !is_subharmonic {
            kept.push(cand);
        }
    }

    kept.sort_by(|a, b| a.error.total_cmp(&b.error));
    kept.truncate(MAX_CANDIDATES_PER_FRAME);
    kept
}

/// Error of frame `frame` evaluated at `period`, or 0 for frames without a curve.
fn error_at(curves: &[Option<Vec<f64>>], frame: usize, period: usize, p_min: usize) -> f64 {
    curves[frame]
        .as_ref()
        .and_then(|c| c.get(period - p_min).copied())
        .filter(|e| e.is_finite())
        .unwrap_or(0.0)
}

/// Picks the candidate for `center` that minimizes the joint cost over
/// frames `[center - radius, center + radius]`.
///
/// The cost of an assignment is the sum of each frame's own error plus, for
/// every pair of adjacent frames, the error each frame would have at the
/// other frame's period.
fn search_window(
    center: usize,
    radius: usize,
    candidates: &[Vec<PitchCandidate>],
    curves: &[Option<Vec<f64>>],
    p_min: usize,
) -> Option<usize> {
    if candidates[center].is_empty() {
        return None;
    }
    let lo = center.saturating_sub(radius);
    let hi = (center + radius).min(candidates.len() - 1);
    let frames: Vec<usize> = (lo..=hi).filter(|&j| !candidates[j].is_empty()).collect();
    let center_pos = frames.iter().position(|&j| j == center)?;

    let mut choice = vec![0usize; frames.len()];
    let mut best: Option<(f64, usize)> = None;
    loop {
        let mut cost = 0.0;
        for (pos, &j) in frames.iter().enumerate() {
            cost += candidates[j][choice[pos]].error;
            if pos + 1 < frames.len() && frames[pos + 1] == j + 1 {
                let p_here = candidates[j][choice[pos]].period;
                let p_next = candidates[j + 1][choice[pos + 1]].period;
                cost += error_at(curves, j, p_next, p_min) + error_at(curves, j + 1, p_here, p_min);
            }
        }
        let period = candidates[center][choice[center_pos]].period;
        if best.map_or(true, |(c, _)| cost < c) {
            best = Some((cost, period));
        }

        // odometer over the candidate sets
        let mut pos = 0;
        loop {
            if pos == frames.len() {
                return best.map(|(_, p)| p);
            }
            choice[pos] += 1;
            if choice[pos] < candidates[frames[pos]].len() {
                break;
            }
            choice[pos] = 0;
            pos += 1;
        }
    }
}

/// Estimates one F0 per analysis frame.
///
/// Frames whose error curve has no local minimum below
/// `max_period_error` get F0 = 0.
pub fn estimate_initial_pitch(samples: &[f64], sampling_rate: f64, params: &AnalyzerParams) -> PitchContour {
    let framing = Framing::new(samples.len(), sampling_rate, params);
    let (p_min, p_max) = period_range(sampling_rate, params);
    let weights = ErrorWeights::new(framing.window_len);

    let curves: Vec<Option<Vec<f64>>> = (0..framing.num_frames)
        .map(|i| period_errors(&framing.frame(samples, i), &weights, p_min, p_max))
        .collect();
    let candidates: Vec<Vec<PitchCandidate>> = curves
        .iter()
        .map(|c| c.as_deref().map_or_else(Vec::new, |e| select_candidates(e, p_min, params)))
        .collect();

    let f0_hz: Vec<f64> = (0..framing.num_frames)
        .map(|i| {
            match search_window(i, params.search_radius, &candidates, &curves, p_min) {
                Some(period) => {
                    trace!(frame = i, period, "pitch period selected");
                    sampling_rate / period as f64
                }
                None => 0.0,
            }
        })
        .collect();

    let times = (0..framing.num_frames)
        .map(|i| framing.center_time(i, sampling_rate))
        .collect();

    debug!(
        frames = framing.num_frames,
        pitched = f0_hz.iter().filter(|&&f| f > 0.0).count(),
        p_min,
        p_max,
        "initial pitch estimated"
    );

    PitchContour {
        framing,
        times,
        f0_hz,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_signals::{harmonic_tone, white_noise};

    #[test]
    fn test_period_range() {
        let params = AnalyzerParams::default();
        assert_eq!(period_range(16000.0, &params), (32, 267));
    }

    #[test]
    fn test_error_is_low_at_true_period() {
        let fs = 16000.0;
        let x = harmonic_tone(160.0, fs, 0.1, 8);
        let weights = ErrorWeights::new(640);
        let errors = period_errors(&x[..640], &weights, 32, 267).unwrap();
        let at_period = errors[100 - 32];
        assert!(at_period < 0.1, "E(100) = {}", at_period);
        assert!(errors[80 - 32] > at_period + 0.3);
    }

    #[test]
    fn test_silent_frame_has_no_curve() {
        let weights = ErrorWeights::new(64);
        assert!(period_errors(&[0.0; 64], &weights, 4, 20).is_none());
    }

    #[test]
    fn test_octave_suppression() {
        let params = AnalyzerParams::default();
        let mut errors = vec![0.9; 200];
        // minima at periods 50 and 100 with comparable error
        errors[50] = 0.05;
        errors[100] = 0.04;
        let cands = select_candidates(&errors, 0, &params);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].period, 50);

        // a much better long period survives
        errors[50] = 0.3;
        let cands = select_candidates(&errors, 0, &params);
        assert_eq!(cands[0].period, 100);
    }

    #[test]
    fn test_tone_pitch_tracked() {
        let fs = 16000.0;
        let x = harmonic_tone(160.0, fs, 0.3, 10);
        let contour = estimate_initial_pitch(&x, fs, &AnalyzerParams::default());
        assert!(!contour.is_empty());
        let interior = &contour.f0_hz[3..contour.len() - 3];
        for &f0 in interior {
            assert!((f0 - 160.0).abs() < 4.0, "f0 = {}", f0);
        }
    }

    #[test]
    fn test_noise_mostly_unpitched() {
        let fs = 16000.0;
        let x = white_noise(0.3, fs, 7);
        let contour = estimate_initial_pitch(&x, fs, &AnalyzerParams::default());
        let pitched = contour.f0_hz.iter().filter(|&&f| f > 0.0).count();
        assert!(pitched * 4 < contour.len(), "{} of {} pitched", pitched, contour.len());
    }

    #[test]
    fn test_search_radius_prefers_consistent_track() {
        let p_min = 10;
        // frame 1 has a slightly better error at period 40, neighbours agree on 20
        let mk = |e20: f64, e40: f64| {
            let mut c = vec![0.8; 40];
            c[20 - p_min] = e20;
            c[40 - p_min] = e40;
            Some(c)
        };
        let curves = vec![mk(0.1, 0.6), mk(0.2, 0.15), mk(0.1, 0.6)];
        let cand = |e20: f64, e40: f64| {
            vec![
                PitchCandidate { period: 20, error: e20 },
                PitchCandidate { period: 40, error: e40 },
            ]
        };
        let candidates = vec![cand(0.1, 0.6), cand(0.2, 0.15), cand(0.1, 0.6)];
        assert_eq!(search_window(1, 0, &candidates, &curves, p_min), Some(40));
        assert_eq!(search_window(1, 1, &candidates, &curves, p_min), Some(20));
    }
}
