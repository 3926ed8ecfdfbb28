//! Voicing decision and maximum voicing frequency estimation.
//!
//! A frame is voiced when the spectral energy near the first few harmonics
//! of its F0 dominates the energy between them. Voiced frames are then
//! scanned band by band for harmonic peaks; the maximum voicing frequency
//! sits at the top of the last band before two consecutive non-harmonic
//! bands.

use tracing::{debug, trace};

use hnm_model::{AnalyzerParams, VOICING_F0_FLOOR_HZ};

use super::PitchContour;
use crate::dsp::extrema::{arg_max, find_all_extrema, find_extrema, Extremum};
use crate::dsp::filter::median_filter;
use crate::dsp::spectrum::{fft_size_for, SpectrumAnalyzer};
use crate::dsp::window::hanning;
use crate::dsp::{freq_to_index, index_to_freq, mean, median};

/// Half-width of the harmonic neighbourhood used by the voicing ratio, in F0 units.
const HARMONIC_HALF_WIDTH: f64 = 0.25;

/// RMS the signal is normalized to before spectral analysis.
const ANALYSIS_RMS: f64 = 500.0;

/// Voicing analysis result for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameVoicing {
    /// Frame center time in seconds.
    pub time_s: f64,
    /// F0 in Hz, 0 when unvoiced.
    pub f0_hz: f64,
    /// Voicing flag.
    pub is_voiced: bool,
    /// Frequency up to which the spectrum is harmonic, 0 when unvoiced.
    pub max_voicing_freq_hz: f64,
    /// Peak frequencies of the voiced harmonic bands.
    pub peak_freqs_hz: Vec<f64>,
}

impl FrameVoicing {
    fn unvoiced(time_s: f64) -> Self {
        Self {
            time_s,
            f0_hz: 0.0,
            is_voiced: false,
            max_voicing_freq_hz: 0.0,
            peak_freqs_hz: Vec::new(),
        }
    }
}

/// Result of the band scan of one spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumVoicing {
    /// Voicing flag.
    pub is_voiced: bool,
    /// Maximum voicing frequency in Hz, 0 when unvoiced.
    pub max_voicing_freq_hz: f64,
    /// Peak frequencies of the voiced bands.
    pub peak_freqs_hz: Vec<f64>,
}

impl SpectrumVoicing {
    fn unvoiced() -> Self {
        Self {
            is_voiced: false,
            max_voicing_freq_hz: 0.0,
            peak_freqs_hz: Vec::new(),
        }
    }
}

/// Ratio in dB of the mean energy near harmonics `1..=N` to the mean energy
/// of the remaining bins in `[(1-ε)·f0, (N+ε)·f0]`.
pub fn voicing_ratio_db(spec_db: &[f64], sampling_rate: f64, f0: f64, params: &AnalyzerParams) -> f64 {
    let max_index = spec_db.len().saturating_sub(1);
    let n = params.num_harmonics_for_voicing.max(1) as f64;
    let eps = params.voicing_band_epsilon;
    let lo = freq_to_index((1.0 - eps) * f0, sampling_rate, max_index);
    let hi = freq_to_index((n + eps) * f0, sampling_rate, max_index);

    let mut harmonic = Vec::new();
    let mut other = Vec::new();
    for (j, &db) in spec_db.iter().enumerate().take(hi + 1).skip(lo) {
        let f = index_to_freq(j, sampling_rate, max_index);
        let k = (f / f0).round().clamp(1.0, n);
        let power = 10f64.powf(db / 10.0);
        if (f - k * f0).abs() <= HARMONIC_HALF_WIDTH * f0 {
            harmonic.push(power);
        } else {
            other.push(power);
        }
    }
    if harmonic.is_empty() {
        return f64::NEG_INFINITY;
    }
    10.0 * (mean(&harmonic) / mean(&other).max(1e-30)).log10()
}

/// Peak value plus every spectrum sample between the peak's bounding valleys.
fn cumulative_amplitude(spec_lin: &[f64], peak: usize, valleys: &[usize]) -> f64 {
    let left = valleys.iter().rev().find(|&&v| v < peak).copied().unwrap_or(0);
    let right = valleys
        .iter()
        .find(|&&v| v > peak)
        .copied()
        .unwrap_or(spec_lin.len() - 1);
    spec_lin[left..=right].iter().sum()
}

/// Clamps a maximum voicing frequency to the harmonic-count limits and Nyquist.
pub fn constrain_max_voicing_freq(mvf: f64, f0: f64, sampling_rate: f64, params: &AnalyzerParams) -> f64 {
    mvf.clamp(
        params.min_harmonics_for_mvf as f64 * f0,
        params.max_harmonics_for_mvf as f64 * f0,
    )
    .min(0.5 * sampling_rate)
}

/// Voicing decision and maximum voicing frequency for one dB spectrum
/// (bins `0..=fft/2`).
pub fn estimate_frame_voicing(
    spec_db: &[f64],
    sampling_rate: f64,
    f0: f64,
    params: &AnalyzerParams,
) -> SpectrumVoicing {
    if f0 <= VOICING_F0_FLOOR_HZ || spec_db.len() < 3 {
        return SpectrumVoicing::unvoiced();
    }
    let ratio = voicing_ratio_db(spec_db, sampling_rate, f0, params);
    if ratio <= params.voicing_threshold_db {
        trace!(f0, ratio, "voicing ratio below threshold");
        return SpectrumVoicing::unvoiced();
    }

    let nyquist = 0.5 * sampling_rate;
    let num_bands = ((nyquist - 1.5 * f0) / f0 + 0.5).floor();
    if num_bands < 1.0 {
        return SpectrumVoicing::unvoiced();
    }
    let num_bands = num_bands as usize;

    let max_index = spec_db.len() - 1;
    let spec_lin: Vec<f64> = spec_db.iter().map(|db| 10f64.powf(db / 20.0)).collect();
    let valleys = find_all_extrema(spec_db, 2, Extremum::Minimum);
    let edges: Vec<usize> = (0..=num_bands)
        .map(|i| freq_to_index((i as f64 + 0.5) * f0, sampling_rate, max_index))
        .collect();
    let max_deviation = params.harmonic_deviation_percent / 100.0;

    let mut decisions = Vec::with_capacity(num_bands);
    let mut peak_freqs = Vec::with_capacity(num_bands);
    for band in 0..num_bands {
        let (start, end) = (edges[band], edges[band + 1]);
        let peaks = find_extrema(spec_db, 1, Extremum::Maximum, start, end);
        let fc_index = peaks
            .iter()
            .copied()
            .max_by(|&a, &b| spec_db[a].total_cmp(&spec_db[b]))
            .or_else(|| arg_max(spec_db, start, end))
            .unwrap_or((start + end) / 2);
        let fc = index_to_freq(fc_index, sampling_rate, max_index);
        let harmonic_freq = (band + 1) as f64 * f0;
        let deviation_ok = (fc - harmonic_freq).abs() / harmonic_freq < max_deviation;

        let am = spec_db[fc_index];
        let amc = cumulative_amplitude(&spec_lin, fc_index, &valleys);
        let lo = freq_to_index(fc - 0.5 * f0, sampling_rate, max_index);
        let hi = freq_to_index(fc + 0.5 * f0, sampling_rate, max_index);
        let others: Vec<usize> = find_extrema(spec_db, 1, Extremum::Maximum, lo, hi)
            .into_iter()
            .filter(|&p| p != fc_index)
            .collect();

        let voiced = match others.len() {
            0 => am - median(&spec_db[lo..=hi]) > params.sharp_peak_amp_diff_db,
            1 => am - spec_db[others[0]] > params.maximum_amp_threshold_db && deviation_ok,
            _ => {
                let other_amcs: Vec<f64> = others
                    .iter()
                    .map(|&p| cumulative_amplitude(&spec_lin, p, &valleys))
                    .collect();
                amc / mean(&other_amcs).max(1e-30) > params.cumulative_amp_threshold && deviation_ok
            }
        };
        decisions.push(if voiced { 1.0 } else { 0.0 });
        peak_freqs.push(fc);
    }

    let filtered = median_filter(&decisions, params.voicing_median_filter_len);
    let last_voiced = filtered
        .windows(2)
        .position(|w| w[0] == 0.0 && w[1] == 0.0)
        .unwrap_or(num_bands);
    if last_voiced == 0 {
        trace!(f0, "no harmonic band found");
        return SpectrumVoicing::unvoiced();
    }

    let mvf = constrain_max_voicing_freq((last_voiced as f64 + 0.5) * f0, f0, sampling_rate, params);
    peak_freqs.truncate(last_voiced);
    SpectrumVoicing {
        is_voiced: true,
        max_voicing_freq_hz: mvf,
        peak_freqs_hz: peak_freqs,
    }
}

/// Voicing analysis of every frame of a pitch contour.
///
/// The signal is mean-removed and normalized to a fixed RMS, framed like the
/// contour, Hanning-windowed and transformed to a dB spectrum. Unvoiced
/// frames get F0 = 0.
pub fn analyze_voicings(
    samples: &[f64],
    sampling_rate: f64,
    contour: &PitchContour,
    params: &AnalyzerParams,
) -> Vec<FrameVoicing> {
    let m = mean(samples);
    let rms = (samples.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / samples.len().max(1) as f64).sqrt();
    let gain = if rms > 0.0 { ANALYSIS_RMS / rms } else { 0.0 };
    let normalized: Vec<f64> = samples.iter().map(|x| (x - m) * gain).collect();

    let framing = contour.framing;
    let window = hanning(framing.window_len);
    let analyzer = SpectrumAnalyzer::new(fft_size_for(sampling_rate, framing.window_len));

    let frames: Vec<FrameVoicing> = contour
        .f0_hz
        .iter()
        .enumerate()
        .map(|(i, &f0)| {
            let time_s = contour.times[i];
            if f0 <= VOICING_F0_FLOOR_HZ {
                return FrameVoicing::unvoiced(time_s);
            }
            let windowed: Vec<f64> = framing
                .frame(&normalized, i)
                .iter()
                .zip(&window)
                .map(|(x, w)| x * w)
                .collect();
            let spec_db = analyzer.magnitude_db(&windowed);
            let result = estimate_frame_voicing(&spec_db, sampling_rate, f0, params);
            if !result.is_voiced {
                return FrameVoicing::unvoiced(time_s);
            }
            FrameVoicing {
                time_s,
                f0_hz: f0,
                is_voiced: true,
                max_voicing_freq_hz: result.max_voicing_freq_hz,
                peak_freqs_hz: result.peak_freqs_hz,
            }
        })
        .collect();

    debug!(
        frames = frames.len(),
        voiced = frames.iter().filter(|f| f.is_voiced).count(),
        "voicing analysed"
    );
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_signals::{harmonic_tone, white_noise};
    use pretty_assertions::assert_eq;

    fn spectrum_db(x: &[f64], fs: f64) -> Vec<f64> {
        let window = hanning(x.len());
        let windowed: Vec<f64> = x.iter().zip(&window).map(|(a, b)| 500.0 * a * b).collect();
        SpectrumAnalyzer::new(fft_size_for(fs, x.len())).magnitude_db(&windowed)
    }

    #[test]
    fn test_ratio_separates_tone_from_noise() {
        let fs = 16000.0;
        let params = AnalyzerParams::default();
        let tone = spectrum_db(&harmonic_tone(150.0, fs, 0.04, 20), fs);
        let noise = spectrum_db(&white_noise(0.04, fs, 3), fs);
        assert!(voicing_ratio_db(&tone, fs, 150.0, &params) > 12.0);
        assert!(voicing_ratio_db(&noise, fs, 150.0, &params) < 6.0);
    }

    #[test]
    fn test_full_band_tone_reaches_cap() {
        let fs = 16000.0;
        let params = AnalyzerParams::default();
        let spec = spectrum_db(&harmonic_tone(200.0, fs, 0.04, 38), fs);
        let result = estimate_frame_voicing(&spec, fs, 200.0, &params);
        assert!(result.is_voiced);
        assert!(result.max_voicing_freq_hz >= 20.0 * 200.0);
        assert!(result.max_voicing_freq_hz <= 8000.0);
        assert!(!result.peak_freqs_hz.is_empty());
        assert!((result.peak_freqs_hz[0] - 200.0).abs() < 10.0);
    }

    #[test]
    fn test_low_f0_is_unvoiced() {
        let params = AnalyzerParams::default();
        let spec = vec![0.0; 2049];
        assert_eq!(estimate_frame_voicing(&spec, 16000.0, 5.0, &params), SpectrumVoicing::unvoiced());
    }

    #[test]
    fn test_frame_voicing_is_deterministic() {
        let fs = 16000.0;
        let params = AnalyzerParams::default();
        let mut x = harmonic_tone(130.0, fs, 0.04, 25);
        for (a, b) in x.iter_mut().zip(white_noise(0.04, fs, 11)) {
            *a += 0.2 * b;
        }
        let spec = spectrum_db(&x, fs);
        let first = estimate_frame_voicing(&spec, fs, 130.0, &params);
        let second = estimate_frame_voicing(&spec, fs, 130.0, &params);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mvf_constraints() {
        let params = AnalyzerParams::default();
        assert_eq!(constrain_max_voicing_freq(500.0, 100.0, 16000.0, &params), 2000.0);
        assert_eq!(constrain_max_voicing_freq(9000.0, 100.0, 16000.0, &params), 5000.0);
        assert_eq!(constrain_max_voicing_freq(9000.0, 300.0, 16000.0, &params), 8000.0);
    }

    #[test]
    fn test_cumulative_amplitude_between_valleys() {
        let spec = [0.1, 0.5, 1.0, 0.5, 0.1, 0.3, 0.1];
        assert!((cumulative_amplitude(&spec, 2, &[0, 4, 6]) - 2.2).abs() < 1e-12);
        assert!((cumulative_amplitude(&spec, 5, &[0, 4, 6]) - 0.5).abs() < 1e-12);
    }
}
