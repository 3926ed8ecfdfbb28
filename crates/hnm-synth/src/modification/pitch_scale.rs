//! Pitch scaling of a single frame by harmonic resampling.

use num_complex::Complex64;

use hnm_model::{AmplitudeSource, SpeechFrame, SynthesisParams};

use crate::cepstrum::RegularizedCepstrum;

/// Scales the F0 of `frame` by `scale`, resampling its harmonics.
///
/// The harmonic count becomes `round(K / scale)` (capped at Nyquist) so the
/// modelled band stays roughly where it was. New amplitudes come from the
/// cepstral envelope or from linear interpolation between the neighbouring
/// original harmonics; each new harmonic keeps the phase of the original
/// harmonic with the same number. A frame left without harmonics becomes
/// unvoiced.
pub fn scale_frame_pitch(
    frame: &SpeechFrame,
    scale: f64,
    sampling_rate: f64,
    params: &SynthesisParams,
) -> SpeechFrame {
    if !frame.is_voiced() || (scale - 1.0).abs() < 1e-12 {
        return frame.clone();
    }

    let old_count = frame.num_harmonics();
    let new_f0 = frame.f0_hz * scale;
    let nyquist_count = (0.5 * sampling_rate / new_f0).floor().max(0.0) as usize;
    let new_count = ((old_count as f64 / scale).round() as usize).min(nyquist_count);

    let mut scaled = frame.clone();
    if new_count == 0 {
        scaled.f0_hz = 0.0;
        scaled.max_voicing_freq_hz = 0.0;
        scaled.harmonics.clear();
        return scaled;
    }

    let magnitudes = frame.harmonic_magnitudes();
    let cepstrum = match params.amplitude_source {
        AmplitudeSource::Cepstrum => {
            RegularizedCepstrum::from_harmonics(&magnitudes, frame.f0_hz, sampling_rate, &params.cepstrum)
        }
        AmplitudeSource::Direct => None,
    };

    scaled.harmonics = (1..=new_count)
        .map(|k| {
            let amplitude = match &cepstrum {
                Some(cep) => cep.evaluate(k as f64 * new_f0),
                None => interpolate_magnitude(&magnitudes, k as f64 * scale),
            };
            let phase = frame.harmonics[k.min(old_count) - 1].arg();
            Complex64::from_polar(amplitude, phase)
        })
        .collect();
    scaled.f0_hz = new_f0;
    scaled
}

/// Magnitude at fractional harmonic number `position` (1-based), clamped to
/// the available harmonics.
fn interpolate_magnitude(magnitudes: &[f64], position: f64) -> f64 {
    let last = magnitudes.len() - 1;
    if position <= 1.0 {
        return magnitudes[0];
    }
    if position >= magnitudes.len() as f64 {
        return magnitudes[last];
    }
    let base = position.floor();
    let frac = position - base;
    let i0 = base as usize - 1;
    (1.0 - frac) * magnitudes[i0] + frac * magnitudes[(i0 + 1).min(last)]
}
