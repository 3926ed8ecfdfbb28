//! Structural validation of signals, modification requests, and parameters.

pub mod common;

use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};
use crate::frame::SpeechFrame;
use crate::params::{AnalyzerParams, CepstrumParams, SynthesisParams};
use crate::prosody::ProsodyModificationSpec;
use crate::signal::SpeechSignal;

use common::{
    validate_non_negative, validate_positive, validate_range, validate_strictly_increasing,
    validate_unit_interval, CommonValidationError,
};

/// Validates a speech signal.
///
/// Rejects a zero sampling rate, an empty frame list, non-positive duration,
/// non-monotonic frame times, frames timed past the duration, malformed
/// frames, and malformed transients.
/// Signals with a single frame pass with a warning.
pub fn validate_signal(signal: &SpeechSignal) -> ValidationResult {
    let mut result = ValidationResult::success();

    if signal.sampling_rate_hz == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidSamplingRate,
            "sampling rate must be positive",
            "sampling_rate_hz",
        ));
    }

    if signal.frames.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::EmptySignal,
            "signal has no frames",
            "frames",
        ));
    } else if signal.frames.len() < 2 {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::TooFewFrames,
            "signal has a single frame and synthesizes to silence",
            "frames",
        ));
    }

    if let Err(e) = validate_positive("original_duration_s", signal.original_duration_s) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidDuration,
            e.message,
            "original_duration_s",
        ));
    }

    let times = signal.frame_times();
    if let Err((index, e)) = validate_strictly_increasing("frame times", &times) {
        result.add_error(ValidationError::with_path(
            ErrorCode::NonMonotonicFrameTimes,
            e.message,
            format!("frames[{}].t_analysis", index),
        ));
    }

    for (i, frame) in signal.frames.iter().enumerate() {
        validate_frame(frame, i, &mut result);
        if frame.t_analysis > signal.original_duration_s {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidFrame,
                format!(
                    "frame at {} lies beyond signal end {}",
                    frame.t_analysis, signal.original_duration_s
                ),
                format!("frames[{}].t_analysis", i),
            ));
        }
    }

    let fs = signal.fs();
    for (i, seg) in signal.transient_segments().iter().enumerate() {
        let path = format!("transients[{}]", i);
        if let Err(e) = validate_non_negative("start_s", seg.start_s) {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidTransient,
                e.message,
                path.clone(),
            ));
        }
        if seg.waveform.is_empty() {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidTransient,
                "transient waveform is empty",
                path.clone(),
            ));
        }
        if fs > 0.0 && seg.start_s > signal.original_duration_s {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidTransient,
                format!(
                    "transient starts at {} beyond signal end {}",
                    seg.start_s, signal.original_duration_s
                ),
                path,
            ));
        }
    }

    result
}

fn validate_frame(frame: &SpeechFrame, index: usize, result: &mut ValidationResult) {
    let path = format!("frames[{}]", index);

    let checks: [(&str, f64); 3] = [
        ("t_analysis", frame.t_analysis),
        ("f0_hz", frame.f0_hz),
        ("max_voicing_freq_hz", frame.max_voicing_freq_hz),
    ];
    for (name, value) in checks {
        if let Err(e) = validate_non_negative(name, value) {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidFrame,
                e.message,
                format!("{}.{}", path, name),
            ));
        }
    }

    if frame.harmonics.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidFrame,
            "harmonic amplitudes must be finite",
            format!("{}.harmonics", path),
        ));
    }

    if frame.f0_hz > 0.0 && frame.harmonics.is_empty() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::VoicedWithoutHarmonics,
            "frame has an F0 but no harmonic amplitudes",
            path,
        ));
    }
}

/// Validates a prosody modification request.
pub fn validate_prosody(spec: &ProsodyModificationSpec) -> ValidationResult {
    let mut result = ValidationResult::success();
    validate_curve(
        "time_scale",
        &spec.time_scale_factors,
        &spec.time_scale_times,
        &mut result,
    );
    validate_curve(
        "pitch_scale",
        &spec.pitch_scale_factors,
        &spec.pitch_scale_times,
        &mut result,
    );
    result
}

fn validate_curve(name: &str, factors: &[f64], times: &[f64], result: &mut ValidationResult) {
    let constant = factors.len() <= 1 && times.is_empty();
    if !constant && factors.len() != times.len() {
        result.add_error(ValidationError::with_path(
            ErrorCode::MismatchedControlArrays,
            format!(
                "{} factors ({}) and times ({}) differ in length",
                name,
                factors.len(),
                times.len()
            ),
            format!("{}_times", name),
        ));
    }

    for (i, &f) in factors.iter().enumerate() {
        if let Err(e) = validate_positive("scale factor", f) {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidScaleFactor,
                e.message,
                format!("{}_factors[{}]", name, i),
            ));
        }
    }

    for pair in times.windows(2) {
        if (pair[1] - pair[0]).abs() < 1e-10 {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::CoincidentControlPoints,
                format!("two {} control points share time {}", name, pair[0]),
                format!("{}_times", name),
            ));
        }
    }
}

fn param_error(result: &mut ValidationResult, path: &str, err: CommonValidationError) {
    result.add_error(ValidationError::with_path(
        ErrorCode::InvalidParam,
        err.message,
        path,
    ));
}

fn validate_cepstrum_params(prefix: &str, params: &CepstrumParams, result: &mut ValidationResult) {
    if params.order == 0 {
        param_error(
            result,
            &format!("{}.order", prefix),
            CommonValidationError::new("cepstrum order must be at least 1"),
        );
    }
    if let Err(e) = validate_non_negative("lambda", params.lambda) {
        param_error(result, &format!("{}.lambda", prefix), e);
    }
}

/// Validates analysis parameters.
pub fn validate_analyzer_params(params: &AnalyzerParams) -> ValidationResult {
    let mut result = ValidationResult::success();

    let positives: [(&str, f64); 6] = [
        ("window_size_s", params.window_size_s),
        ("skip_size_s", params.skip_size_s),
        ("f0_min_hz", params.f0_min_hz),
        ("f0_max_hz", params.f0_max_hz),
        ("harmonic_extraction_periods", params.harmonic_extraction_periods),
        ("noise_window_s", params.noise_window_s),
    ];
    for (name, value) in positives {
        if let Err(e) = validate_positive(name, value) {
            param_error(&mut result, name, e);
        }
    }

    if params.f0_min_hz >= params.f0_max_hz {
        result.add_error(ValidationError::with_path(
            ErrorCode::InconsistentParams,
            format!(
                "f0_min_hz ({}) must be below f0_max_hz ({})",
                params.f0_min_hz, params.f0_max_hz
            ),
            "f0_min_hz",
        ));
    }
    if params.min_harmonics_for_mvf > params.max_harmonics_for_mvf {
        result.add_error(ValidationError::with_path(
            ErrorCode::InconsistentParams,
            "min_harmonics_for_mvf exceeds max_harmonics_for_mvf",
            "min_harmonics_for_mvf",
        ));
    }
    if params.num_harmonics_for_voicing == 0 {
        param_error(
            &mut result,
            "num_harmonics_for_voicing",
            CommonValidationError::new("num_harmonics_for_voicing must be at least 1"),
        );
    }
    if let Err(e) = validate_unit_interval("voicing_band_epsilon", params.voicing_band_epsilon) {
        param_error(&mut result, "voicing_band_epsilon", e);
    }
    if let Err(e) = validate_range(
        "harmonic_deviation_percent",
        params.harmonic_deviation_percent,
        0.0,
        100.0,
    ) {
        param_error(&mut result, "harmonic_deviation_percent", e);
    }
    if let Err(e) = validate_positive("max_period_error", params.max_period_error) {
        param_error(&mut result, "max_period_error", e);
    }
    if params.voicing_median_filter_len == 0 || params.mvf_median_filter_len == 0 {
        param_error(
            &mut result,
            "voicing_median_filter_len",
            CommonValidationError::new("median filter lengths must be at least 1"),
        );
    }
    validate_cepstrum_params("cepstrum", &params.cepstrum, &mut result);

    result
}

/// Validates synthesis parameters.
pub fn validate_synthesis_params(params: &SynthesisParams) -> ValidationResult {
    let mut result = ValidationResult::success();

    let non_negatives: [(&str, f64); 3] = [
        ("harmonic_overlap_s", params.harmonic_overlap_s),
        ("unvoiced_voiced_transition_s", params.unvoiced_voiced_transition_s),
        ("noise_transition_overlap_s", params.noise_transition_overlap_s),
    ];
    for (name, value) in non_negatives {
        if let Err(e) = validate_non_negative(name, value) {
            param_error(&mut result, name, e);
        }
    }
    if let Err(e) = validate_positive("noise_window_s", params.noise_window_s) {
        param_error(&mut result, "noise_window_s", e);
    }

    let unit: [(&str, f64); 3] = [
        ("noise_envelope_start", params.noise_envelope_start),
        ("noise_envelope_end", params.noise_envelope_end),
        ("noise_envelope_floor", params.noise_envelope_floor),
    ];
    for (name, value) in unit {
        if let Err(e) = validate_unit_interval(name, value) {
            param_error(&mut result, name, e);
        }
    }
    if params.noise_envelope_start >= params.noise_envelope_end {
        result.add_error(ValidationError::with_path(
            ErrorCode::InconsistentParams,
            "noise_envelope_start must precede noise_envelope_end",
            "noise_envelope_start",
        ));
    }
    if let Err(e) = validate_range("noise_preemphasis", params.noise_preemphasis, 0.0, 0.99) {
        param_error(&mut result, "noise_preemphasis", e);
    }
    validate_cepstrum_params("cepstrum", &params.cepstrum, &mut result);

    result
}

#[cfg(test)]
mod tests;
