//! Tests for signal, modification, and parameter validation.

use super::*;
use crate::frame::NoiseModel;
use crate::signal::TransientSegment;
use num_complex::Complex64;
use pretty_assertions::assert_eq;

fn frames(times: &[f64]) -> Vec<SpeechFrame> {
    times
        .iter()
        .map(|&t| SpeechFrame::voiced(t, 120.0, vec![Complex64::new(1.0, 0.0); 3]))
        .collect()
}

fn codes(result: &ValidationResult) -> Vec<ErrorCode> {
    result.errors.iter().map(|e| e.code).collect()
}

// ============================================================================
// Signal Validation
// ============================================================================

#[test]
fn test_valid_signal_passes() {
    let signal = SpeechSignal::new(16000, 0.05, frames(&[0.01, 0.02, 0.03]));
    let result = validate_signal(&signal);
    assert!(result.is_ok(), "{:?}", result.errors);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_zero_sampling_rate_and_empty_frames() {
    let signal = SpeechSignal::new(0, 0.05, Vec::new());
    let result = validate_signal(&signal);
    assert_eq!(
        codes(&result),
        vec![ErrorCode::InvalidSamplingRate, ErrorCode::EmptySignal]
    );
}

#[test]
fn test_non_monotonic_times_reported_with_path() {
    let signal = SpeechSignal::new(16000, 0.05, frames(&[0.01, 0.03, 0.03]));
    let result = validate_signal(&signal);
    assert_eq!(codes(&result), vec![ErrorCode::NonMonotonicFrameTimes]);
    assert_eq!(
        result.errors[0].path.as_deref(),
        Some("frames[2].t_analysis")
    );
}

#[test]
fn test_single_frame_warns() {
    let signal = SpeechSignal::new(16000, 0.05, frames(&[0.01]));
    let result = validate_signal(&signal);
    assert!(result.is_ok());
    assert_eq!(result.warnings[0].code, WarningCode::TooFewFrames);
}

#[test]
fn test_negative_f0_rejected() {
    let mut fr = frames(&[0.01, 0.02]);
    fr[1].f0_hz = -3.0;
    let result = validate_signal(&SpeechSignal::new(16000, 0.05, fr));
    assert_eq!(codes(&result), vec![ErrorCode::InvalidFrame]);
}

#[test]
fn test_frames_past_duration_rejected() {
    let signal = SpeechSignal::new(16000, 0.1, frames(&[0.05, 0.20, 0.21]));
    let result = validate_signal(&signal);
    assert_eq!(
        codes(&result),
        vec![ErrorCode::InvalidFrame, ErrorCode::InvalidFrame]
    );
    assert_eq!(
        result.errors[0].path.as_deref(),
        Some("frames[1].t_analysis")
    );
    assert!(result.into_result().is_err());
}

#[test]
fn test_frame_at_duration_accepted() {
    let signal = SpeechSignal::new(16000, 0.1, frames(&[0.05, 0.1]));
    assert!(validate_signal(&signal).is_ok());
}

#[test]
fn test_bad_transients_rejected() {
    let signal = SpeechSignal::new(16000, 0.05, frames(&[0.01, 0.02])).with_transients(vec![
        TransientSegment::new(0.01, Vec::new()),
        TransientSegment::new(0.5, vec![0.1]),
    ]);
    let result = validate_signal(&signal);
    assert_eq!(
        codes(&result),
        vec![ErrorCode::InvalidTransient, ErrorCode::InvalidTransient]
    );
}

#[test]
fn test_voiced_without_harmonics_warns() {
    let mut fr = frames(&[0.01, 0.02]);
    fr[0].harmonics.clear();
    fr[0].noise = NoiseModel::None;
    let result = validate_signal(&SpeechSignal::new(16000, 0.05, fr));
    assert!(result.is_ok());
    assert_eq!(result.warnings[0].code, WarningCode::VoicedWithoutHarmonics);
}

// ============================================================================
// Prosody Validation
// ============================================================================

#[test]
fn test_constant_curves_pass() {
    assert!(validate_prosody(&ProsodyModificationSpec::constant(1.5, 0.8)).is_ok());
    assert!(validate_prosody(&ProsodyModificationSpec::default()).is_ok());
}

#[test]
fn test_curve_length_mismatch() {
    let spec = ProsodyModificationSpec::pitch_curve(vec![1.0, 1.2, 1.4], vec![0.0, 0.5]);
    let result = validate_prosody(&spec);
    assert_eq!(codes(&result), vec![ErrorCode::MismatchedControlArrays]);
}

#[test]
fn test_coincident_control_points_warn() {
    let spec = ProsodyModificationSpec::time_curve(vec![1.0, 2.0], vec![0.3, 0.3]);
    let result = validate_prosody(&spec);
    assert!(result.is_ok());
    assert_eq!(result.warnings[0].code, WarningCode::CoincidentControlPoints);
}

// ============================================================================
// Parameter Validation
// ============================================================================

#[test]
fn test_default_params_valid() {
    assert!(validate_analyzer_params(&AnalyzerParams::default()).is_ok());
    assert!(validate_synthesis_params(&SynthesisParams::default()).is_ok());
}

#[test]
fn test_inverted_f0_range() {
    let params = AnalyzerParams {
        f0_min_hz: 400.0,
        f0_max_hz: 100.0,
        ..Default::default()
    };
    let result = validate_analyzer_params(&params);
    assert_eq!(codes(&result), vec![ErrorCode::InconsistentParams]);
}

#[test]
fn test_synthesis_envelope_range() {
    let params = SynthesisParams {
        noise_envelope_start: 0.9,
        noise_envelope_end: 0.2,
        ..Default::default()
    };
    let result = validate_synthesis_params(&params);
    assert_eq!(codes(&result), vec![ErrorCode::InconsistentParams]);

    let params = SynthesisParams {
        noise_window_s: 0.0,
        ..Default::default()
    };
    let result = validate_synthesis_params(&params);
    assert_eq!(codes(&result), vec![ErrorCode::InvalidParam]);
}
