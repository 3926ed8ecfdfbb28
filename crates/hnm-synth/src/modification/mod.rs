//! Time- and pitch-scale modification of HNM signals.
//!
//! The warper never mutates its input: it resamples the requested control
//! curves onto the analysis frames, neutralizes the time scale over
//! transient segments, maps analysis frames to synthesis instants and
//! rebuilds a new signal from (possibly repeated or skipped) frames.

pub mod curve;
pub mod instants;
pub mod pitch_scale;

pub use curve::ScaleCurve;
pub use instants::{map_instants, InstantMapping};
pub use pitch_scale::scale_frame_pitch;

use tracing::debug;

use hnm_model::{
    validate_signal, ProsodyModificationSpec, SpeechSignal, SynthesisParams, TransientSegment,
};

use crate::error::SynthResult;

/// Everything the warper derives before building the new signal.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpPlan {
    /// Time scale per analysis frame, after transient protection.
    pub time_scales: Vec<f64>,
    /// Pitch scale per analysis frame.
    pub pitch_scales: Vec<f64>,
    /// Time-scale curve used to shift transients.
    pub time_curve: ScaleCurve,
    /// Analysis-to-synthesis instant mapping.
    pub mapping: InstantMapping,
}

/// Applies prosody modification requests to HNM signals.
#[derive(Debug, Clone, Default)]
pub struct ProsodyTimeWarper {
    params: SynthesisParams,
}

impl ProsodyTimeWarper {
    /// Creates a warper; `params` selects how harmonic amplitudes are
    /// resampled under pitch scaling.
    pub fn new(params: SynthesisParams) -> Self {
        Self { params }
    }

    /// Validates the inputs and derives per-frame scales and instants.
    pub fn plan(&self, signal: &SpeechSignal, spec: &ProsodyModificationSpec) -> SynthResult<WarpPlan> {
        spec.check()?;
        validate_signal(signal).into_result()?;

        let fs = signal.fs();
        let frame_times = signal.frame_times();
        let spans: Vec<(f64, f64)> = signal
            .transient_segments()
            .iter()
            .map(|t| (t.start_s, t.end_s(fs)))
            .collect();

        let requested = ScaleCurve::from_controls(&spec.time_scale_factors, &spec.time_scale_times);
        // protection works on the curve as seen by the frame grid
        let grid_curve = ScaleCurve::from_controls(&requested.resample(&frame_times), &frame_times);
        let time_curve = grid_curve.protect_spans(&spans);
        let time_scales = time_curve.resample(&frame_times);

        let pitch_curve = ScaleCurve::from_controls(&spec.pitch_scale_factors, &spec.pitch_scale_times);
        let pitch_scales = pitch_curve.resample(&frame_times);

        let mapping = map_instants(&frame_times, &time_scales, signal.original_duration_s, fs);
        debug!(
            frames = frame_times.len(),
            instants = mapping.len(),
            duration_s = mapping.duration_s,
            transients = spans.len(),
            "synthesis instants mapped"
        );

        Ok(WarpPlan {
            time_scales,
            pitch_scales,
            time_curve,
            mapping,
        })
    }

    /// Produces a new signal realizing `spec`.
    ///
    /// Fails without partial output when the request or the signal is invalid.
    pub fn modify(&self, signal: &SpeechSignal, spec: &ProsodyModificationSpec) -> SynthResult<SpeechSignal> {
        let plan = self.plan(signal, spec)?;
        let fs = signal.fs();

        let frames = plan
            .mapping
            .source_frames
            .iter()
            .zip(&plan.mapping.times)
            .map(|(&src, &t)| {
                let source = &signal.frames[src];
                let mut frame = if source.is_transient {
                    source.clone()
                } else {
                    scale_frame_pitch(source, plan.pitch_scales[src], fs, &self.params)
                };
                frame.t_analysis = t;
                frame
            })
            .collect();

        let transients = signal.transients.as_ref().map(|segments| {
            segments
                .iter()
                .map(|seg| TransientSegment::new(plan.time_curve.time_scaled_time(seg.start_s), seg.waveform.clone()))
                .collect()
        });

        Ok(SpeechSignal {
            sampling_rate_hz: signal.sampling_rate_hz,
            original_duration_s: plan.mapping.duration_s,
            frames,
            transients,
        })
    }
}
