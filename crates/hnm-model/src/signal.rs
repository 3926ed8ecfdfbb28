//! Speech signal: an ordered sequence of analysis frames plus optional transients.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::frame::SpeechFrame;
use crate::validation::validate_signal;

/// A short waveform region preserved verbatim during modification.
///
/// The segment owns its samples; cloning a signal deep-copies every segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransientSegment {
    /// Start of the segment in seconds.
    pub start_s: f64,
    /// Raw transient samples.
    pub waveform: Vec<f64>,
}

impl TransientSegment {
    /// Creates a new transient segment.
    pub fn new(start_s: f64, waveform: Vec<f64>) -> Self {
        Self { start_s, waveform }
    }

    /// Length of the segment in samples.
    pub fn duration_in_samples(&self) -> usize {
        self.waveform.len()
    }

    /// Length of the segment in seconds at the given sampling rate.
    pub fn duration_s(&self, sampling_rate_hz: f64) -> f64 {
        self.waveform.len() as f64 / sampling_rate_hz
    }

    /// End of the segment in seconds (exclusive).
    pub fn end_s(&self, sampling_rate_hz: f64) -> f64 {
        self.start_s + self.duration_s(sampling_rate_hz)
    }

    /// Returns true if `t` lies in `[start, end)`.
    pub fn contains(&self, t: f64, sampling_rate_hz: f64) -> bool {
        t >= self.start_s && t < self.end_s(sampling_rate_hz)
    }
}

/// HNM representation of an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechSignal {
    /// Sampling rate in Hz.
    pub sampling_rate_hz: u32,
    /// Duration of the signal the frames describe.
    pub original_duration_s: f64,
    /// Frames with strictly increasing analysis times.
    pub frames: Vec<SpeechFrame>,
    /// Transient segments, if the signal was analysed with transient detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transients: Option<Vec<TransientSegment>>,
}

impl SpeechSignal {
    /// Creates a signal without transients.
    pub fn new(sampling_rate_hz: u32, original_duration_s: f64, frames: Vec<SpeechFrame>) -> Self {
        Self {
            sampling_rate_hz,
            original_duration_s,
            frames,
            transients: None,
        }
    }

    /// Attaches transient segments, builder style.
    pub fn with_transients(mut self, transients: Vec<TransientSegment>) -> Self {
        self.transients = Some(transients);
        self
    }

    /// Sampling rate as a float, for arithmetic.
    pub fn fs(&self) -> f64 {
        f64::from(self.sampling_rate_hz)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Analysis times of all frames.
    pub fn frame_times(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.t_analysis).collect()
    }

    /// Transient segments, empty if none were attached.
    pub fn transient_segments(&self) -> &[TransientSegment] {
        self.transients.as_deref().unwrap_or(&[])
    }

    /// Sets `is_transient` on every frame whose instant lies inside a
    /// transient segment and clears it elsewhere.
    pub fn mark_transient_frames(&mut self) {
        let fs = self.fs();
        let segments = self.transients.as_deref().unwrap_or(&[]);
        for frame in &mut self.frames {
            frame.is_transient = segments.iter().any(|s| s.contains(frame.t_analysis, fs));
        }
    }

    /// Number of PCM samples needed to hold the synthesized signal.
    pub fn output_len(&self) -> usize {
        let last = (self.original_duration_s * self.fs() + 0.5).floor().max(0.0) as usize;
        last + 1
    }

    /// Parses and validates a signal from JSON.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let signal: SpeechSignal = serde_json::from_str(json)?;
        validate_signal(&signal).into_result()?;
        Ok(signal)
    }

    /// Serializes the signal to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
