//! Phase-continuous harmonic synthesis.
//!
//! Every harmonic number `k` forms a track across frames. Between two
//! analysis instants a track is rendered as a sinusoid whose amplitude is
//! interpolated linearly and whose phase is interpolated linearly after
//! unwrapping the end phase to the cycle count implied by the mean F0.
//! Tracks that start get a short half-Hamming ramp before their first
//! instant; tracks that stop decay to zero over their last segment.

use std::f64::consts::PI;

use tracing::{debug, trace};

use hnm_model::{AmplitudeSource, SpeechSignal, SynthesisParams};

use crate::cepstrum::RegularizedCepstrum;
use crate::dsp::time_to_sample;
use crate::dsp::window::{half_hamming, hamming, normalize_peak};
use crate::error::{SynthError, SynthResult};

/// Shortest segment that is rendered, in seconds.
const MIN_SEGMENT_S: f64 = 1e-10;

/// Role of a frame for one harmonic track, from the neighbouring frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Track present before, at, and after the frame.
    Interior,
    /// Track starts at this frame.
    Onset,
    /// Track ends after this frame.
    Offset,
    /// Track exists only at this frame.
    Isolated,
    /// Track absent at this frame.
    Silent,
}

impl TrackState {
    /// Classifies a frame from the presence of the track in the previous,
    /// current, and next frames.
    pub fn classify(prev: bool, current: bool, next: bool) -> Self {
        match (prev, current, next) {
            (_, false, _) => TrackState::Silent,
            (true, true, true) => TrackState::Interior,
            (false, true, true) => TrackState::Onset,
            (true, true, false) => TrackState::Offset,
            (false, true, false) => TrackState::Isolated,
        }
    }

    /// Track has no predecessor and needs a ramp-in.
    pub fn starts(self) -> bool {
        matches!(self, TrackState::Onset | TrackState::Isolated)
    }

    /// Track continues into the next frame.
    pub fn continues(self) -> bool {
        matches!(self, TrackState::Interior | TrackState::Onset)
    }
}

/// One rendered piece of a harmonic track between two instants.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSegment {
    /// Harmonic number, starting at 1.
    pub harmonic: usize,
    /// Track role at the segment's starting frame.
    pub state: TrackState,
    /// Segment start in seconds.
    pub t_start: f64,
    /// Segment end in seconds.
    pub t_end: f64,
    /// Amplitude at `t_start`.
    pub amp_start: f64,
    /// Amplitude at `t_end`.
    pub amp_end: f64,
    /// Phase at `t_start`.
    pub phase_start: f64,
    /// Phase at `t_end`, unwrapped relative to `phase_start`.
    pub phase_end: f64,
    /// F0 of the starting frame, used to extrapolate the ramp-in.
    pub f0_hz: f64,
}

impl TrackSegment {
    /// Segment length in seconds.
    pub fn duration(&self) -> f64 {
        self.t_end - self.t_start
    }

    /// Instantaneous phase at `t`.
    pub fn phase_at(&self, t: f64) -> f64 {
        self.phase_start + (self.phase_end - self.phase_start) * (t - self.t_start) / self.duration()
    }

    /// Amplitude at `t`, held at the boundary values outside the segment.
    pub fn amplitude_at(&self, t: f64) -> f64 {
        let u = ((t - self.t_start) / self.duration()).clamp(0.0, 1.0);
        self.amp_start + (self.amp_end - self.amp_start) * u
    }

    /// Mean frequency of the segment in Hz.
    pub fn frequency_hz(&self) -> f64 {
        (self.phase_end - self.phase_start) / (2.0 * PI * self.duration())
    }

    /// Sample value at `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        self.amplitude_at(t) * self.phase_at(t).cos()
    }
}

/// Per-frame amplitudes and phases of every harmonic.
#[derive(Debug, Clone, PartialEq)]
struct FrameTracks {
    f0_hz: f64,
    amplitudes: Vec<f64>,
    phases: Vec<f64>,
}

impl FrameTracks {
    fn has(&self, k: usize) -> bool {
        k >= 1 && k <= self.amplitudes.len()
    }
}

fn frame_tracks(signal: &SpeechSignal, params: &SynthesisParams) -> Vec<FrameTracks> {
    let fs = signal.fs();
    signal
        .frames
        .iter()
        .map(|frame| {
            if !frame.is_voiced() || frame.is_transient {
                return FrameTracks {
                    f0_hz: frame.f0_hz,
                    amplitudes: Vec::new(),
                    phases: Vec::new(),
                };
            }
            let magnitudes = frame.harmonic_magnitudes();
            let amplitudes = match params.amplitude_source {
                AmplitudeSource::Direct => magnitudes,
                AmplitudeSource::Cepstrum => {
                    match RegularizedCepstrum::from_harmonics(&magnitudes, frame.f0_hz, fs, &params.cepstrum) {
                        Some(cep) => (1..=magnitudes.len())
                            .map(|k| cep.evaluate(k as f64 * frame.f0_hz))
                            .collect(),
                        None => magnitudes,
                    }
                }
            };
            FrameTracks {
                f0_hz: frame.f0_hz,
                amplitudes,
                phases: frame.harmonics.iter().map(|c| c.arg()).collect(),
            }
        })
        .collect()
}

/// Plans the segment of harmonic `k` that starts at frame `index`.
///
/// Returns `None` when the frame does not carry the track or the segment is
/// empty.
fn plan_from_tracks(
    tracks: &[FrameTracks],
    times: &[f64],
    duration_s: f64,
    index: usize,
    k: usize,
) -> Option<TrackSegment> {
    let cur = &tracks[index];
    if !cur.has(k) {
        return None;
    }
    let prev = index.checked_sub(1).map_or(false, |p| tracks[p].has(k));
    let next_frame = tracks.get(index + 1);
    let next = next_frame.map_or(false, |n| n.has(k));
    let state = TrackState::classify(prev, true, next);

    let t_start = times[index];
    let t_end = times.get(index + 1).copied().unwrap_or(duration_s);
    let dt = t_end - t_start;
    if dt < MIN_SEGMENT_S {
        return None;
    }

    let amp_start = cur.amplitudes[k - 1];
    let phase_start = cur.phases[k - 1];
    let kf = k as f64;

    let (amp_end, phase_end, f0_avg) = match next_frame {
        Some(n) if next => (
            n.amplitudes[k - 1],
            n.phases[k - 1],
            0.5 * (cur.f0_hz + n.f0_hz),
        ),
        _ => (0.0, phase_start + 2.0 * PI * kf * cur.f0_hz * dt, cur.f0_hz),
    };

    let estimate = phase_start + 2.0 * PI * kf * f0_avg * dt;
    let cycles = ((estimate - phase_end) / (2.0 * PI) + 0.5).floor();

    Some(TrackSegment {
        harmonic: k,
        state,
        t_start,
        t_end,
        amp_start,
        amp_end,
        phase_start,
        phase_end: phase_end + 2.0 * PI * cycles,
        f0_hz: cur.f0_hz,
    })
}

/// Plans every segment of harmonic `k` across the signal.
///
/// Exposed for inspecting phase and amplitude trajectories without rendering.
pub fn plan_track(signal: &SpeechSignal, params: &SynthesisParams, k: usize) -> Vec<TrackSegment> {
    let tracks = frame_tracks(signal, params);
    let times = signal.frame_times();
    (0..tracks.len())
        .filter_map(|i| plan_from_tracks(&tracks, &times, signal.original_duration_s, i, k))
        .collect()
}

/// Accumulation buffers for rendered segments.
#[derive(Debug, Clone)]
enum Accumulator {
    /// Segments of one track never overlap, so all tracks share one sum.
    Direct(Vec<f64>),
    /// Per-track weighted sums and weights.
    Overlapping {
        len: usize,
        tracks: Vec<(Vec<f64>, Vec<f64>)>,
    },
}

impl Accumulator {
    fn new(len: usize, overlapping: bool) -> Self {
        if overlapping {
            Accumulator::Overlapping {
                len,
                tracks: Vec::new(),
            }
        } else {
            Accumulator::Direct(vec![0.0; len])
        }
    }

    fn track_mut(tracks: &mut Vec<(Vec<f64>, Vec<f64>)>, len: usize, k: usize) -> &mut (Vec<f64>, Vec<f64>) {
        while tracks.len() < k {
            tracks.push((vec![0.0; len], vec![0.0; len]));
        }
        &mut tracks[k - 1]
    }

    /// Sum of all tracks over `[start, end]`, weights divided out.
    fn mix(&self, start: usize, end: usize) -> Vec<f64> {
        match self {
            Accumulator::Direct(buf) => buf[start..=end].to_vec(),
            Accumulator::Overlapping { tracks, .. } => {
                let mut out = vec![0.0; end + 1 - start];
                for (samples, weights) in tracks {
                    for (o, n) in out.iter_mut().zip(start..=end) {
                        if weights[n] > 0.0 {
                            *o += samples[n] / weights[n];
                        }
                    }
                }
                out
            }
        }
    }
}

/// Streaming harmonic synthesizer over one signal.
///
/// Frames are processed one at a time with [`synthesize_next`]; completed
/// samples are released by [`generate_output`] once enough lookahead frames
/// have been processed. The synthesizer owns its signal and is not meant to
/// be shared between threads.
///
/// [`synthesize_next`]: HarmonicSynthesizer::synthesize_next
/// [`generate_output`]: HarmonicSynthesizer::generate_output
#[derive(Debug, Clone)]
pub struct HarmonicSynthesizer {
    signal: SpeechSignal,
    params: SynthesisParams,
    tracks: Vec<FrameTracks>,
    times: Vec<f64>,
    ramp_in: Vec<f64>,
    output_len: usize,
    accumulator: Accumulator,
    current: usize,
    emitted: usize,
}

impl HarmonicSynthesizer {
    /// Prepares synthesis of `signal`.
    pub fn new(signal: SpeechSignal, params: SynthesisParams) -> Self {
        let fs = signal.fs();
        let tracks = frame_tracks(&signal, &params);
        let times = signal.frame_times();
        let ramp_len = time_to_sample(params.unvoiced_voiced_transition_s, fs).max(0) as usize;
        let (ramp_in, _) = half_hamming(ramp_len);
        let output_len = signal.output_len();
        let accumulator = Accumulator::new(output_len, params.overlapping_harmonic_synthesis);
        Self {
            signal,
            params,
            tracks,
            times,
            ramp_in,
            output_len,
            accumulator,
            current: 0,
            emitted: 0,
        }
    }

    /// The signal being synthesized.
    pub fn signal(&self) -> &SpeechSignal {
        &self.signal
    }

    /// Total number of output samples.
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Clears all buffers and restarts from the first frame.
    pub fn reset(&mut self) {
        self.accumulator = Accumulator::new(self.output_len, self.params.overlapping_harmonic_synthesis);
        self.current = 0;
        self.emitted = 0;
    }

    /// Whether another frame remains to be processed.
    pub fn next_frame_available(&self) -> bool {
        self.current < self.tracks.len()
    }

    /// Index of the next frame to process.
    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Number of samples already released.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Processes the next frame and returns any samples that became final.
    ///
    /// Processing the last frame flushes the remainder of the output.
    pub fn synthesize_next(&mut self) -> SynthResult<Option<Vec<f64>>> {
        if !self.next_frame_available() {
            return Err(SynthError::StreamExhausted {
                index: self.current,
                total: self.tracks.len(),
            });
        }
        self.process_frame(self.current);
        self.current += 1;

        let flush = !self.next_frame_available();
        if !flush && self.current <= self.params.frames_to_accumulate {
            return Ok(None);
        }
        let chunk = self.generate_output(flush);
        Ok(if chunk.is_empty() { None } else { Some(chunk) })
    }

    /// Releases samples up to the current pipeline end, or everything left
    /// when `flush_all` is set, and advances the emitted cursor.
    pub fn generate_output(&mut self, flush_all: bool) -> Vec<f64> {
        if self.output_len == 0 || self.emitted >= self.output_len {
            return Vec::new();
        }
        let end = if flush_all {
            self.output_len - 1
        } else {
            let Some(frame) = self.current.checked_sub(self.params.frames_to_accumulate.max(1)) else {
                return Vec::new();
            };
            let fs = self.signal.fs();
            // unprocessed frames can still reach back by a ramp or an overlap
            let horizon = match self.times.get(self.current) {
                Some(&t) => time_to_sample(t, fs) - self.reach_back(),
                None => i64::MAX,
            };
            let pipe_end = time_to_sample(self.times[frame], fs).min(horizon) - 1;
            if pipe_end < 0 {
                return Vec::new();
            }
            (pipe_end as usize).min(self.output_len - 1)
        };
        if end < self.emitted {
            return Vec::new();
        }
        let chunk = self.accumulator.mix(self.emitted, end);
        self.emitted = end + 1;
        trace!(samples = chunk.len(), emitted = self.emitted, "harmonic output released");
        chunk
    }

    /// Samples before its first instant that a frame may still write to.
    fn reach_back(&self) -> i64 {
        let ramp = self.ramp_in.len() as i64;
        if self.params.overlapping_harmonic_synthesis {
            ramp.max(time_to_sample(self.params.harmonic_overlap_s, self.signal.fs()))
        } else {
            ramp
        }
    }

    /// Synthesizes the whole harmonic part from scratch.
    pub fn synthesize_all(&mut self) -> Vec<f64> {
        self.reset();
        while self.next_frame_available() {
            self.process_frame(self.current);
            self.current += 1;
        }
        let out = self.generate_output(true);
        debug!(
            frames = self.tracks.len(),
            samples = out.len(),
            overlapping = self.params.overlapping_harmonic_synthesis,
            "harmonic part synthesized"
        );
        out
    }

    fn process_frame(&mut self, index: usize) {
        let num_tracks = self.tracks[index].amplitudes.len();
        for k in 1..=num_tracks {
            if let Some(segment) =
                plan_from_tracks(&self.tracks, &self.times, self.signal.original_duration_s, index, k)
            {
                self.render(&segment);
            }
        }
        trace!(frame = index, tracks = num_tracks, "harmonic frame processed");
    }

    fn render(&mut self, seg: &TrackSegment) {
        let fs = self.signal.fs();
        let len = self.output_len as i64;
        let mut n_start = time_to_sample(seg.t_start, fs).max(0);
        let mut n_end = time_to_sample(seg.t_end, fs).min(len);

        let ramp_len = self.ramp_in.len() as i64;
        let ramp_start = (n_start - ramp_len).max(0);
        let ramp: Vec<(usize, f64)> = if seg.state.starts() {
            (ramp_start..n_start.min(len))
                .map(|n| {
                    let t = n as f64 / fs;
                    let w = self.ramp_in[(n - (n_start - ramp_len)) as usize];
                    let phase = seg.phase_start + 2.0 * PI * seg.harmonic as f64 * seg.f0_hz * (t - seg.t_start);
                    (n as usize, seg.amp_start * w * phase.cos())
                })
                .collect()
        } else {
            Vec::new()
        };

        match &mut self.accumulator {
            Accumulator::Direct(buf) => {
                for (n, v) in ramp {
                    buf[n] += v;
                }
                for n in n_start..n_end {
                    buf[n as usize] += seg.value_at(n as f64 / fs);
                }
            }
            Accumulator::Overlapping { len: total, tracks } => {
                let (samples, weights) = Accumulator::track_mut(tracks, *total, seg.harmonic);
                for (n, v) in ramp {
                    samples[n] += v;
                    weights[n] += 1.0;
                }
                let overlap = time_to_sample(self.params.harmonic_overlap_s, fs);
                if !seg.state.starts() {
                    n_start = (n_start - overlap).max(0);
                }
                if seg.state.continues() {
                    n_end = (n_end + overlap).min(len);
                }
                if n_end <= n_start {
                    return;
                }
                let mut window = hamming((n_end - n_start) as usize);
                normalize_peak(&mut window, 1.0);
                for (n, w) in (n_start..n_end).zip(window) {
                    let idx = n as usize;
                    samples[idx] += w * seg.value_at(n as f64 / fs);
                    weights[idx] += w;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnm_model::SpeechFrame;
    use num_complex::Complex64;
    use pretty_assertions::assert_eq;

    fn steady_signal(num_frames: usize, f0: f64, num_harmonics: usize) -> SpeechSignal {
        let frames = (0..num_frames)
            .map(|i| {
                let t = 0.01 * (i + 1) as f64;
                let harmonics = (1..=num_harmonics)
                    .map(|k| {
                        let phase = 2.0 * PI * k as f64 * f0 * t;
                        Complex64::from_polar(0.5 / k as f64, phase)
                    })
                    .collect();
                SpeechFrame::voiced(t, f0, harmonics)
            })
            .collect();
        SpeechSignal::new(16000, 0.01 * (num_frames + 1) as f64, frames)
    }

    #[test]
    fn test_track_state_classification() {
        assert_eq!(TrackState::classify(true, true, true), TrackState::Interior);
        assert_eq!(TrackState::classify(false, true, true), TrackState::Onset);
        assert_eq!(TrackState::classify(true, true, false), TrackState::Offset);
        assert_eq!(TrackState::classify(false, true, false), TrackState::Isolated);
        assert_eq!(TrackState::classify(true, false, true), TrackState::Silent);
    }

    #[test]
    fn test_segment_phase_hits_both_boundaries() {
        let signal = steady_signal(6, 137.0, 5);
        let params = SynthesisParams::default();
        for k in 1..=5 {
            let segments = plan_track(&signal, &params, k);
            for pair in segments.windows(2) {
                let left = pair[0].phase_at(pair[0].t_end);
                let right = pair[1].phase_at(pair[1].t_start);
                let diff = (left - right).rem_euclid(2.0 * PI);
                assert!(diff < 1e-9 || 2.0 * PI - diff < 1e-9, "k={} diff={}", k, diff);
                assert!((pair[0].frequency_hz() - k as f64 * 137.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_offset_decays_to_zero() {
        let signal = steady_signal(3, 100.0, 2);
        let segments = plan_track(&signal, &SynthesisParams::default(), 1);
        let last = segments.last().unwrap();
        assert_eq!(last.state, TrackState::Offset);
        assert_eq!(last.amp_end, 0.0);
        assert!((last.frequency_hz() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_steady_tone_matches_reference() {
        let signal = steady_signal(10, 125.0, 3);
        let mut synth = HarmonicSynthesizer::new(signal.clone(), SynthesisParams::default());
        let out = synth.synthesize_all();
        assert_eq!(out.len(), signal.output_len());
        // between the first and last instants the output is the reference tone
        for n in 200..1500 {
            let t = n as f64 / 16000.0;
            let expected: f64 = (1..=3)
                .map(|k| 0.5 / k as f64 * (2.0 * PI * k as f64 * 125.0 * t).cos())
                .sum();
            assert!((out[n] - expected).abs() < 1e-6, "n={} got {} want {}", n, out[n], expected);
        }
    }

    #[test]
    fn test_overlapping_mode_reproduces_steady_tone() {
        let signal = steady_signal(10, 125.0, 3);
        let params = SynthesisParams {
            overlapping_harmonic_synthesis: true,
            ..Default::default()
        };
        let mut synth = HarmonicSynthesizer::new(signal, params);
        let out = synth.synthesize_all();
        for n in 200..1500 {
            let t = n as f64 / 16000.0;
            let expected: f64 = (1..=3)
                .map(|k| 0.5 / k as f64 * (2.0 * PI * k as f64 * 125.0 * t).cos())
                .sum();
            assert!((out[n] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_streaming_matches_batch() {
        let signal = steady_signal(12, 150.0, 4);
        let params = SynthesisParams::default();
        let batch = HarmonicSynthesizer::new(signal.clone(), params.clone()).synthesize_all();

        let mut synth = HarmonicSynthesizer::new(signal, params);
        let mut streamed = Vec::new();
        while synth.next_frame_available() {
            if let Some(chunk) = synth.synthesize_next().unwrap() {
                streamed.extend(chunk);
            }
        }
        assert_eq!(streamed.len(), batch.len());
        for (a, b) in streamed.iter().zip(&batch) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(synth.synthesize_next().unwrap_err().code(), "HNM_004");
    }

    #[test]
    fn test_short_lookahead_with_long_reach_matches_batch() {
        let mut signal = steady_signal(12, 150.0, 4);
        for i in [4, 5] {
            let t = signal.frames[i].t_analysis;
            signal.frames[i] = SpeechFrame::unvoiced(t);
        }
        let variants = [
            SynthesisParams {
                frames_to_accumulate: 1,
                unvoiced_voiced_transition_s: 0.025,
                ..Default::default()
            },
            SynthesisParams {
                frames_to_accumulate: 1,
                overlapping_harmonic_synthesis: true,
                harmonic_overlap_s: 0.03,
                ..Default::default()
            },
        ];
        for params in variants {
            let batch = HarmonicSynthesizer::new(signal.clone(), params.clone()).synthesize_all();
            let mut synth = HarmonicSynthesizer::new(signal.clone(), params);
            let mut streamed = Vec::new();
            while synth.next_frame_available() {
                if let Some(chunk) = synth.synthesize_next().unwrap() {
                    streamed.extend(chunk);
                }
            }
            assert_eq!(streamed, batch);
        }
    }

    #[test]
    fn test_reset_restarts_stream() {
        let signal = steady_signal(5, 150.0, 2);
        let mut synth = HarmonicSynthesizer::new(signal, SynthesisParams::default());
        let first = synth.synthesize_all();
        synth.reset();
        assert_eq!(synth.current_frame(), 0);
        assert_eq!(synth.emitted(), 0);
        assert_eq!(synth.synthesize_all(), first);
    }

    #[test]
    fn test_unvoiced_signal_is_silent() {
        let frames = (1..=4).map(|i| SpeechFrame::unvoiced(0.01 * i as f64)).collect();
        let signal = SpeechSignal::new(16000, 0.05, frames);
        let out = HarmonicSynthesizer::new(signal, SynthesisParams::default()).synthesize_all();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_frames_past_duration_render_nothing() {
        let late = |t: f64| SpeechFrame::voiced(t, 120.0, vec![Complex64::new(0.4, 0.0); 5]);
        let signal = SpeechSignal::new(16000, 0.1, vec![late(0.20), late(0.21)]);
        for overlapping in [false, true] {
            let params = SynthesisParams {
                overlapping_harmonic_synthesis: overlapping,
                ..Default::default()
            };
            let out = HarmonicSynthesizer::new(signal.clone(), params).synthesize_all();
            assert_eq!(out.len(), 1601);
            assert!(out.iter().all(|&v| v == 0.0));
        }
    }
}
