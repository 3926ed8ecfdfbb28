//! Composition of harmonic, noise, and transient parts into PCM.

use tracing::{debug, warn};

use hnm_model::{
    validate_signal, validate_synthesis_params, ProsodyModificationSpec, SpeechSignal, SynthesisParams,
};

use crate::error::SynthResult;
use crate::modification::ProsodyTimeWarper;
use crate::synthesis::{place_transients, synthesize_noise, HarmonicSynthesizer};

/// Parts and sum of a synthesized signal, all of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSignal {
    /// Periodic part.
    pub harmonic: Vec<f64>,
    /// Aperiodic part.
    pub noise: Vec<f64>,
    /// Transient waveforms at their start samples.
    pub transient: Vec<f64>,
    /// Sample-wise sum of the parts.
    pub output: Vec<f64>,
}

impl SynthesizedSignal {
    fn silent(len: usize) -> Self {
        Self {
            harmonic: vec![0.0; len],
            noise: vec![0.0; len],
            transient: vec![0.0; len],
            output: vec![0.0; len],
        }
    }

    /// Number of output samples.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// Returns true for an empty output.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }
}

/// Batch and streaming synthesis of HNM signals.
#[derive(Debug, Clone)]
pub struct SignalCompositor {
    params: SynthesisParams,
}

impl SignalCompositor {
    /// Creates a compositor after validating its parameters.
    pub fn new(params: SynthesisParams) -> SynthResult<Self> {
        validate_synthesis_params(&params).into_result()?;
        Ok(Self { params })
    }

    /// Synthesis parameters.
    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }

    /// Synthesizes every part of `signal` and sums them.
    ///
    /// A signal with fewer than two frames synthesizes to silence.
    pub fn synthesize(&self, signal: &SpeechSignal) -> SynthResult<SynthesizedSignal> {
        for warning in validate_signal(signal).into_result()? {
            warn!(%warning, "synthesizing despite warning");
        }
        let len = signal.output_len();
        if signal.len() < 2 {
            return Ok(SynthesizedSignal::silent(len));
        }

        let harmonic = HarmonicSynthesizer::new(signal.clone(), self.params.clone()).synthesize_all();
        let noise = synthesize_noise(signal, &self.params);
        let transient = place_transients(signal);
        // same association as the stream, which pre-mixes noise and transients
        let output = harmonic
            .iter()
            .zip(noise.iter().zip(&transient))
            .map(|(h, (n, t))| h + (n + t))
            .collect();

        debug!(frames = signal.len(), samples = len, "signal synthesized");
        Ok(SynthesizedSignal {
            harmonic,
            noise,
            transient,
            output,
        })
    }

    /// Applies `spec` with a warper sharing these parameters, then synthesizes.
    pub fn modify_and_synthesize(
        &self,
        signal: &SpeechSignal,
        spec: &ProsodyModificationSpec,
    ) -> SynthResult<SynthesizedSignal> {
        let modified = ProsodyTimeWarper::new(self.params.clone()).modify(signal, spec)?;
        self.synthesize(&modified)
    }

    /// Opens an incremental synthesis stream over `signal`.
    pub fn stream(&self, signal: SpeechSignal) -> SynthResult<SynthesisStream> {
        validate_signal(&signal).into_result()?;
        Ok(SynthesisStream::new(signal, self.params.clone()))
    }
}

/// Lifecycle of a [`SynthesisStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Nothing produced yet.
    Idle,
    /// Chunks are being produced.
    Streaming,
    /// All samples have been emitted.
    Finished,
}

/// Incremental synthesis: yields output chunks as harmonic frames resolve.
///
/// The aperiodic and transient parts are rendered once, on the first
/// request, and mixed into each harmonic chunk. Concatenating every chunk
/// reproduces the batch output.
#[derive(Debug, Clone)]
pub struct SynthesisStream {
    harmonic: HarmonicSynthesizer,
    params: SynthesisParams,
    aperiodic: Vec<f64>,
    state: StreamState,
    emitted: usize,
}

impl SynthesisStream {
    fn new(signal: SpeechSignal, params: SynthesisParams) -> Self {
        Self {
            harmonic: HarmonicSynthesizer::new(signal, params.clone()),
            params,
            aperiodic: Vec::new(),
            state: StreamState::Idle,
            emitted: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Samples emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Restarts the stream from the first frame.
    pub fn reset(&mut self) {
        self.harmonic.reset();
        self.aperiodic.clear();
        self.state = StreamState::Idle;
        self.emitted = 0;
    }

    /// Produces the next chunk, or `None` once the stream is finished.
    pub fn next_chunk(&mut self) -> Option<Vec<f64>> {
        match self.state {
            StreamState::Finished => return None,
            StreamState::Idle => {
                let signal = self.harmonic.signal();
                let len = signal.output_len();
                if signal.len() < 2 {
                    self.state = StreamState::Finished;
                    self.emitted = len;
                    return Some(vec![0.0; len]);
                }
                let noise = synthesize_noise(signal, &self.params);
                let transient = place_transients(signal);
                self.aperiodic = noise.iter().zip(&transient).map(|(n, t)| n + t).collect();
                self.state = StreamState::Streaming;
                debug!(samples = len, "stream started");
            }
            StreamState::Streaming => {}
        }

        while self.harmonic.next_frame_available() {
            let chunk = match self.harmonic.synthesize_next() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "harmonic stream ended early");
                    break;
                }
            };
            let start = self.emitted;
            self.emitted += chunk.len();
            if !self.harmonic.next_frame_available() {
                self.state = StreamState::Finished;
                debug!(samples = self.emitted, "stream finished");
            }
            let mixed = chunk
                .iter()
                .zip(&self.aperiodic[start..self.emitted])
                .map(|(h, a)| h + a)
                .collect();
            return Some(mixed);
        }
        self.state = StreamState::Finished;
        None
    }
}

impl Iterator for SynthesisStream {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnm_model::{NoiseModel, SpeechFrame, TransientSegment};
    use num_complex::Complex64;
    use pretty_assertions::assert_eq;

    fn mixed_signal() -> SpeechSignal {
        let frames = (0..12)
            .map(|i| {
                let t = 0.01 * (i + 1) as f64;
                let noise = NoiseModel::Lpc {
                    coeffs: vec![0.4],
                    gain: 1.0,
                    original_std: 0.02,
                };
                if i < 6 {
                    let mut f = SpeechFrame::voiced(t, 140.0, vec![Complex64::new(0.3, 0.1); 6]);
                    f.max_voicing_freq_hz = 3000.0;
                    f.with_noise(noise)
                } else {
                    SpeechFrame::unvoiced(t).with_noise(noise)
                }
            })
            .collect();
        SpeechSignal::new(16000, 0.13, frames)
            .with_transients(vec![TransientSegment::new(0.125, vec![0.5; 16])])
    }

    #[test]
    fn test_batch_sums_parts() {
        let compositor = SignalCompositor::new(SynthesisParams::default()).unwrap();
        let out = compositor.synthesize(&mixed_signal()).unwrap();
        assert_eq!(out.len(), 2081);
        for i in 0..out.len() {
            let sum = out.harmonic[i] + out.noise[i] + out.transient[i];
            assert!((out.output[i] - sum).abs() < 1e-12);
        }
        assert!(out.harmonic.iter().any(|&v| v != 0.0));
        assert!(out.noise.iter().any(|&v| v != 0.0));
        assert_eq!(out.transient[2000], 0.5);
    }

    #[test]
    fn test_single_frame_is_silent() {
        let compositor = SignalCompositor::new(SynthesisParams::default()).unwrap();
        let signal = SpeechSignal::new(16000, 0.02, vec![SpeechFrame::unvoiced(0.01)]);
        let out = compositor.synthesize(&signal).unwrap();
        assert_eq!(out.len(), 321);
        assert!(out.output.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_stream_matches_batch() {
        let compositor = SignalCompositor::new(SynthesisParams::default()).unwrap();
        let signal = mixed_signal();
        let batch = compositor.synthesize(&signal).unwrap().output;

        let mut stream = compositor.stream(signal).unwrap();
        assert_eq!(stream.state(), StreamState::Idle);
        let first = stream.next_chunk().unwrap();
        assert_eq!(stream.state(), StreamState::Streaming);
        let mut streamed = first;
        for chunk in stream.by_ref() {
            streamed.extend(chunk);
        }
        assert_eq!(stream.state(), StreamState::Finished);
        assert_eq!(stream.next_chunk(), None);
        assert_eq!(streamed.len(), batch.len());
        for (a, b) in streamed.iter().zip(&batch) {
            assert!((a - b).abs() < 1e-12);
        }

        stream.reset();
        assert_eq!(stream.state(), StreamState::Idle);
        let again: Vec<f64> = stream.flatten().collect();
        assert_eq!(again.len(), batch.len());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = SynthesisParams {
            noise_window_s: 0.0,
            ..Default::default()
        };
        assert!(SignalCompositor::new(params).is_err());
    }

    #[test]
    fn test_frames_past_duration_rejected() {
        let compositor = SignalCompositor::new(SynthesisParams::default()).unwrap();
        let late = |t: f64| SpeechFrame::voiced(t, 120.0, vec![Complex64::new(0.4, 0.0); 5]);
        let signal = SpeechSignal::new(16000, 0.1, vec![late(0.20), late(0.21)]);
        assert_eq!(compositor.synthesize(&signal).unwrap_err().code(), "HNM_001");
        assert!(compositor.stream(signal).is_err());
    }

    #[test]
    fn test_invalid_signal_rejected() {
        let compositor = SignalCompositor::new(SynthesisParams::default()).unwrap();
        let signal = SpeechSignal::new(0, 0.1, vec![SpeechFrame::unvoiced(0.01)]);
        assert_eq!(compositor.synthesize(&signal).unwrap_err().code(), "HNM_001");
    }
}
