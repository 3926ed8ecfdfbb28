//! Placement of transient waveforms.

use tracing::debug;

use hnm_model::SpeechSignal;

use crate::dsp::time_to_sample;

/// Copies every transient waveform into a silent buffer at its start sample.
///
/// Transients are placed, not mixed: a later segment overwrites an earlier
/// one where they overlap. Samples falling outside the output are dropped.
pub fn place_transients(signal: &SpeechSignal) -> Vec<f64> {
    let len = signal.output_len();
    let mut out = vec![0.0; len];
    let fs = signal.fs();
    for segment in signal.transient_segments() {
        let start = time_to_sample(segment.start_s, fs);
        for (j, &x) in segment.waveform.iter().enumerate() {
            let n = start + j as i64;
            if n >= 0 && n < len as i64 {
                out[n as usize] = x;
            }
        }
    }
    debug!(segments = signal.transient_segments().len(), "transients placed");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnm_model::{SpeechFrame, TransientSegment};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transient_placed_at_start_sample() {
        let signal = SpeechSignal::new(16000, 0.01, vec![SpeechFrame::unvoiced(0.005)])
            .with_transients(vec![TransientSegment::new(0.001, vec![1.0, 2.0, 3.0])]);
        let out = place_transients(&signal);
        assert_eq!(out.len(), 161);
        assert_eq!(&out[15..19], &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_transient_clipped_at_end() {
        let signal = SpeechSignal::new(16000, 0.001, vec![SpeechFrame::unvoiced(0.0005)])
            .with_transients(vec![TransientSegment::new(0.0009, vec![1.0; 10])]);
        let out = place_transients(&signal);
        assert_eq!(out.len(), 17);
        assert_eq!(out.iter().filter(|&&v| v == 1.0).count(), 3);
    }
}
