//! Analysis-to-synthesis instant mapping.

/// Tolerance absorbing accumulated rounding in the analysis pointer.
const POINTER_EPSILON: f64 = 1e-9;

/// Synthesis instants derived from a per-frame time-scale curve.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantMapping {
    /// Source analysis frame of every synthesis instant.
    pub source_frames: Vec<usize>,
    /// Synthesis instant times in seconds.
    pub times: Vec<f64>,
    /// Per analysis frame: extra copies emitted (positive) or skipped (-1).
    pub repeat_counts: Vec<i64>,
    /// Time of the terminal instant, i.e. the new signal duration.
    pub duration_s: f64,
}

impl InstantMapping {
    /// Number of synthesis instants.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true when no instant was produced.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Hop following frame `index`.
fn hop_after(frame_times: &[f64], index: usize, duration_s: f64, sampling_rate: f64) -> f64 {
    let n = frame_times.len();
    if index + 1 < n {
        return frame_times[index + 1] - frame_times[index];
    }
    let tail = duration_s - frame_times[index];
    if tail > 0.0 {
        tail
    } else if n >= 2 {
        frame_times[n - 1] - frame_times[n - 2]
    } else {
        1.0 / sampling_rate
    }
}

/// Maps analysis frames to synthesis instants.
///
/// An analysis pointer walks the frame grid in steps of `1/scale`, so a
/// frame with scale above 1 is emitted more than once and a frame with scale
/// below 1 may be skipped. Each emitted instant advances the output clock by
/// its source frame's hop; the clock starts at the time-scaled first
/// instant. A unit curve reproduces the frame times and duration.
pub fn map_instants(frame_times: &[f64], scales: &[f64], duration_s: f64, sampling_rate: f64) -> InstantMapping {
    let n = frame_times.len();
    let mut mapping = InstantMapping {
        source_frames: Vec::new(),
        times: Vec::new(),
        repeat_counts: vec![-1; n],
        duration_s: 0.0,
    };
    if n == 0 {
        return mapping;
    }

    let mut pointer = 0.0f64;
    let mut clock = scales[0] * frame_times[0];
    loop {
        let index = (pointer + POINTER_EPSILON).floor() as usize;
        if index >= n {
            break;
        }
        mapping.source_frames.push(index);
        mapping.times.push(clock);
        mapping.repeat_counts[index] += 1;
        clock += hop_after(frame_times, index, duration_s, sampling_rate);
        pointer += 1.0 / scales[index];
    }
    mapping.duration_s = clock;
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(n: usize) -> Vec<f64> {
        (0..n).map(|i| 0.01 * (i + 1) as f64).collect()
    }

    #[test]
    fn test_identity_reproduces_grid() {
        let times = grid(10);
        let mapping = map_instants(&times, &[1.0; 10], 0.11, 16000.0);
        assert_eq!(mapping.source_frames, (0..10).collect::<Vec<_>>());
        for (a, b) in mapping.times.iter().zip(&times) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((mapping.duration_s - 0.11).abs() < 1e-12);
        assert_eq!(mapping.repeat_counts, vec![0; 10]);
    }

    #[test]
    fn test_double_length() {
        let times = grid(10);
        let mapping = map_instants(&times, &[2.0; 10], 0.11, 16000.0);
        assert_eq!(mapping.len(), 20);
        assert_eq!(mapping.repeat_counts, vec![1; 10]);
        assert!((mapping.duration_s - 0.22).abs() < 1e-12);
        assert!(mapping.times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_half_length_skips_frames() {
        let times = grid(10);
        let mapping = map_instants(&times, &[0.5; 10], 0.11, 16000.0);
        assert_eq!(mapping.source_frames, vec![0, 2, 4, 6, 8]);
        assert_eq!(mapping.repeat_counts[1], -1);
        assert!((mapping.duration_s - 0.055).abs() < 1e-12);
    }

    #[test]
    fn test_last_hop_fallback() {
        let times = grid(3);
        let mapping = map_instants(&times, &[1.0; 3], 0.025, 16000.0);
        assert!((mapping.duration_s - 0.04).abs() < 1e-12);
    }
}
