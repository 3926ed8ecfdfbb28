//! Determinism verification for synthesized PCM.
//!
//! PCM is compared bit for bit: every sample is serialized as little-endian
//! `f64` before hashing, so `-0.0` and `0.0` count as different outputs.

use std::fmt;

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    /// Number of runs performed.
    pub runs: usize,
    /// Number of samples in the reference output.
    pub output_len: usize,
    /// BLAKE3 hash of the reference output.
    pub hash: String,
    /// First differing sample, if any.
    pub diff: Option<SampleDiff>,
}

/// First sample that differs between two runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDiff {
    /// Sample index, or the shorter length when lengths differ.
    pub index: usize,
    /// Value from the first run.
    pub expected: Option<f64>,
    /// Value from the differing run.
    pub actual: Option<f64>,
    /// Which run (0-indexed) produced the differing output.
    pub run_index: usize,
}

impl fmt::Display for SampleDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Difference at sample {}: expected {:?}, got {:?} (run {})",
            self.index, self.expected, self.actual, self.run_index
        )
    }
}

impl DeterminismResult {
    /// Panic with a detailed message if not deterministic.
    pub fn assert_deterministic(&self) {
        if let Some(diff) = &self.diff {
            panic!(
                "Non-deterministic output detected!\n\
                 Runs: {}\n\
                 Output length: {} samples\n\
                 Hash: {}\n\
                 {}",
                self.runs, self.output_len, self.hash, diff
            );
        }
    }
}

/// Little-endian bytes of every sample.
pub fn pcm_bytes(samples: &[f64]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// BLAKE3 hex hash of a PCM buffer.
///
/// # Example
///
/// ```rust
/// use hnm_tests::pcm_hash;
///
/// assert_eq!(pcm_hash(&[0.0, 1.0]), pcm_hash(&[0.0, 1.0]));
/// assert_ne!(pcm_hash(&[0.0, 1.0]), pcm_hash(&[1.0, 0.0]));
/// ```
pub fn pcm_hash(samples: &[f64]) -> String {
    blake3::hash(&pcm_bytes(samples)).to_hex().to_string()
}

/// Runs `generate_fn` `runs` times and compares every output to the first.
pub fn verify_determinism<F>(generate_fn: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> Vec<f64>,
{
    assert!(runs >= 2, "Must run at least 2 times to verify determinism");

    let reference = generate_fn();
    let hash = pcm_hash(&reference);

    for run_index in 1..runs {
        let output = generate_fn();
        if let Some(diff) = first_difference(&reference, &output, run_index) {
            return DeterminismResult {
                is_deterministic: false,
                runs,
                output_len: reference.len(),
                hash,
                diff: Some(diff),
            };
        }
    }

    DeterminismResult {
        is_deterministic: true,
        runs,
        output_len: reference.len(),
        hash,
        diff: None,
    }
}

fn first_difference(expected: &[f64], actual: &[f64], run_index: usize) -> Option<SampleDiff> {
    let mismatch = expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e.to_bits() != a.to_bits());
    match mismatch {
        Some(index) => Some(SampleDiff {
            index,
            expected: Some(expected[index]),
            actual: Some(actual[index]),
            run_index,
        }),
        None if expected.len() != actual.len() => {
            let index = expected.len().min(actual.len());
            Some(SampleDiff {
                index,
                expected: expected.get(index).copied(),
                actual: actual.get(index).copied(),
                run_index,
            })
        }
        None => None,
    }
}
