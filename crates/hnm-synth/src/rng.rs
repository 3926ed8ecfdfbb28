//! Deterministic RNG using PCG32 with BLAKE3 seed derivation.
//!
//! LPC excitation noise is the only randomness in the engine. Each noised
//! frame draws from its own stream, derived from the base seed and the
//! frame index, so output does not depend on which frames were synthesized
//! before it.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The 32-bit seed is expanded to 64 bits by duplicating the value in both
/// halves, as required by PCG32's state initialization.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives the seed for one frame from the base seed.
///
/// # Arguments
/// * `base_seed` - Seed from the synthesis parameters
/// * `frame_index` - 0-indexed frame number
///
/// # Returns
/// A derived u32 seed for the frame
pub fn derive_frame_seed(base_seed: u32, frame_index: usize) -> u32 {
    let mut input = Vec::with_capacity(12);
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(&(frame_index as u64).to_le_bytes());

    let hash = blake3::hash(&input);
    let b = hash.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Creates the RNG for a specific frame.
pub fn create_frame_rng(base_seed: u32, frame_index: usize) -> Pcg32 {
    create_rng(derive_frame_seed(base_seed, frame_index))
}

/// Draws `len` samples of zero-mean Gaussian noise with the given variance.
///
/// Uses the Box-Muller transform over uniform draws.
pub fn gaussian_noise(rng: &mut Pcg32, len: usize, variance: f64) -> Vec<f64> {
    let sigma = variance.max(0.0).sqrt();
    let mut out = Vec::with_capacity(len + 1);
    while out.len() < len {
        // (0, 1] keeps ln() finite
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen::<f64>();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        out.push(sigma * r * theta.cos());
        out.push(sigma * r * theta.sin());
    }
    out.truncate(len);
    out
}
