//! Regularized discrete cepstrum envelopes.
//!
//! A spectral envelope is fitted through harmonic amplitude samples by
//! solving the penalized least-squares problem
//!
//! ```text
//! (MᵀM + λR) c = Mᵀ log a
//! M[k][0] = 1,  M[k][i] = 2·cos(2π·i·w(f_k))
//! R = 8π²·diag(0, 1², 2², ..., p²)
//! ```
//!
//! where `w(f)` maps frequency onto `[0, 0.5]`, either linearly or through
//! a Bark or Mel warping. The envelope is `exp(c0 + 2·Σ c_i·cos(2π·i·w(f)))`.

use std::f64::consts::PI;

use hnm_model::{CepstrumParams, CepstrumWarping};
use tracing::warn;

use crate::dsp::{freq_to_bark, freq_to_mel, mel_to_freq};

/// Grid size used to resample the linear envelope before Mel refitting.
const POST_MEL_GRID_POINTS: usize = 64;

/// Frequency axis on which cepstral coefficients are defined.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Linear,
    Bark,
    Mel,
}

impl Axis {
    fn warp(self, freq: f64, sampling_rate: f64) -> f64 {
        let nyquist = 0.5 * sampling_rate;
        let f = freq.clamp(0.0, nyquist);
        match self {
            Axis::Linear => f / sampling_rate,
            Axis::Bark => 0.5 * freq_to_bark(f) / freq_to_bark(nyquist),
            Axis::Mel => 0.5 * freq_to_mel(f) / freq_to_mel(nyquist),
        }
    }
}

/// A fitted spectral envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularizedCepstrum {
    coeffs: Vec<f64>,
    sampling_rate: f64,
    axis: Axis,
}

impl RegularizedCepstrum {
    /// Fits an envelope through `amplitudes` sampled at `freqs_hz`.
    ///
    /// Returns `None` when there are no samples. Non-positive amplitudes are
    /// floored before taking logarithms.
    pub fn estimate(
        amplitudes: &[f64],
        freqs_hz: &[f64],
        sampling_rate: f64,
        params: &CepstrumParams,
    ) -> Option<Self> {
        let n = amplitudes.len().min(freqs_hz.len());
        if n == 0 || params.order == 0 {
            return None;
        }
        let log_amps: Vec<f64> = amplitudes[..n].iter().map(|a| a.max(1e-10).ln()).collect();
        let freqs = &freqs_hz[..n];

        match params.warping {
            CepstrumWarping::None => {
                fit(&log_amps, freqs, sampling_rate, params, Axis::Linear)
            }
            CepstrumWarping::PreBark => fit(&log_amps, freqs, sampling_rate, params, Axis::Bark),
            CepstrumWarping::PostMel => {
                let linear = fit(&log_amps, freqs, sampling_rate, params, Axis::Linear)?;
                let grid_len = POST_MEL_GRID_POINTS.max(2 * params.order + 1);
                let top = freq_to_mel(0.5 * sampling_rate);
                let grid: Vec<f64> = (0..grid_len)
                    .map(|i| mel_to_freq(top * i as f64 / (grid_len - 1) as f64))
                    .collect();
                let grid_log: Vec<f64> = grid.iter().map(|&f| linear.log_value(f)).collect();
                fit(&grid_log, &grid, sampling_rate, params, Axis::Mel)
            }
        }
    }

    /// Fits an envelope through the harmonic amplitudes of a frame.
    pub fn from_harmonics(
        amplitudes: &[f64],
        f0_hz: f64,
        sampling_rate: f64,
        params: &CepstrumParams,
    ) -> Option<Self> {
        let freqs: Vec<f64> = (1..=amplitudes.len()).map(|k| k as f64 * f0_hz).collect();
        Self::estimate(amplitudes, &freqs, sampling_rate, params)
    }

    /// Cepstral coefficients c0..cp.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    fn log_value(&self, freq_hz: f64) -> f64 {
        let w = self.axis.warp(freq_hz, self.sampling_rate);
        let mut acc = self.coeffs[0];
        for (i, c) in self.coeffs.iter().enumerate().skip(1) {
            acc += 2.0 * c * (2.0 * PI * i as f64 * w).cos();
        }
        acc
    }

    /// Linear amplitude of the envelope at `freq_hz`.
    pub fn evaluate(&self, freq_hz: f64) -> f64 {
        self.log_value(freq_hz).exp()
    }
}

fn fit(
    log_amps: &[f64],
    freqs: &[f64],
    sampling_rate: f64,
    params: &CepstrumParams,
    axis: Axis,
) -> Option<RegularizedCepstrum> {
    let p = params.order;
    let dim = p + 1;

    let rows: Vec<Vec<f64>> = freqs
        .iter()
        .map(|&f| {
            let w = axis.warp(f, sampling_rate);
            (0..dim)
                .map(|i| if i == 0 { 1.0 } else { 2.0 * (2.0 * PI * i as f64 * w).cos() })
                .collect()
        })
        .collect();

    let mut normal = vec![vec![0.0; dim]; dim];
    let mut rhs = vec![0.0; dim];
    for (row, &y) in rows.iter().zip(log_amps) {
        for i in 0..dim {
            rhs[i] += row[i] * y;
            for j in 0..dim {
                normal[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, row) in normal.iter_mut().enumerate() {
        row[i] += params.lambda * 8.0 * PI * PI * (i * i) as f64;
        // keeps underdetermined fits positive definite
        row[i] += 1e-9;
    }

    match cholesky_solve(&normal, &rhs) {
        Some(coeffs) => Some(RegularizedCepstrum {
            coeffs,
            sampling_rate,
            axis,
        }),
        None => {
            warn!(order = p, samples = freqs.len(), "cepstrum normal equations not positive definite");
            None
        }
    }
}

/// Solves `A x = b` for symmetric positive definite `A`.
fn cholesky_solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][i] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i][k] * y[k];
        }
        y[i] = sum / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in i + 1..n {
            sum -= l[k][i] * x[k];
        }
        x[i] = sum / l[i][i];
    }
    Some(x)
}
