//! Linear prediction by the autocorrelation method.

/// All-pole model of a signal segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LpcModel {
    /// Predictor coefficients a1..ap, `x[n] ≈ Σ a_k·x[n-k]`.
    pub coeffs: Vec<f64>,
    /// Standard deviation of the prediction error.
    pub gain: f64,
}

/// Biased autocorrelation `r[0..=order]`, normalized by the segment length.
pub fn autocorrelation(x: &[f64], order: usize) -> Vec<f64> {
    let n = x.len();
    (0..=order)
        .map(|lag| {
            if lag >= n || n == 0 {
                return 0.0;
            }
            let sum: f64 = (0..n - lag).map(|i| x[i] * x[i + lag]).sum();
            sum / n as f64
        })
        .collect()
}

/// Levinson-Durbin recursion.
///
/// Returns `None` for a silent segment (zero energy). The recursion stops
/// early if the prediction error collapses, leaving higher coefficients at 0.
pub fn levinson_durbin(r: &[f64]) -> Option<LpcModel> {
    let order = r.len().saturating_sub(1);
    if r.is_empty() || r[0] <= 0.0 {
        return None;
    }

    let mut a = vec![0.0; order];
    let mut err = r[0];
    for i in 0..order {
        let mut acc = r[i + 1];
        for j in 0..i {
            acc -= a[j] * r[i - j];
        }
        let k = acc / err;

        let prev = a.clone();
        a[i] = k;
        for j in 0..i {
            a[j] = prev[j] - k * prev[i - 1 - j];
        }

        err *= 1.0 - k * k;
        if err <= r[0] * 1e-12 {
            err = r[0] * 1e-12;
            break;
        }
    }

    Some(LpcModel {
        coeffs: a,
        gain: err.sqrt(),
    })
}

/// Fits an LPC model of the given order to a (pre-windowed) segment.
pub fn fit_lpc(x: &[f64], order: usize) -> Option<LpcModel> {
    levinson_durbin(&autocorrelation(x, order))
}
