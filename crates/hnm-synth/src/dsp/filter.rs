//! Time-domain filters: all-pole synthesis, median smoothing, preemphasis.

/// All-pole (AR) synthesis filter with zero initial conditions.
///
/// `y[n] = gain·x[n] + Σ coeffs[k-1]·y[n-k]`
pub fn ar_filter(x: &[f64], coeffs: &[f64], gain: f64) -> Vec<f64> {
    let mut y = vec![0.0; x.len()];
    for n in 0..x.len() {
        let mut acc = gain * x[n];
        for (k, &a) in coeffs.iter().enumerate() {
            if n > k {
                acc += a * y[n - k - 1];
            }
        }
        y[n] = acc;
    }
    y
}

/// All-zero (MA) inverse of [`ar_filter`]: recovers the excitation.
pub fn inverse_ar_filter(y: &[f64], coeffs: &[f64], gain: f64) -> Vec<f64> {
    let g = if gain.abs() > f64::EPSILON { gain } else { 1.0 };
    (0..y.len())
        .map(|n| {
            let mut e = y[n];
            for (k, &a) in coeffs.iter().enumerate() {
                if n > k {
                    e -= a * y[n - k - 1];
                }
            }
            e / g
        })
        .collect()
}

/// Running median with zero padding outside the sequence.
pub fn median_filter(x: &[f64], len: usize) -> Vec<f64> {
    if len <= 1 || x.is_empty() {
        return x.to_vec();
    }
    let half_left = (len - 1) / 2;
    let mut window = Vec::with_capacity(len);
    (0..x.len())
        .map(|i| {
            window.clear();
            for j in 0..len {
                let idx = i as i64 - half_left as i64 + j as i64;
                let v = if idx >= 0 && (idx as usize) < x.len() {
                    x[idx as usize]
                } else {
                    0.0
                };
                window.push(v);
            }
            window.sort_by(|a, b| a.total_cmp(b));
            window[len / 2]
        })
        .collect()
}

/// First-order preemphasis `y[n] = x[n] − α·x[n−1]`.
pub fn apply_preemphasis(x: &[f64], alpha: f64) -> Vec<f64> {
    (0..x.len())
        .map(|n| if n > 0 { x[n] - alpha * x[n - 1] } else { x[n] })
        .collect()
}

/// Inverse of [`apply_preemphasis`].
pub fn remove_preemphasis(x: &[f64], alpha: f64) -> Vec<f64> {
    let mut y = vec![0.0; x.len()];
    for n in 0..x.len() {
        y[n] = if n > 0 { x[n] + alpha * y[n - 1] } else { x[n] };
    }
    y
}
