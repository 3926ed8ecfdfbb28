//! Piecewise-linear scale curves over the analysis time axis.

/// Offset of the guard points placed around each transient, in seconds.
pub const TRANSIENT_GUARD_S: f64 = 0.001;

/// Control points closer than this are treated as coincident.
const COINCIDENT_S: f64 = 1e-10;

/// A scale curve: factors at sorted control times.
///
/// Outside the control range the nearest factor holds. An empty curve is
/// neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleCurve {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl ScaleCurve {
    /// Builds a curve from control arrays.
    ///
    /// No factors gives the neutral curve; a single factor without times
    /// gives a constant.
    pub fn from_controls(factors: &[f64], times: &[f64]) -> Self {
        if factors.is_empty() {
            return Self::constant(1.0);
        }
        if times.is_empty() || factors.len() == 1 {
            return Self::constant(factors[0]);
        }
        let mut points: Vec<(f64, f64)> = times.iter().copied().zip(factors.iter().copied()).collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::from_points(points)
    }

    /// A constant curve.
    pub fn constant(value: f64) -> Self {
        Self {
            times: vec![0.0],
            values: vec![value],
        }
    }

    fn from_points(points: Vec<(f64, f64)>) -> Self {
        let (times, values) = points.into_iter().unzip();
        Self { times, values }
    }

    /// Control times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Control values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `t`.
    ///
    /// Coincident control points average their values.
    pub fn value_at(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.values[0];
        }
        if t >= self.times[n - 1] {
            return self.values[n - 1];
        }
        // first control time at or after t
        let j = self.times.partition_point(|&x| x < t);
        if j + 1 < n
            && self.times[j + 1] - self.times[j] < COINCIDENT_S
            && (self.times[j] - t).abs() < COINCIDENT_S
        {
            return 0.5 * (self.values[j] + self.values[j + 1]);
        }
        let (t0, t1) = (self.times[j - 1], self.times[j]);
        let (v0, v1) = (self.values[j - 1], self.values[j]);
        let alpha = if t1 - t0 < COINCIDENT_S {
            0.5
        } else {
            (t - t0) / (t1 - t0)
        };
        v0 + alpha * (v1 - v0)
    }

    /// Samples the curve at every grid time.
    pub fn resample(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&t| self.value_at(t)).collect()
    }

    /// Neutralizes the curve over each `[start, end]` span.
    ///
    /// Points inside a span are forced to 1.0, neutral points are added at
    /// both span edges, and guard points just outside are sampled from the
    /// unmodified curve so the surroundings keep their scaling.
    pub fn protect_spans(&self, spans: &[(f64, f64)]) -> Self {
        if spans.is_empty() {
            return self.clone();
        }
        let mut points: Vec<(f64, f64)> = self
            .times
            .iter()
            .zip(&self.values)
            .map(|(&t, &v)| {
                let inside = spans.iter().any(|&(s, e)| t >= s && t <= e);
                (t, if inside { 1.0 } else { v })
            })
            .collect();
        for &(s, e) in spans {
            let before = s - TRANSIENT_GUARD_S;
            let after = e + TRANSIENT_GUARD_S;
            if !spans.iter().any(|&(s2, e2)| before >= s2 && before <= e2) {
                points.push((before, self.value_at(before)));
            }
            if !spans.iter().any(|&(s2, e2)| after >= s2 && after <= e2) {
                points.push((after, self.value_at(after)));
            }
            points.push((s, 1.0));
            points.push((e, 1.0));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::from_points(points)
    }

    /// `∫₀ᵗ scale(τ) dτ`: where an analysis instant lands on the output axis.
    pub fn time_scaled_time(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let n = self.times.len();
        let mut acc = 0.0;
        let mut pos = 0.0;

        // constant head before the first control point
        let head_end = self.times[0].clamp(0.0, t);
        acc += self.values[0] * (head_end - pos);
        pos = pos.max(head_end);

        for j in 1..n {
            let (t0, t1) = (self.times[j - 1], self.times[j]);
            let lo = t0.max(pos);
            let hi = t1.min(t);
            if hi > lo && t1 > t0 {
                let v_lo = self.value_at_segment(j, lo);
                let v_hi = self.value_at_segment(j, hi);
                acc += 0.5 * (v_lo + v_hi) * (hi - lo);
                pos = hi;
            }
            if t1 >= t {
                break;
            }
        }

        // constant tail after the last control point
        if t > pos {
            acc += self.values[n - 1] * (t - pos);
        }
        acc
    }

    fn value_at_segment(&self, j: usize, t: f64) -> f64 {
        let (t0, t1) = (self.times[j - 1], self.times[j]);
        let (v0, v1) = (self.values[j - 1], self.values[j]);
        v0 + (v1 - v0) * (t - t0) / (t1 - t0)
    }
}
