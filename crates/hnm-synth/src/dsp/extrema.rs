//! Local extrema search over sampled curves.

/// Kind of extremum to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    /// Local maxima (spectral peaks).
    Maximum,
    /// Local minima (spectral valleys, error minima).
    Minimum,
}

/// Indices in `[start, end]` that beat up to `neighbours` samples on each side.
///
/// Near the boundaries fewer neighbours are compared. A point must be
/// strictly better than every compared neighbour.
pub fn find_extrema(
    x: &[f64],
    neighbours: usize,
    kind: Extremum,
    start: usize,
    end: usize,
) -> Vec<usize> {
    if x.is_empty() {
        return Vec::new();
    }
    let end = end.min(x.len() - 1);
    if start > end {
        return Vec::new();
    }

    let beats = |a: f64, b: f64| match kind {
        Extremum::Maximum => a > b,
        Extremum::Minimum => a < b,
    };

    (start..=end)
        .filter(|&i| {
            let lo = i.saturating_sub(neighbours);
            let hi = (i + neighbours).min(x.len() - 1);
            if lo == i && hi == i {
                return false;
            }
            (lo..=hi).filter(|&j| j != i).all(|j| beats(x[i], x[j]))
        })
        .collect()
}

/// Extrema over the whole slice.
pub fn find_all_extrema(x: &[f64], neighbours: usize, kind: Extremum) -> Vec<usize> {
    if x.is_empty() {
        return Vec::new();
    }
    find_extrema(x, neighbours, kind, 0, x.len() - 1)
}

/// Index of the largest value in `[start, end]`, if the range is non-empty.
pub fn arg_max(x: &[f64], start: usize, end: usize) -> Option<usize> {
    if x.is_empty() || start >= x.len() {
        return None;
    }
    let end = end.min(x.len() - 1);
    (start..=end).max_by(|&a, &b| x[a].total_cmp(&x[b]))
}

/// Index of the smallest value in `[start, end]`, if the range is non-empty.
pub fn arg_min(x: &[f64], start: usize, end: usize) -> Option<usize> {
    if x.is_empty() || start >= x.len() {
        return None;
    }
    let end = end.min(x.len() - 1);
    (start..=end).min_by(|&a, &b| x[a].total_cmp(&x[b]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_maxima_and_minima() {
        let x = [0.0, 2.0, 1.0, 3.0, 0.5, 0.7, 0.1];
        assert_eq!(find_all_extrema(&x, 1, Extremum::Maximum), vec![1, 3, 5]);
        assert_eq!(find_all_extrema(&x, 1, Extremum::Minimum), vec![0, 2, 4, 6]);
        assert_eq!(find_all_extrema(&x, 2, Extremum::Maximum), vec![3]);
    }

    #[test]
    fn test_plateaus_are_not_extrema() {
        let x = [1.0, 2.0, 2.0, 1.0];
        assert!(find_all_extrema(&x, 1, Extremum::Maximum).is_empty());
    }

    #[test]
    fn test_range_restriction() {
        let x = [0.0, 2.0, 1.0, 3.0, 0.5, 0.7, 0.1];
        assert_eq!(find_extrema(&x, 1, Extremum::Maximum, 2, 4), vec![3]);
        assert_eq!(arg_max(&x, 4, 10), Some(5));
        assert_eq!(arg_min(&x, 1, 3), Some(2));
        assert_eq!(arg_max(&x, 9, 10), None);
    }
}
