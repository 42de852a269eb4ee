use std::cmp::Ordering;

pub mod validation;

/// Pearson correlation of two equally long samples.
///
/// Returns NaN when either sample has zero variance, the lengths differ, or
/// fewer than two observations are given.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        f64::NAN
    } else {
        (cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0)
    }
}

/// Pearson correlation over positions where both samples are present.
pub fn pairwise_complete_correlation(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b.iter())
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .unzip();
    pearson_correlation(&xs, &ys)
}

pub fn has_variance(values: &[f64]) -> bool {
    values.windows(2).any(|w| w[0] != w[1])
}

/// Descending order with NaN after every number.
pub fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_correlation() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![2.0, 4.0, 6.0];
        assert!((pearson_correlation(&a, &b) - 1.0).abs() < 1e-12);

        let c = vec![3.0, 2.0, 1.0];
        assert!((pearson_correlation(&a, &c) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_zero_variance_is_nan() {
        assert!(pearson_correlation(&[5.0, 5.0], &[1.0, 4.0]).is_nan());
        assert!(pearson_correlation(&[1.0], &[1.0]).is_nan());
        assert!(pearson_correlation(&[1.0, 2.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_pairwise_complete() {
        let a = vec![Some(5.0), None, Some(3.0), Some(1.0)];
        let b = vec![Some(4.0), Some(2.0), None, Some(2.0)];
        // Only positions 0 and 3 overlap.
        assert!((pairwise_complete_correlation(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_descending_nan_last() {
        let mut scores = vec![0.2, f64::NAN, 0.9, -0.5];
        scores.sort_by(|a, b| descending_nan_last(*a, *b));
        assert_eq!(&scores[..3], &[0.9, 0.2, -0.5]);
        assert!(scores[3].is_nan());
    }
}
