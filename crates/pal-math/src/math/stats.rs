//! Descriptive statistics and rank correlation.
//!
//! All functions operate on plain slices and return NaN rather than
//! panicking on empty or degenerate input, matching the conventions of the
//! rest of this crate.

use serde::Serialize;

/// Scale factor of Silverman's rule of thumb.
const SILVERMAN_FACTOR: f64 = 1.06;

/// Arithmetic mean. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `n`). NaN for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Median. Averages the two central values for even-length input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation around the median (unscaled).
pub fn median_abs_deviation(values: &[f64]) -> f64 {
    let center = median(values);
    if center.is_nan() {
        return f64::NAN;
    }
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Median and MAD of a sample, used as a robust location/scale pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RobustScale {
    pub median: f64,
    pub mad: f64,
}

impl RobustScale {
    pub fn from_samples(values: &[f64]) -> Self {
        Self {
            median: median(values),
            mad: median_abs_deviation(values),
        }
    }
}

/// Pearson product-moment correlation.
///
/// Returns NaN when the inputs differ in length, are empty, or either has
/// zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return f64::NAN;
    }
    let ma = mean(a);
    let mb = mean(b);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    if va <= 0.0 || vb <= 0.0 {
        return f64::NAN;
    }
    (cov / (va.sqrt() * vb.sqrt())).clamp(-1.0, 1.0)
}

/// Fractional ranks (1-based), ties receive the average of their positions.
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut out = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let avg = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            out[idx] = avg;
        }
        start = end;
    }
    out
}

/// Spearman rank correlation.
pub fn spearman(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::NAN;
    }
    pearson(&ranks(a), &ranks(b))
}

/// Silverman's rule-of-thumb bandwidth: `std * 1.06 * n^(-1/5)`.
pub fn silverman_bandwidth(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    std_dev(values) * SILVERMAN_FACTOR * (values.len() as f64).powf(-0.2)
}

/// Unnormalized Gaussian kernel weight `exp(-0.5 (d / sigma)^2)`.
pub fn gaussian_weight(distance: f64, sigma: f64) -> f64 {
    let z = distance / sigma;
    (-0.5 * z * z).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn mean_and_std_match_closed_form() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx_eq(mean(&v), 5.0, 1e-12));
        assert!(approx_eq(std_dev(&v), 2.0, 1e-12));
    }

    #[test]
    fn empty_input_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[]).is_nan());
        assert!(median(&[]).is_nan());
        assert!(silverman_bandwidth(&[]).is_nan());
    }

    #[test]
    fn median_odd_and_even() {
        assert!(approx_eq(median(&[3.0, 1.0, 2.0]), 2.0, 1e-12));
        assert!(approx_eq(median(&[4.0, 1.0, 3.0, 2.0]), 2.5, 1e-12));
    }

    #[test]
    fn mad_of_known_sample() {
        // deviations from median 2: [1, 1, 0, 0, 2, 4, 7] -> median 1
        let v = [1.0, 1.0, 2.0, 2.0, 4.0, 6.0, 9.0];
        assert!(approx_eq(median_abs_deviation(&v), 1.0, 1e-12));
        let robust = RobustScale::from_samples(&v);
        assert!(approx_eq(robust.median, 2.0, 1e-12));
    }

    #[test]
    fn pearson_perfect_and_anti() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let c = [8.0, 6.0, 4.0, 2.0];
        assert!(approx_eq(pearson(&a, &b), 1.0, 1e-12));
        assert!(approx_eq(pearson(&a, &c), -1.0, 1e-12));
    }

    #[test]
    fn pearson_constant_is_nan() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_nan());
    }

    #[test]
    fn ranks_average_ties() {
        let r = ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(r, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn spearman_ignores_monotone_transform() {
        let a: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let b: Vec<f64> = a.iter().map(|x| x.powi(3) + 1.0).collect();
        assert!(approx_eq(spearman(&a, &b), 1.0, 1e-12));
    }

    #[test]
    fn silverman_matches_formula() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        let expected = std_dev(&v) * 1.06 * 5f64.powf(-0.2);
        assert!(approx_eq(silverman_bandwidth(&v), expected, 1e-12));
    }

    #[test]
    fn gaussian_weight_at_zero_and_sigma() {
        assert!(approx_eq(gaussian_weight(0.0, 2.0), 1.0, 1e-12));
        assert!(approx_eq(gaussian_weight(2.0, 2.0), (-0.5f64).exp(), 1e-12));
    }
}
