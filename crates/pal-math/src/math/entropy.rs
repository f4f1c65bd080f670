//! Shannon entropy of discrete distributions.

/// Shannon entropy (natural log) of a non-negative weight vector.
///
/// Weights are normalized to sum to one before evaluation; zero weights
/// contribute nothing. An empty or all-zero vector has entropy 0 (a
/// degenerate distribution). Negative or NaN weights yield NaN.
pub fn shannon_entropy(weights: &[f64]) -> f64 {
    if weights.iter().any(|w| w.is_nan() || *w < 0.0) {
        return f64::NAN;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut h = 0.0;
    for &w in weights {
        if w > 0.0 {
            let p = w / total;
            h -= p * p.ln();
        }
    }
    // -0.0 from a single certain outcome
    h.max(0.0)
}

/// Entropy of each row of a row-major matrix with `cols` columns.
pub fn row_entropies(values: &[f64], cols: usize) -> Vec<f64> {
    if cols == 0 {
        return Vec::new();
    }
    values.chunks(cols).map(shannon_entropy).collect()
}
