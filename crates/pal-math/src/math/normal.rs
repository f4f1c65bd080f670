//! Normal distribution CDF and quantile.
//!
//! The quantile uses Acklam's rational approximation (relative error
//! below 1.2e-9 over the open unit interval). The CDF uses the Numerical
//! Recipes Chebyshev fit of erfc (fractional error below 1.2e-7).

use std::f64::consts::SQRT_2;

const ACKLAM_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_690e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const ACKLAM_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const ACKLAM_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const ACKLAM_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const ACKLAM_P_LOW: f64 = 0.024_25;

/// Complementary error function.
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal quantile (inverse CDF).
///
/// Returns -inf at 0, +inf at 1 and NaN outside [0, 1].
pub fn normal_inv_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    if p < ACKLAM_P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        return tail_ratio(q);
    }
    if p > 1.0 - ACKLAM_P_LOW {
        let q = (-2.0 * (-p).ln_1p()).sqrt();
        return -tail_ratio(q);
    }

    let q = p - 0.5;
    let r = q * q;
    let a = &ACKLAM_A;
    let b = &ACKLAM_B;
    (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
        / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + 1.0)
}

fn tail_ratio(q: f64) -> f64 {
    let c = &ACKLAM_C;
    let d = &ACKLAM_D;
    (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
        / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
}

/// Quantile of N(loc, scale^2).
///
/// A zero scale collapses the distribution onto `loc`. Negative or
/// non-finite scale yields NaN.
pub fn normal_quantile(p: f64, loc: f64, scale: f64) -> f64 {
    if scale.is_nan() || scale < 0.0 || !scale.is_finite() {
        return f64::NAN;
    }
    if scale == 0.0 {
        return loc;
    }
    loc + scale * normal_inv_cdf(p)
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
    fn inv_cdf_known_values() {
        assert!(approx_eq(normal_inv_cdf(0.5), 0.0, 1e-12));
        assert!(approx_eq(normal_inv_cdf(0.975), 1.959_963_984_540_054, 1e-8));
        assert!(approx_eq(normal_inv_cdf(0.9999), 3.719_016_485_455_68, 1e-7));
        assert!(approx_eq(normal_inv_cdf(0.01), -2.326_347_874_040_841, 1e-8));
    }

    #[test]
    fn inv_cdf_edges() {
        assert!(normal_inv_cdf(0.0).is_infinite());
        assert!(normal_inv_cdf(1.0).is_sign_positive());
        assert!(normal_inv_cdf(1.5).is_nan());
        assert!(normal_inv_cdf(-0.1).is_nan());
    }

    #[test]
    fn cdf_known_values() {
        assert!(approx_eq(normal_cdf(0.0), 0.5, 1e-7));
        assert!(approx_eq(normal_cdf(1.959_963_984_540_054), 0.975, 1e-6));
        assert!(approx_eq(normal_cdf(-1.0), 0.158_655_253_931_457, 1e-6));
    }

    #[test]
    fn quantile_shifts_and_scales() {
        let z = normal_inv_cdf(0.9);
        assert!(approx_eq(normal_quantile(0.9, 2.0, 3.0), 2.0 + 3.0 * z, 1e-12));
        assert!(approx_eq(normal_quantile(0.9, 2.0, 0.0), 2.0, 1e-12));
        assert!(normal_quantile(0.9, 2.0, -1.0).is_nan());
    }
}
