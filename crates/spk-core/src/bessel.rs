//! Bessel and Struve functions used by the piston radiation impedance.
//!
//! J₀/J₁/Y₁ use the classic rational/asymptotic fits (absolute error
//! below ~1e-8 over the real line). The Struve function H₁ has two
//! back-ends: the alternating power series with an asymptotic tail
//! (`StruveBackend::Exact`), and the short Aarts–Janssen closed form
//! (`StruveBackend::AartsJanssen`, max error ~2e-3, much cheaper).

use std::f64::consts::PI;

/// Back-end selection for the Struve function H₁.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StruveBackend {
    /// Power series below x = 20, asymptotic expansion above.
    #[default]
    Exact,
    /// Aarts & Janssen approximation: cheap, error < ~2e-3.
    AartsJanssen,
}

/// Bessel function of the first kind, order zero.
pub fn bessel_j0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let num = 57568490574.0
            + y * (-13362590354.0
                + y * (651619640.7
                    + y * (-11214424.18 + y * (77392.33017 + y * (-184.9052456)))));
        let den = 57568490411.0
            + y * (1029532985.0
                + y * (9494680.718 + y * (59272.64853 + y * (267.8532712 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 0.785398164;
        let p0 = 1.0
            + y * (-0.1098628627e-2
                + y * (0.2734510407e-4 + y * (-0.2073370639e-5 + y * 0.2093887211e-6)));
        let q0 = -0.1562499995e-1
            + y * (0.1430488765e-3
                + y * (-0.6911147651e-5 + y * (0.7621095161e-6 + y * (-0.934935152e-7))));
        (0.636619772 / ax).sqrt() * (xx.cos() * p0 - z * xx.sin() * q0)
    }
}

/// Bessel function of the first kind, order one.
pub fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let num = x
            * (72362614232.0
                + y * (-7895059235.0
                    + y * (242396853.1
                        + y * (-2972611.439 + y * (15704.48260 + y * (-30.16036606))))));
        let den = 144725228442.0
            + y * (2300535178.0
                + y * (18583304.74 + y * (99447.43394 + y * (376.9991397 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 2.356194491;
        let p1 = 1.0
            + y * (0.183105e-2
                + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * (-0.240337019e-6))));
        let q1 = 0.04687499995
            + y * (-0.2002690873e-3
                + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * 0.105787412e-6)));
        let ans = (0.636619772 / ax).sqrt() * (xx.cos() * p1 - z * xx.sin() * q1);
        if x < 0.0 {
            -ans
        } else {
            ans
        }
    }
}

/// Bessel function of the second kind, order one. Requires x > 0.
pub fn bessel_y1(x: f64) -> f64 {
    if x < 8.0 {
        let y = x * x;
        let num = x
            * (-4.900604943e13
                + y * (1.275274390e13
                    + y * (-5.153438139e11
                        + y * (7.349264551e9 + y * (-4.237922726e7 + y * 8.511937935e4)))));
        let den = 2.499580570e14
            + y * (4.244419664e12
                + y * (3.733650367e10
                    + y * (2.245904002e8 + y * (1.020426050e6 + y * (3.549632885e3 + y)))));
        num / den + 0.636619772 * (bessel_j1(x) * x.ln() - 1.0 / x)
    } else {
        let z = 8.0 / x;
        let y = z * z;
        let xx = x - 2.356194491;
        let p1 = 1.0
            + y * (0.183105e-2
                + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * (-0.240337019e-6))));
        let q1 = 0.04687499995
            + y * (-0.2002690873e-3
                + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * 0.105787412e-6)));
        (0.636619772 / x).sqrt() * (xx.sin() * p1 + z * xx.cos() * q1)
    }
}

/// Struve function H₁ with the chosen back-end. Requires x ≥ 0.
pub fn struve_h1(x: f64, backend: StruveBackend) -> f64 {
    match backend {
        StruveBackend::Exact => struve_h1_exact(x),
        StruveBackend::AartsJanssen => struve_h1_aarts_janssen(x),
    }
}

/// H₁ via the alternating power series (x ≤ 20) or the asymptotic
/// expansion around Y₁ (x > 20).
fn struve_h1_exact(x: f64) -> f64 {
    if x <= 20.0 {
        // H₁(x) = Σ_{k≥0} (−1)^k (x/2)^{2k+2} / (Γ(k+3/2)·Γ(k+5/2)),
        // first term 2x²/(3π), ratio −(x/2)²/((k+3/2)(k+5/2)).
        let q = x * x / 4.0;
        let mut term = 2.0 * x * x / (3.0 * PI);
        let mut sum = term;
        for k in 0..200 {
            let kf = k as f64;
            term *= -q / ((kf + 1.5) * (kf + 2.5));
            sum += term;
            if term.abs() < 1e-17 * sum.abs().max(1e-300) {
                break;
            }
        }
        sum
    } else {
        // H₁(x) − Y₁(x) ~ (1/π)·(2 + 2/x² − 6/x⁴ + 90/x⁶ − 3150/x⁸ + 198450/x¹⁰)
        let y = 1.0 / (x * x);
        let tail = 2.0 + y * (2.0 + y * (-6.0 + y * (90.0 + y * (-3150.0 + y * 198450.0))));
        bessel_y1(x) + tail / PI
    }
}

/// Aarts & Janssen (2003) approximation of H₁.
fn struve_h1_aarts_janssen(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    2.0 / PI - bessel_j0(x)
        + (16.0 / PI - 5.0) * x.sin() / x
        + (12.0 - 36.0 / PI) * (1.0 - x.cos()) / (x * x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_j0_j1_reference_values() {
        assert!((bessel_j0(0.0) - 1.0).abs() < 1e-12);
        assert!(bessel_j1(0.0).abs() < 1e-12);
        assert!((bessel_j0(1.0) - 0.7651976866).abs() < 1e-7, "{}", bessel_j0(1.0));
        assert!((bessel_j1(1.0) - 0.4400505857).abs() < 1e-7, "{}", bessel_j1(1.0));
        // First zeros.
        assert!(bessel_j0(2.404825557695773).abs() < 1e-7);
        assert!(bessel_j1(3.831705970207512).abs() < 1e-7);
    }

    #[test]
    fn test_j1_region_continuity() {
        // The rational fit and the asymptotic fit must agree at the split.
        let lo = bessel_j1(8.0 - 1e-9);
        let hi = bessel_j1(8.0 + 1e-9);
        assert!((lo - hi).abs() < 1e-6, "J1 discontinuity at 8: {lo} vs {hi}");
    }

    #[test]
    fn test_y1_reference_value() {
        assert!((bessel_y1(1.0) + 0.7812128213).abs() < 1e-7, "{}", bessel_y1(1.0));
        let lo = bessel_y1(8.0 - 1e-9);
        let hi = bessel_y1(8.0 + 1e-9);
        assert!((lo - hi).abs() < 1e-6, "Y1 discontinuity at 8: {lo} vs {hi}");
    }

    #[test]
    fn test_struve_small_x_limit() {
        // H₁(x) → 2x²/(3π) as x → 0.
        let x = 1e-3;
        let expect = 2.0 * x * x / (3.0 * PI);
        let got = struve_h1(x, StruveBackend::Exact);
        assert!((got - expect).abs() < 1e-12, "H1({x}) = {got}, expect {expect}");
    }

    #[test]
    fn test_struve_series_asymptotic_continuity() {
        let lo = struve_h1(20.0, StruveBackend::Exact);
        let hi = struve_h1(20.0 + 1e-6, StruveBackend::Exact);
        assert!((lo - hi).abs() < 1e-5, "H1 discontinuity at 20: {lo} vs {hi}");
    }

    #[test]
    fn test_aarts_janssen_tracks_exact() {
        for i in 1..200 {
            let x = i as f64 * 0.25;
            let exact = struve_h1(x, StruveBackend::Exact);
            let approx = struve_h1(x, StruveBackend::AartsJanssen);
            assert!(
                (exact - approx).abs() < 5e-3,
                "H1({x}): exact {exact} vs AJ {approx}"
            );
        }
    }
}
