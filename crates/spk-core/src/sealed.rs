//! Sealed-box (closed) enclosure solver.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::chamber::RearChamber;
use crate::driver::ThieleSmall;
use crate::error::AcousticError;
use crate::medium::Medium;
use crate::radiation;
use crate::response::{
    pressure_at_1m, spl_from_pressure, FrequencyGrid, ResponseBundle, DRIVE_VOLTAGE,
};

/// A closed box of net internal volume `v_b` (m³) with leakage `q_l`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SealedGeometry {
    pub v_b: f64,
    pub q_l: f64,
}

impl SealedGeometry {
    pub fn new(v_b: f64, q_l: f64) -> Result<Self, AcousticError> {
        AcousticError::require_positive("v_b", v_b)?;
        if !(q_l > 0.0) {
            return Err(AcousticError::Domain {
                name: "q_l",
                value: q_l,
                reason: "must be positive (infinite disables leakage)",
            });
        }
        Ok(Self { v_b, q_l })
    }

    pub fn lossless(v_b: f64) -> Result<Self, AcousticError> {
        Self::new(v_b, f64::INFINITY)
    }
}

/// Closed-box alignment figures for a driver/box pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SealedAlignment {
    /// Compliance ratio α = V_as/V_b.
    pub alpha: f64,
    /// System resonance F_c = F_s·√(1+α).
    pub f_c: f64,
    /// Total system Q, Q_tc = Q_ts·√(1+α).
    pub q_tc: f64,
}

/// Classic closed-box alignment relations. The solver itself assumes no
/// alignment; these figures exist for metrics and for optimizer seeding.
pub fn alignment(driver: &ThieleSmall, geometry: &SealedGeometry) -> SealedAlignment {
    let alpha = driver.v_as / geometry.v_b;
    let root = (1.0 + alpha).sqrt();
    SealedAlignment {
        alpha,
        f_c: driver.f_s * root,
        q_tc: driver.q_ts() * root,
    }
}

/// Frequency response of a driver in a sealed box.
///
/// The diaphragm sees the front radiation impedance plus the box
/// compliance (the two faces load it in series); SPL follows from the
/// diaphragm volume velocity alone.
pub fn frequency_response(
    driver: &ThieleSmall,
    geometry: &SealedGeometry,
    grid: &FrequencyGrid,
    medium: &Medium,
) -> Result<ResponseBundle, AcousticError> {
    let rear = RearChamber {
        volume: geometry.v_b,
        q_l: geometry.q_l,
    };
    let f_c = alignment(driver, geometry).f_c;

    let mut out = ResponseBundle::with_capacity(grid.len());
    for f in grid.iter() {
        let omega = 2.0 * PI * f;
        let z_front = radiation::piston_impedance(f, driver.s_d, medium)?;
        let z_rear = rear.impedance(omega, f_c, medium);
        let z_ac = z_front + z_rear;

        let u_d = driver.diaphragm_volume_velocity(omega, DRIVE_VOLTAGE, z_ac);
        let p = pressure_at_1m(u_d, omega, medium);

        out.frequencies.push(f);
        out.z_e.push(driver.electrical_impedance(omega, z_ac));
        out.spl_db.push(spl_from_pressure(p, medium));
        out.u_d.push(u_d);
        out.u_out.push(u_d);
        out.excursion_m.push(u_d.norm() / (omega * driver.s_d));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(medium: &Medium) -> ThieleSmall {
        // F_s 59 Hz, Q_ts 0.38, V_as 22 L.
        ThieleSmall::from_alignment("sealed-fixture", 59.0, 0.444, 2.64, 0.022, 0.0135, 6.4, medium)
            .unwrap()
    }

    #[test]
    fn test_fixture_q_ts() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        assert!((d.q_ts() - 0.38).abs() < 0.002, "q_ts = {}", d.q_ts());
    }

    #[test]
    fn test_alignment_relations() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let g = SealedGeometry::lossless(0.0265).unwrap();
        let a = alignment(&d, &g);
        assert!((a.alpha - 22.0 / 26.5).abs() < 1e-9);
        assert!((a.f_c - 59.0 * (1.0f64 + a.alpha).sqrt()).abs() < 1e-9);
        assert!((a.q_tc / a.f_c - d.q_ts() / d.f_s).abs() < 1e-12);
    }

    #[test]
    fn test_impedance_peak_at_system_resonance() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let g = SealedGeometry::lossless(0.0265).unwrap();
        let a = alignment(&d, &g);
        let grid = FrequencyGrid::log_spaced(20.0, 400.0, 600).unwrap();
        let resp = frequency_response(&d, &g, &grid, &medium).unwrap();

        let (i_max, _) = resp
            .z_e
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).unwrap())
            .unwrap();
        // The front radiation mass sits on top of M_ms and pulls the peak a
        // few percent below the lumped alignment figure.
        let f_peak = resp.frequencies[i_max];
        assert!(
            f_peak > 0.90 * a.f_c && f_peak < 1.02 * a.f_c,
            "impedance peak at {f_peak} Hz, alignment says {} Hz",
            a.f_c
        );
    }

    #[test]
    fn test_midband_spl_matches_reference_efficiency() {
        // In the mass-controlled passband, SPL at 2.83 V should sit within
        // a dB of the 112 dB + 10·log₁₀(η₀) half-space sensitivity figure.
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let g = SealedGeometry::lossless(0.0265).unwrap();
        let grid = FrequencyGrid::new(vec![300.0, 400.0, 500.0]).unwrap();
        let resp = frequency_response(&d, &g, &grid, &medium).unwrap();

        let eta = d.reference_efficiency(&medium);
        // 2.83 V into R_e is not exactly one watt into 8 Ω; scale.
        let w_in = DRIVE_VOLTAGE * DRIVE_VOLTAGE / d.r_e;
        let expect = 112.02 + 10.0 * (eta * w_in).log10();
        for (f, spl) in resp.frequencies.iter().zip(&resp.spl_db) {
            assert!(
                (spl - expect).abs() < 1.2,
                "SPL at {f} Hz = {spl} dB, expected ≈ {expect} dB"
            );
        }
    }

    #[test]
    fn test_rolloff_is_second_order() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let g = SealedGeometry::lossless(0.0265).unwrap();
        let grid = FrequencyGrid::new(vec![10.0, 20.0, 300.0]).unwrap();
        let resp = frequency_response(&d, &g, &grid, &medium).unwrap();
        // One octave deep below resonance: ~12 dB per octave.
        let slope = resp.spl_db[1] - resp.spl_db[0];
        assert!(
            (slope - 12.0).abs() < 1.5,
            "LF slope {slope} dB/octave, expected ≈ 12"
        );
    }

    #[test]
    fn test_smaller_box_raises_resonance() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let big = alignment(&d, &SealedGeometry::lossless(0.050).unwrap());
        let small = alignment(&d, &SealedGeometry::lossless(0.010).unwrap());
        assert!(small.f_c > big.f_c);
        assert!(small.q_tc > big.q_tc);
    }
}
