//! Ported (bass-reflex) enclosure solver.
//!
//! Cone and port share the box pressure node; their volume velocities
//! follow a Kirchhoff balance on the acoustic side, and the radiated
//! pressure at 1 m is the *phasor* sum of the two contributions: at low
//! frequency they cancel (the familiar 24 dB/octave roll-off), around the
//! tuning the port carries the output.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::chamber::{acoustic_compliance, parallel};
use crate::driver::ThieleSmall;
use crate::error::AcousticError;
use crate::medium::Medium;
use crate::port;
use crate::radiation;
use crate::response::{
    pressure_at_1m, spl_from_pressure, FrequencyGrid, ResponseBundle, DRIVE_VOLTAGE,
};

/// Tolerance between declared and computed Helmholtz tuning, Hz.
pub const TUNING_TOLERANCE_HZ: f64 = 0.5;

/// A ported box. SI units; `f_b` is the *declared* tuning, checked against
/// the Helmholtz frequency of (V_b, S_p, L_eff) at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortedGeometry {
    /// Net box volume, m³.
    pub v_b: f64,
    /// Declared tuning frequency, Hz.
    pub f_b: f64,
    /// Port cross-section, m².
    pub s_p: f64,
    /// Physical port length, m.
    pub l_p: f64,
    /// End-correction factor in [0, 1.7].
    pub k_end: f64,
    /// Leakage Q (Thiele), default 7.
    pub q_l: f64,
    /// Absorption Q (box stuffing). Infinite = none.
    pub q_a: f64,
    /// Port friction Q. Infinite = none.
    pub q_p: f64,
}

impl PortedGeometry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        v_b: f64,
        f_b: f64,
        s_p: f64,
        l_p: f64,
        k_end: f64,
        q_l: f64,
        q_a: f64,
        q_p: f64,
        medium: &Medium,
    ) -> Result<Self, AcousticError> {
        AcousticError::require_positive("v_b", v_b)?;
        AcousticError::require_positive("f_b", f_b)?;
        AcousticError::require_positive("s_p", s_p)?;
        AcousticError::require_non_negative("l_p", l_p)?;
        AcousticError::require_positive("q_l", q_l)?;
        if !(0.0..=port::K_END_MAX).contains(&k_end) {
            return Err(AcousticError::Domain {
                name: "k_end",
                value: k_end,
                reason: "end-correction factor must lie in [0, 1.7]",
            });
        }

        let computed = port::helmholtz_frequency(
            v_b,
            s_p,
            port::effective_length(l_p, s_p, k_end),
            medium,
        );
        if (computed - f_b).abs() > TUNING_TOLERANCE_HZ {
            return Err(AcousticError::GeometryInconsistency {
                what: "port tuning F_b",
                declared: f_b,
                computed,
                tolerance: TUNING_TOLERANCE_HZ,
            });
        }
        Ok(Self {
            v_b,
            f_b,
            s_p,
            l_p,
            k_end,
            q_l,
            q_a,
            q_p,
        })
    }

    /// Build a consistent geometry from a tuning target, deriving the port
    /// length from the Helmholtz relation.
    pub fn from_tuning(
        v_b: f64,
        f_b: f64,
        s_p: f64,
        k_end: f64,
        medium: &Medium,
    ) -> Result<Self, AcousticError> {
        let l_p = port::port_length_for_tuning(v_b, s_p, f_b, k_end, medium)?;
        Self::new(
            v_b,
            f_b,
            s_p,
            l_p,
            k_end,
            7.0,
            f64::INFINITY,
            f64::INFINITY,
            medium,
        )
    }

    /// End-corrected effective port length.
    pub fn effective_length(&self) -> f64 {
        port::effective_length(self.l_p, self.s_p, self.k_end)
    }
}

/// Frequency response of a driver in a ported box.
pub fn frequency_response(
    driver: &ThieleSmall,
    geometry: &PortedGeometry,
    grid: &FrequencyGrid,
    medium: &Medium,
) -> Result<ResponseBundle, AcousticError> {
    let l_eff = geometry.effective_length();
    let omega_b = 2.0 * PI * geometry.f_b;
    let c_ab = acoustic_compliance(geometry.v_b, medium);
    let r_ab = if geometry.q_a.is_finite() {
        1.0 / (omega_b * geometry.q_a * c_ab)
    } else {
        0.0
    };

    let mut out = ResponseBundle::with_capacity(grid.len());
    for f in grid.iter() {
        let omega = 2.0 * PI * f;

        // Box compliance branch and port branch share the box node.
        let z_c = Complex64::new(r_ab, -1.0 / (omega * c_ab));
        let z_p = port::branch_impedance(
            omega,
            geometry.s_p,
            l_eff,
            geometry.q_l,
            geometry.q_p,
            geometry.f_b,
            medium,
        )?;
        let z_box = parallel(z_c, z_p);

        let z_front = radiation::piston_impedance(f, driver.s_d, medium)?;
        let z_ac = z_front + z_box;

        let u_d = driver.diaphragm_volume_velocity(omega, DRIVE_VOLTAGE, z_ac);
        // The rear face drives −U_d into the box; the port expels its share.
        let u_port = -u_d * z_box / z_p;

        let p = pressure_at_1m(u_d, omega, medium) + pressure_at_1m(u_port, omega, medium);

        out.frequencies.push(f);
        out.z_e.push(driver.electrical_impedance(omega, z_ac));
        out.spl_db.push(spl_from_pressure(p, medium));
        out.u_d.push(u_d);
        out.u_out.push(u_port);
        out.excursion_m.push(u_d.norm() / (omega * driver.s_d));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    /// Scenario driver: F_s 67.12 Hz, Q_ts 0.275, V_as 20.67 L, S_d 227 cm².
    fn fixture(medium: &Medium) -> ThieleSmall {
        ThieleSmall::from_alignment(
            "ported-fixture",
            67.12,
            0.3028,
            3.0,
            0.02067,
            0.0227,
            6.3,
            medium,
        )
        .unwrap()
    }

    fn geometry(medium: &Medium) -> PortedGeometry {
        // 49.3 L box, 41.34 cm² port, 3.80 cm physical length, k_end 1.46.
        let v_b = 0.0493;
        let s_p = 41.34e-4;
        let l_p = 0.038;
        let k_end = 1.46;
        let f_b = port::helmholtz_frequency(
            v_b,
            s_p,
            port::effective_length(l_p, s_p, k_end),
            medium,
        );
        PortedGeometry::new(
            v_b,
            f_b,
            s_p,
            l_p,
            k_end,
            7.0,
            f64::INFINITY,
            f64::INFINITY,
            medium,
        )
        .unwrap()
    }

    #[test]
    fn test_fixture_q_ts() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        assert!((d.q_ts() - 0.275).abs() < 0.002, "q_ts = {}", d.q_ts());
    }

    #[test]
    fn test_tuning_lands_low_fifties() {
        let medium = Medium::half_space();
        let g = geometry(&medium);
        assert!(
            (g.f_b - 52.4).abs() < 1.0,
            "end-corrected tuning {} Hz",
            g.f_b
        );
    }

    #[test]
    fn test_inconsistent_tuning_rejected() {
        let medium = Medium::half_space();
        let err = PortedGeometry::new(
            0.0493,
            60.0, // declared tuning far from the Helmholtz frequency
            41.34e-4,
            0.038,
            1.46,
            7.0,
            f64::INFINITY,
            f64::INFINITY,
            &medium,
        );
        assert!(matches!(
            err,
            Err(AcousticError::GeometryInconsistency { .. })
        ));
    }

    #[test]
    fn test_normalized_peak_location_and_height() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let g = geometry(&medium);
        let grid = FrequencyGrid::log_spaced(20.0, 400.0, 600).unwrap();
        let resp = frequency_response(&d, &g, &grid, &medium).unwrap();
        let norm = metrics::normalize_to_band(&resp.frequencies, &resp.spl_db, (80.0, 100.0))
            .unwrap();

        let (i_max, peak) = norm
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, v)| (i, *v))
            .unwrap();
        let f_peak = resp.frequencies[i_max];
        assert!(
            (f_peak - 52.5).abs() < 0.5,
            "normalized SPL peaks at {f_peak} Hz ({peak:+.2} dB)"
        );
        assert!(
            (peak - 6.4).abs() < 1.0,
            "peak height {peak:+.2} dB, expected +6.4 ± 1.0"
        );

        let spl_at = |target: f64| {
            let i = resp
                .frequencies
                .iter()
                .position(|&f| f >= target)
                .unwrap();
            norm[i]
        };
        let drop = spl_at(53.0) - spl_at(60.0);
        assert!(
            (drop - 3.75).abs() < 1.0,
            "SPL(53) − SPL(60) = {drop:.2} dB, expected 3.75 ± 1.0"
        );
    }

    #[test]
    fn test_lf_rolloff_is_fourth_order() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let g = geometry(&medium);
        let grid = FrequencyGrid::new(vec![8.0, 16.0, 100.0]).unwrap();
        let resp = frequency_response(&d, &g, &grid, &medium).unwrap();
        let slope = resp.spl_db[1] - resp.spl_db[0];
        assert!(
            (slope - 24.0).abs() < 3.0,
            "LF slope {slope} dB/octave, expected ≈ 24"
        );
    }

    #[test]
    fn test_cone_excursion_dips_at_tuning() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let g = geometry(&medium);
        let grid = FrequencyGrid::log_spaced(30.0, 120.0, 400).unwrap();
        let resp = frequency_response(&d, &g, &grid, &medium).unwrap();
        let (i_min, _) = resp
            .excursion_m
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        let f_min = resp.frequencies[i_min];
        assert!(
            (f_min - g.f_b).abs() / g.f_b < 0.1,
            "excursion minimum at {f_min} Hz, tuning {} Hz",
            g.f_b
        );
    }

    #[test]
    fn test_end_correction_is_mandatory_for_tuning() {
        // Without the end correction the Helmholtz peak sits 20–30 % high.
        let medium = Medium::half_space();
        let g = geometry(&medium);
        let f_geo = port::helmholtz_frequency(
            g.v_b,
            g.s_p,
            port::effective_length(g.l_p, g.s_p, 0.0),
            &medium,
        );
        let ratio = f_geo / g.f_b;
        assert!(ratio > 1.2 && ratio < 1.7, "uncorrected/corrected = {ratio}");
    }
}
