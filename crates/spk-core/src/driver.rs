//! Thiele–Small driver records and the electro-mechano-acoustical chain.
//!
//! The mechanical impedance seen from the voice coil is
//!
//! ```text
//! Z_mech = R_ms + jωM_ms + 1/(jωC_ms) + S_d²·Z_ac_load
//! ```
//!
//! where `Z_ac_load` is the acoustic impedance loading the diaphragm
//! (throat impedance for horns, box network for boxes). The diaphragm/load
//! area reflection happens exactly once, in the S_d² factor here; callers
//! hand over plain acoustic impedances and never pre-scale by area ratios.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::AcousticError;
use crate::medium::Medium;
use crate::radiation;

/// Raw inputs for a driver record. Everything SI: Hz, m², Ω, T·m, kg, H.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverParams {
    pub id: String,
    pub f_s: f64,
    pub q_es: f64,
    pub q_ms: f64,
    /// Equivalent compliance volume in m³.
    pub v_as: f64,
    pub s_d: f64,
    pub r_e: f64,
    pub bl: f64,
    /// Diaphragm-plus-coil mass, without air load. When present the total
    /// moving mass is resolved against the radiation mass at resonance.
    pub m_md: Option<f64>,
    /// Voice-coil inductance.
    pub l_e: Option<f64>,
    /// Parallel loss resistance of the lossy-inductor pair (Leach model).
    pub r_e2: Option<f64>,
    /// Linear excursion limit, informational.
    pub x_max: Option<f64>,
}

/// A validated Thiele–Small record with resolved derived quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThieleSmall {
    pub id: String,
    pub f_s: f64,
    pub q_es: f64,
    pub q_ms: f64,
    pub v_as: f64,
    pub s_d: f64,
    pub r_e: f64,
    pub bl: f64,
    /// Total moving mass including air load, kg.
    pub m_ms: f64,
    /// Suspension compliance, m/N.
    pub c_ms: f64,
    /// Mechanical resistance, N·s/m.
    pub r_ms: f64,
    pub m_md: Option<f64>,
    pub l_e: Option<f64>,
    pub r_e2: Option<f64>,
    pub x_max: Option<f64>,
}

impl ThieleSmall {
    pub fn new(params: DriverParams, medium: &Medium) -> Result<Self, AcousticError> {
        AcousticError::require_positive("f_s", params.f_s)?;
        AcousticError::require_positive("q_es", params.q_es)?;
        AcousticError::require_positive("q_ms", params.q_ms)?;
        AcousticError::require_positive("v_as", params.v_as)?;
        AcousticError::require_positive("s_d", params.s_d)?;
        AcousticError::require_positive("r_e", params.r_e)?;
        AcousticError::require_positive("bl", params.bl)?;
        if let Some(m_md) = params.m_md {
            AcousticError::require_positive("m_md", m_md)?;
        }

        let c_ms = params.v_as / (medium.rho * medium.c * medium.c * params.s_d * params.s_d);
        let m_ms = match params.m_md {
            Some(m_md) => resolve_moving_mass(m_md, c_ms, params.f_s, params.s_d, medium)?,
            None => 1.0 / ((2.0 * PI * params.f_s).powi(2) * c_ms),
        };
        let r_ms = 2.0 * PI * params.f_s * m_ms / params.q_ms;

        Ok(Self {
            id: params.id,
            f_s: params.f_s,
            q_es: params.q_es,
            q_ms: params.q_ms,
            v_as: params.v_as,
            s_d: params.s_d,
            r_e: params.r_e,
            bl: params.bl,
            m_ms,
            c_ms,
            r_ms,
            m_md: params.m_md,
            l_e: params.l_e,
            r_e2: params.r_e2,
            x_max: params.x_max,
        })
    }

    /// Build a record from the small-signal alignment parameters alone,
    /// deriving M_ms from (F_s, C_ms) and BL from Q_es. Handy for test
    /// fixtures and catalogue entries that omit the motor constants.
    pub fn from_alignment(
        id: &str,
        f_s: f64,
        q_es: f64,
        q_ms: f64,
        v_as: f64,
        s_d: f64,
        r_e: f64,
        medium: &Medium,
    ) -> Result<Self, AcousticError> {
        AcousticError::require_positive("f_s", f_s)?;
        AcousticError::require_positive("q_es", q_es)?;
        AcousticError::require_positive("v_as", v_as)?;
        AcousticError::require_positive("s_d", s_d)?;
        AcousticError::require_positive("r_e", r_e)?;
        let omega_s = 2.0 * PI * f_s;
        let c_ms = v_as / (medium.rho * medium.c * medium.c * s_d * s_d);
        let m_ms = 1.0 / (omega_s * omega_s * c_ms);
        let bl = (omega_s * m_ms * r_e / q_es).sqrt();
        ThieleSmall::new(
            DriverParams {
                id: id.to_string(),
                f_s,
                q_es,
                q_ms,
                v_as,
                s_d,
                r_e,
                bl,
                m_md: None,
                l_e: None,
                r_e2: None,
                x_max: None,
            },
            medium,
        )
    }

    /// Total Q: Q_es·Q_ms/(Q_es + Q_ms).
    pub fn q_ts(&self) -> f64 {
        self.q_es * self.q_ms / (self.q_es + self.q_ms)
    }

    /// Blocked voice-coil impedance R_e + Z_L(ω). With the lossy pair
    /// (L_e, R_e2) present, Z_L = jωL_e·R_e2/(R_e2 + jωL_e); otherwise a
    /// plain jωL_e, or resistive when no inductance is given.
    pub fn voice_coil_impedance(&self, omega: f64) -> Complex64 {
        let base = Complex64::new(self.r_e, 0.0);
        match (self.l_e, self.r_e2) {
            (Some(l_e), Some(r_e2)) => {
                let jwl = Complex64::new(0.0, omega * l_e);
                base + jwl * r_e2 / (Complex64::new(r_e2, 0.0) + jwl)
            }
            (Some(l_e), None) => base + Complex64::new(0.0, omega * l_e),
            _ => base,
        }
    }

    /// Mechanical impedance at ω with the given acoustic load on the
    /// diaphragm (N·s/m).
    pub fn mechanical_impedance(&self, omega: f64, z_ac_load: Complex64) -> Complex64 {
        Complex64::new(
            self.r_ms,
            omega * self.m_ms - 1.0 / (omega * self.c_ms),
        ) + z_ac_load * self.s_d * self.s_d
    }

    /// Electrical impedance at the terminals: R_e + Z_L + (BL)²/Z_mech.
    pub fn electrical_impedance(&self, omega: f64, z_ac_load: Complex64) -> Complex64 {
        let z_mech = self.mechanical_impedance(omega, z_ac_load);
        self.voice_coil_impedance(omega) + Complex64::new(self.bl * self.bl, 0.0) / z_mech
    }

    /// Diaphragm volume velocity for a terminal voltage (rms phasor):
    /// U_d = S_d·BL·V/(Z_e·Z_mech), which resolves to the controlled-source
    /// solution BL·V·S_d/(Z_vc·Z_mech + (BL)²).
    pub fn diaphragm_volume_velocity(
        &self,
        omega: f64,
        voltage: f64,
        z_ac_load: Complex64,
    ) -> Complex64 {
        let z_mech = self.mechanical_impedance(omega, z_ac_load);
        let z_e = self.voice_coil_impedance(omega) + Complex64::new(self.bl * self.bl, 0.0) / z_mech;
        Complex64::new(self.s_d * self.bl * voltage, 0.0) / (z_e * z_mech)
    }

    /// Small's reference efficiency η₀ = (4π²/c³)·F_s³·V_as/Q_es, as a
    /// fraction.
    pub fn reference_efficiency(&self, medium: &Medium) -> f64 {
        4.0 * PI * PI * self.f_s.powi(3) * self.v_as / (medium.c.powi(3) * self.q_es)
    }
}

/// Fixed-point resolution of the total moving mass against the radiation
/// mass at resonance: M_ms = M_md + 2·m_rad(f*), with f* the resonance of
/// (M_ms, C_ms). Converges in a handful of iterations because the air load
/// is a small fraction of the diaphragm mass.
fn resolve_moving_mass(
    m_md: f64,
    c_ms: f64,
    f_s: f64,
    s_d: f64,
    medium: &Medium,
) -> Result<f64, AcousticError> {
    let mut f = f_s;
    let mut m_ms = m_md;
    for _ in 0..32 {
        m_ms = m_md + 2.0 * radiation::radiation_mass(f, s_d, medium)?;
        let f_next = 1.0 / (2.0 * PI * (m_ms * c_ms).sqrt());
        if (f_next - f).abs() < 1e-9 * f_s {
            break;
        }
        f = f_next;
    }
    Ok(m_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(medium: &Medium) -> ThieleSmall {
        ThieleSmall::from_alignment("test-6.5", 59.0, 0.50, 3.5, 0.022, 0.0135, 6.4, medium)
            .unwrap()
    }

    #[test]
    fn test_q_ts() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let expect = 0.50 * 3.5 / (0.50 + 3.5);
        assert!((d.q_ts() - expect).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_consistency() {
        // The derived (M_ms, C_ms) pair resonates at F_s.
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let f_res = 1.0 / (2.0 * PI * (d.m_ms * d.c_ms).sqrt());
        assert!((f_res - d.f_s).abs() < 1e-9);
    }

    #[test]
    fn test_free_air_impedance_peak_at_resonance() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let zero = Complex64::new(0.0, 0.0);
        let at = |f: f64| d.electrical_impedance(2.0 * PI * f, zero).norm();
        let z_res = at(59.0);
        assert!(z_res > at(45.0) && z_res > at(75.0));
        // Peak height: R_e·(1 + Q_ms/Q_es).
        let expect = 6.4 * (1.0 + 3.5 / 0.50);
        assert!((at(59.0) - expect).abs() / expect < 0.01, "peak {}", at(59.0));
    }

    #[test]
    fn test_moving_mass_resolution_adds_air_load() {
        let medium = Medium::half_space();
        let m_md = 0.012;
        let d = ThieleSmall::new(
            DriverParams {
                id: "mmd".into(),
                f_s: 40.0,
                q_es: 0.45,
                q_ms: 4.0,
                v_as: 0.060,
                s_d: 0.0227,
                r_e: 5.6,
                bl: 9.5,
                m_md: Some(m_md),
                l_e: None,
                r_e2: None,
                x_max: None,
            },
            &medium,
        )
        .unwrap();
        assert!(d.m_ms > m_md, "air load must increase the moving mass");
        // Two-sided piston load of a 17 cm cone is a gram or two.
        let added = d.m_ms - m_md;
        assert!(added > 0.5e-3 && added < 5e-3, "added mass {added} kg");
    }

    #[test]
    fn test_lossy_inductance_saturates() {
        let medium = Medium::half_space();
        let mut d = fixture(&medium);
        d.l_e = Some(1.0e-3);
        d.r_e2 = Some(4.0);
        // At very high frequency the lossy pair tends to R_e + R_e2.
        let z = d.voice_coil_impedance(2.0 * PI * 1.0e6);
        assert!((z.re - (6.4 + 4.0)).abs() < 0.1, "Re = {}", z.re);
        assert!(z.im < 1.0);
    }

    #[test]
    fn test_reference_efficiency_formula() {
        let medium = Medium::half_space();
        let d = fixture(&medium);
        let expect =
            4.0 * PI * PI * 59.0f64.powi(3) * 0.022 / (medium.c.powi(3) * 0.50);
        assert!((d.reference_efficiency(&medium) - expect).abs() < 1e-12);
        // Sanity: sub-percent efficiency for a small woofer.
        assert!(expect > 1e-3 && expect < 2e-2);
    }

    #[test]
    fn test_invalid_records_rejected() {
        let medium = Medium::half_space();
        assert!(
            ThieleSmall::from_alignment("bad", 0.0, 0.5, 3.0, 0.02, 0.01, 6.0, &medium).is_err()
        );
        assert!(
            ThieleSmall::from_alignment("bad", 50.0, -0.5, 3.0, 0.02, 0.01, 6.0, &medium).is_err()
        );
    }
}
