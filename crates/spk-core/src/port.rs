//! Helmholtz port model: end-corrected acoustic mass, leakage resistance,
//! and port-mouth radiation.
//!
//! The end-correction factor is a property of the design, not an
//! auto-calibrated tuning knob; presets cover the common literature values
//! and arbitrary factors in [0, 1.7] are accepted.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::AcousticError;
use crate::medium::Medium;
use crate::radiation;

/// Common end-correction presets: none, one free end, one flanged end,
/// both free, one flanged + one free (0.85 + 0.61), both flanged.
pub const END_CORRECTION_PRESETS: [f64; 6] = [0.0, 0.6, 0.85, 1.2, 1.46, 1.7];

/// Largest accepted end-correction factor.
pub const K_END_MAX: f64 = 1.7;

/// Effective port length L_eff = L_p + k_end·√(S_p/π).
pub fn effective_length(l_p: f64, s_p: f64, k_end: f64) -> f64 {
    l_p + k_end * (s_p / PI).sqrt()
}

/// Acoustic mass of the effective air plug, ρ₀·L_eff/S_p (kg/m⁴).
pub fn acoustic_mass(l_eff: f64, s_p: f64, medium: &Medium) -> f64 {
    medium.rho * l_eff / s_p
}

/// Helmholtz resonance (c/2π)·√(S_p/(V_b·L_eff)).
pub fn helmholtz_frequency(v_b: f64, s_p: f64, l_eff: f64, medium: &Medium) -> f64 {
    medium.c / (2.0 * PI) * (s_p / (v_b * l_eff)).sqrt()
}

/// Physical port length that tunes (V_b, S_p, k_end) to `f_b`.
///
/// Inverts the Helmholtz relation: L_eff = S_p·c²/(V_b·ω_b²), then strips
/// the end correction. Errs when the tuning is infeasible (the end
/// correction alone already exceeds the required effective length).
pub fn port_length_for_tuning(
    v_b: f64,
    s_p: f64,
    f_b: f64,
    k_end: f64,
    medium: &Medium,
) -> Result<f64, AcousticError> {
    AcousticError::require_positive("v_b", v_b)?;
    AcousticError::require_positive("s_p", s_p)?;
    AcousticError::require_positive("f_b", f_b)?;
    let omega_b = 2.0 * PI * f_b;
    let l_eff = s_p * medium.c * medium.c / (v_b * omega_b * omega_b);
    let l_p = l_eff - k_end * (s_p / PI).sqrt();
    if l_p < 0.0 {
        return Err(AcousticError::Domain {
            name: "f_b",
            value: f_b,
            reason: "tuning infeasible: end correction exceeds required effective length",
        });
    }
    Ok(l_p)
}

/// Series impedance of the port branch:
/// jω·M_ap + R_al + R_ap + Re(Z_rad(port mouth)), with the
/// leakage/radiation resistance R_al = (ρ₀c/S_p)/Q_L and optional port
/// friction R_ap = ω_b·M_ap/Q_P.
///
/// Only the resistive part of the mouth radiation enters: its reactance is
/// an end effect, and the end-corrected L_eff already carries it. Adding
/// both would detune the box by the outer-end correction over again.
pub fn branch_impedance(
    omega: f64,
    s_p: f64,
    l_eff: f64,
    q_l: f64,
    q_p: f64,
    f_b: f64,
    medium: &Medium,
) -> Result<Complex64, AcousticError> {
    let m_ap = acoustic_mass(l_eff, s_p, medium);
    let r_al = medium.duct_impedance(s_p) / q_l;
    let r_ap = if q_p.is_finite() {
        2.0 * PI * f_b * m_ap / q_p
    } else {
        0.0
    };
    let z_rad = radiation::piston_impedance(omega / (2.0 * PI), s_p, medium)?;
    Ok(Complex64::new(r_al + r_ap + z_rad.re, omega * m_ap))
}
