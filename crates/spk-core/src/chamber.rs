//! Lumped chamber impedances: rear-chamber compliance (with optional
//! leakage loss) and throat/front chambers (compliance or closed-pipe
//! mode expansion).

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::AcousticError;
use crate::medium::Medium;

/// Magnitude ceiling for near-singular chamber impedances (acoustic ohms).
/// Values at or above this ceiling indicate a clamped pipe-mode pole.
pub const IMPEDANCE_CLAMP: f64 = 1e12;

/// Acoustic compliance C_ab = V/(ρ₀c²) of an air volume, in m³/Pa.
pub fn acoustic_compliance(volume: f64, medium: &Medium) -> f64 {
    volume / (medium.rho * medium.c * medium.c)
}

/// Impedance of a pure compliance: 1/(jωC).
pub fn compliance_impedance(omega: f64, volume: f64, medium: &Medium) -> Complex64 {
    let c_ab = acoustic_compliance(volume, medium);
    Complex64::new(0.0, -1.0 / (omega * c_ab))
}

/// Compliance with a parallel leakage resistance derived from a quality
/// factor `q_l` referenced at `f_ref`: R = Q_L/(ω_ref·C_ab).
pub fn lossy_compliance_impedance(
    omega: f64,
    volume: f64,
    q_l: f64,
    f_ref: f64,
    medium: &Medium,
) -> Complex64 {
    let z_c = compliance_impedance(omega, volume, medium);
    if !q_l.is_finite() {
        return z_c;
    }
    let c_ab = acoustic_compliance(volume, medium);
    let r = Complex64::new(q_l / (2.0 * PI * f_ref * c_ab), 0.0);
    z_c * r / (z_c + r)
}

/// A sealed rear chamber behind the diaphragm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RearChamber {
    /// Volume in m³.
    pub volume: f64,
    /// Leakage quality factor (Thiele's Q_L). Infinite = lossless.
    pub q_l: f64,
}

impl RearChamber {
    pub const DEFAULT_Q_L: f64 = 7.0;

    pub fn new(volume: f64, q_l: f64) -> Result<Self, AcousticError> {
        AcousticError::require_positive("volume", volume)?;
        if !(q_l > 0.0) {
            return Err(AcousticError::Domain {
                name: "q_l",
                value: q_l,
                reason: "must be positive (infinite disables leakage)",
            });
        }
        Ok(Self { volume, q_l })
    }

    /// Acoustic impedance at ω, with leakage referenced at `f_ref` (the
    /// system resonance the Q was specified against).
    pub fn impedance(&self, omega: f64, f_ref: f64, medium: &Medium) -> Complex64 {
        lossy_compliance_impedance(omega, self.volume, self.q_l, f_ref, medium)
    }
}

/// A throat (front) chamber between diaphragm and horn throat.
///
/// With `modes = 0` it is a pure compliance. With `modes` ≥ 1 and a pipe
/// cross-section `area`, the chamber acts as a closed pipe of length
/// L = V/A and the impedance takes the first N terms of the cotangent
/// mode expansion, whose resonances are spaced c/(2L):
///
/// ```text
/// Z = −j·(ρc/A)·[ 1/(kL) + Σ_{n=1..N} 2kL/((kL)² − (nπ)²) ]
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThroatChamber {
    /// Volume in m³.
    pub volume: f64,
    /// Pipe cross-section in m², required when `modes > 0`.
    pub area: Option<f64>,
    /// Number of standing-wave terms (0–3).
    pub modes: usize,
}

impl ThroatChamber {
    pub const MAX_MODES: usize = 3;

    pub fn compliance(volume: f64) -> Result<Self, AcousticError> {
        AcousticError::require_positive("volume", volume)?;
        Ok(Self {
            volume,
            area: None,
            modes: 0,
        })
    }

    pub fn with_pipe_modes(volume: f64, area: f64, modes: usize) -> Result<Self, AcousticError> {
        AcousticError::require_positive("volume", volume)?;
        AcousticError::require_positive("area", area)?;
        if modes > Self::MAX_MODES {
            return Err(AcousticError::Domain {
                name: "modes",
                value: modes as f64,
                reason: "at most three pipe modes are supported",
            });
        }
        Ok(Self {
            volume,
            area: Some(area),
            modes,
        })
    }

    pub fn impedance(&self, omega: f64, medium: &Medium) -> Complex64 {
        match (self.area, self.modes) {
            (Some(area), n) if n > 0 => {
                let l = self.volume / area;
                let kl = omega / medium.c * l;
                let z0 = medium.duct_impedance(area);
                let mut sum = 1.0 / kl;
                for mode in 1..=n {
                    let pole = (mode as f64 * PI).powi(2);
                    let mut denom = kl * kl - pole;
                    // Clamp the pole neighbourhood instead of dividing by
                    // zero; callers see a finite, huge impedance.
                    if denom.abs() < 1e-9 {
                        denom = denom.signum() * 1e-9;
                    }
                    sum += 2.0 * kl / denom;
                }
                let x = (-z0 * sum).clamp(-IMPEDANCE_CLAMP, IMPEDANCE_CLAMP);
                Complex64::new(0.0, x)
            }
            _ => compliance_impedance(omega, self.volume, medium),
        }
    }
}

/// Parallel combination of two acoustic impedances.
pub fn parallel(z1: Complex64, z2: Complex64) -> Complex64 {
    z1 * z2 / (z1 + z2)
}
