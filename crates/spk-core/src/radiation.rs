//! Radiation impedance of a circular piston.
//!
//! Z_rad = (ρ₀c/S)·[R₁(2ka) + jX₁(2ka)] with a = √(S/π), k = ω/c,
//! R₁(x) = 1 − 2J₁(x)/x and X₁(x) = 2H₁(x)/x. The real part carries the
//! 2π/Ω radiation-space factor (half-space is the reference); the solid
//! angle therefore enters the simulation exactly once, here.

use num_complex::Complex64;

use crate::bessel::{bessel_j1, struve_h1, StruveBackend};
use crate::error::AcousticError;
use crate::medium::Medium;

/// Piston radiation impedance in acoustic ohms (Pa·s/m³), exact back-end.
pub fn piston_impedance(
    frequency: f64,
    area: f64,
    medium: &Medium,
) -> Result<Complex64, AcousticError> {
    piston_impedance_with(frequency, area, medium, StruveBackend::Exact)
}

/// Piston radiation impedance with an explicit Struve back-end.
pub fn piston_impedance_with(
    frequency: f64,
    area: f64,
    medium: &Medium,
    backend: StruveBackend,
) -> Result<Complex64, AcousticError> {
    AcousticError::require_non_negative("frequency", frequency)?;
    AcousticError::require_positive("area", area)?;

    let a = (area / std::f64::consts::PI).sqrt();
    let x = 2.0 * medium.wavenumber(frequency) * a;
    let z0 = medium.duct_impedance(area);
    let scale = medium.radiation_space.resistance_scale();

    let (r1, x1) = if x < 1e-6 {
        // Small-argument limits: R₁ → x²/8, X₁ → 4x/(3π). At f = 0 the
        // impedance is the purely reactive mass limit (zero here).
        (x * x / 8.0, 4.0 * x / (3.0 * std::f64::consts::PI))
    } else {
        (
            1.0 - 2.0 * bessel_j1(x) / x,
            2.0 * struve_h1(x, backend) / x,
        )
    };

    Ok(Complex64::new(z0 * r1 * scale, z0 * x1))
}

/// Mechanical radiation mass (kg) loading one side of a piston:
/// m = Im(Z_rad)·S²/ω. Low-frequency limit (8/3)·ρ₀·a³.
pub fn radiation_mass(frequency: f64, area: f64, medium: &Medium) -> Result<f64, AcousticError> {
    AcousticError::require_non_negative("frequency", frequency)?;
    AcousticError::require_positive("area", area)?;

    let a = (area / std::f64::consts::PI).sqrt();
    if frequency == 0.0 {
        return Ok(8.0 / 3.0 * medium.rho * a * a * a);
    }
    let omega = 2.0 * std::f64::consts::PI * frequency;
    let z = piston_impedance(frequency, area, medium)?;
    Ok(z.im * area * area / omega)
}
