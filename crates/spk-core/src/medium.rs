use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::AcousticError;

/// Reference sound pressure for SPL, 20 µPa.
pub const P_REF: f64 = 20e-6;

/// Solid angle into which a source radiates.
///
/// Half-space (a piston in an infinite baffle) is the reference condition;
/// each halving of the solid angle raises SPL by 10·log₁₀(2) ≈ 3.01 dB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiationSpace {
    /// 4π sr: free space.
    FullSpace,
    /// 2π sr: half-space, piston in an infinite baffle.
    HalfSpace,
    /// π sr: quarter-space, floor against a wall.
    QuarterSpace,
    /// π/2 sr: eighth-space, corner placement.
    EighthSpace,
}

impl RadiationSpace {
    /// Solid angle in steradians.
    pub fn solid_angle(self) -> f64 {
        match self {
            RadiationSpace::FullSpace => 4.0 * PI,
            RadiationSpace::HalfSpace => 2.0 * PI,
            RadiationSpace::QuarterSpace => PI,
            RadiationSpace::EighthSpace => PI / 2.0,
        }
    }

    /// Scale factor 2π/Ω applied to radiation resistance (half-space = 1).
    pub fn resistance_scale(self) -> f64 {
        2.0 * PI / self.solid_angle()
    }
}

/// The acoustic medium and radiation condition, threaded explicitly through
/// every computation. Immutable for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Medium {
    /// Air density ρ₀ in kg/m³.
    pub rho: f64,
    /// Speed of sound c in m/s.
    pub c: f64,
    /// Reference pressure for SPL, Pa.
    pub p_ref: f64,
    /// Solid angle the system radiates into.
    pub radiation_space: RadiationSpace,
}

impl Medium {
    pub fn new(rho: f64, c: f64, radiation_space: RadiationSpace) -> Result<Self, AcousticError> {
        AcousticError::require_positive("rho", rho)?;
        AcousticError::require_positive("c", c)?;
        Ok(Self {
            rho,
            c,
            p_ref: P_REF,
            radiation_space,
        })
    }

    /// Medium from ambient temperature in °C, ideal-gas approximation.
    pub fn from_temperature(
        temperature_c: f64,
        radiation_space: RadiationSpace,
    ) -> Result<Self, AcousticError> {
        let (c, rho) = speed_of_sound_and_density(temperature_c);
        Self::new(rho, c, radiation_space)
    }

    /// 20 °C air radiating into half-space. The usual datasheet condition.
    pub fn half_space() -> Self {
        Medium::from_temperature(20.0, RadiationSpace::HalfSpace)
            .expect("20 °C air is a valid medium")
    }

    /// Wavenumber k = 2πf/c.
    pub fn wavenumber(&self, frequency: f64) -> f64 {
        2.0 * PI * frequency / self.c
    }

    /// Characteristic acoustic impedance ρ₀c/S of a duct of area `s`.
    pub fn duct_impedance(&self, s: f64) -> f64 {
        self.rho * self.c / s
    }

    /// Same medium with a different radiation space.
    pub fn with_radiation_space(mut self, radiation_space: RadiationSpace) -> Self {
        self.radiation_space = radiation_space;
        self
    }
}

/// Standard atmospheric pressure, Pa.
const ATMOSPHERIC_PRESSURE: f64 = 101_325.0;
/// Specific gas constant of dry air, J/(kg·K).
const GAS_CONSTANT_AIR: f64 = 287.05;
/// Speed of sound in dry air at the freezing point, m/s.
const SOUND_SPEED_AT_0C: f64 = 331.3;

/// Ideal-gas sound speed (m/s) and density (kg/m³) of dry air at standard
/// pressure. Backs [`Medium::from_temperature`]: the sound speed scales
/// with the square root of the absolute temperature, the density inversely
/// with it.
pub fn speed_of_sound_and_density(temperature_c: f64) -> (f64, f64) {
    let t_abs = temperature_c + 273.15;
    let c = SOUND_SPEED_AT_0C * (t_abs / 273.15).sqrt();
    let rho = ATMOSPHERIC_PRESSURE / (GAS_CONSTANT_AIR * t_abs);
    (c, rho)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warm_air_is_faster_and_thinner() {
        let cold = Medium::from_temperature(0.0, RadiationSpace::HalfSpace).unwrap();
        let warm = Medium::from_temperature(25.0, RadiationSpace::HalfSpace).unwrap();
        // 0 °C pins the reference sound speed; 25 °C follows √T and the
        // ideal-gas density, handbook values 346.1 m/s and 1.184 kg/m³.
        assert!((cold.c - 331.3).abs() < 1e-9, "c(0 °C) = {}", cold.c);
        assert!((warm.c - 346.1).abs() < 0.1, "c(25 °C) = {}", warm.c);
        assert!((warm.rho - 1.184).abs() < 0.002, "rho(25 °C) = {}", warm.rho);
        assert!(warm.c > cold.c && warm.rho < cold.rho);
    }

    #[test]
    fn test_resistance_scale_reference_is_half_space() {
        assert_eq!(RadiationSpace::HalfSpace.resistance_scale(), 1.0);
        assert!((RadiationSpace::FullSpace.resistance_scale() - 0.5).abs() < 1e-15);
        assert!((RadiationSpace::QuarterSpace.resistance_scale() - 2.0).abs() < 1e-15);
        assert!((RadiationSpace::EighthSpace.resistance_scale() - 4.0).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_medium_rejected() {
        assert!(Medium::new(-1.2, 343.0, RadiationSpace::HalfSpace).is_err());
        assert!(Medium::new(1.2, 0.0, RadiationSpace::HalfSpace).is_err());
    }
}
