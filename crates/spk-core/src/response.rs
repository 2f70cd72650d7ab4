//! Frequency grids, response bundles, and SPL conversion.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::AcousticError;
use crate::medium::Medium;

/// Nominal drive voltage (rms): 2.83 V, one watt into 8 Ω.
pub const DRIVE_VOLTAGE: f64 = 2.83;

/// A strictly increasing, positive frequency grid in Hz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyGrid(Vec<f64>);

impl FrequencyGrid {
    pub fn new(frequencies: Vec<f64>) -> Result<Self, AcousticError> {
        if frequencies.is_empty() {
            return Err(AcousticError::NonMonotonicGrid);
        }
        let mut prev = 0.0;
        for &f in &frequencies {
            if !f.is_finite() || f <= prev {
                return Err(AcousticError::NonMonotonicGrid);
            }
            prev = f;
        }
        Ok(Self(frequencies))
    }

    /// Log-spaced grid with a fixed density per decade. The reference
    /// resolution is 10 Hz – 20 kHz at 200 points per decade.
    pub fn log_spaced(
        f_min: f64,
        f_max: f64,
        points_per_decade: usize,
    ) -> Result<Self, AcousticError> {
        AcousticError::require_positive("f_min", f_min)?;
        AcousticError::require_positive("f_max", f_max)?;
        if f_max <= f_min || points_per_decade == 0 {
            return Err(AcousticError::NonMonotonicGrid);
        }
        let decades = (f_max / f_min).log10();
        let n = (decades * points_per_decade as f64).ceil() as usize + 1;
        let freqs = (0..n)
            .map(|i| f_min * 10f64.powf(decades * i as f64 / (n - 1) as f64))
            .collect();
        Self::new(freqs)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

/// Numerical-regime events absorbed during a solve. These never surface as
/// errors and never produce NaN; they are reported here instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Part of the grid lies below the horn cutoff; the evanescent branch
    /// was used there.
    BelowCutoff { cutoff_hz: f64, bins: usize },
    /// An evanescent exponent was clamped to keep the matrix finite.
    EvanescentClamp { freq_hz: f64 },
    /// A near-singular impedance was clamped to a large sentinel.
    ImpedanceClamp { freq_hz: f64 },
}

/// Results of one enclosure evaluation over a frequency grid, consumed by
/// metrics and by callers, then discarded.
#[derive(Debug, Clone)]
pub struct ResponseBundle {
    /// Frequency bins in Hz (length N).
    pub frequencies: Vec<f64>,
    /// Complex electrical impedance at the driver terminals.
    pub z_e: Vec<Complex64>,
    /// On-axis SPL in dB re 20 µPa at 1 m for the nominal drive voltage.
    pub spl_db: Vec<f64>,
    /// Diaphragm volume velocity.
    pub u_d: Vec<Complex64>,
    /// Output volume velocity (port for ported boxes, mouth for horns,
    /// diaphragm for sealed boxes).
    pub u_out: Vec<Complex64>,
    /// Cone excursion magnitude in m.
    pub excursion_m: Vec<f64>,
    /// Numerical-regime events observed during the solve.
    pub diagnostics: Vec<Diagnostic>,
}

impl ResponseBundle {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            frequencies: Vec::with_capacity(n),
            z_e: Vec::with_capacity(n),
            spl_db: Vec::with_capacity(n),
            u_d: Vec::with_capacity(n),
            u_out: Vec::with_capacity(n),
            excursion_m: Vec::with_capacity(n),
            diagnostics: Vec::new(),
        }
    }
}

/// On-axis pressure phasor at 1 m produced by a volume velocity source:
/// the Rayleigh result p = jωρ₀U/(2πr), scaled by √(2π/Ω) so each halving
/// of the radiation space raises SPL by 10·log₁₀(2) dB.
pub fn pressure_at_1m(u: Complex64, omega: f64, medium: &Medium) -> Complex64 {
    let scale = medium.radiation_space.resistance_scale().sqrt();
    Complex64::new(0.0, omega * medium.rho / (2.0 * PI)) * u * scale
}

/// SPL of a pressure phasor (rms), floored at −240 dB to keep silent bins
/// finite.
pub fn spl_from_pressure(p: Complex64, medium: &Medium) -> f64 {
    let mag = p.norm().max(medium.p_ref * 1e-12);
    20.0 * (mag / medium.p_ref).log10()
}

/// SPL at 1 m from a radiated power (W, rms). The radiation-space factor is
/// already inside the radiation resistance that produced the power, so the
/// spreading term here is the half-space reference 2π·r².
pub fn spl_from_power(power: f64, medium: &Medium) -> f64 {
    let intensity = power.max(0.0) / (2.0 * PI);
    let p = (intensity * medium.rho * medium.c).sqrt();
    spl_from_pressure(Complex64::new(p, 0.0), medium)
}
