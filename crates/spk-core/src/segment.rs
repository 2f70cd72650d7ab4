//! Horn segments and their transfer matrices.
//!
//! A segment is one stretch of horn with entry area `s_in`, exit area
//! `s_out`, and axial length `length`. Three profiles are supported:
//!
//! * **Exponential**: radius r(x) = r_in·e^{mx} with the pressure-amplitude
//!   flare constant m = ln(√(S_out/S_in))/L (half the area flare constant).
//! * **Hyperbolic (Salmon family)**: r(x) = r_in·[cosh(mx) + T·sinh(mx)],
//!   T ∈ [0, 1]. T = 1 degenerates to exponential, T = 0 to catenoidal.
//!   Because r″/r = m² everywhere, Webster's equation reduces to a simple
//!   harmonic oscillator in the weighted pressure r·p, so the matrix below
//!   is the exact analytic solution, not an approximation.
//! * **Conical**: linear radius, spherical-wave transfer matrix.
//!
//! All matrices use the [`TransferMatrix`] orientation
//! `[p_in; U_in] = M·[p_out; U_out]` and satisfy det M = 1 identically.
//! Below cutoff (k < m) the trigonometric terms continue analytically into
//! hyperbolic ones; arguments are clamped at [`EVANESCENT_CLAMP`] so the
//! result stays finite.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::AcousticError;
use crate::medium::Medium;
use crate::transfer_matrix::TransferMatrix;

/// Largest hyperbolic argument used in the evanescent branch. 80 nepers is
/// ~700 dB of attenuation, far past any audible effect, and keeps chained
/// segment products comfortably inside f64 range.
pub const EVANESCENT_CLAMP: f64 = 80.0;

/// Horn profile of a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SegmentShape {
    Exponential,
    /// Salmon-family profile with shape parameter T ∈ [0, 1].
    Hyperbolic { t: f64 },
    Conical,
}

/// One horn segment. Areas in m², length in m.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Segment {
    pub shape: SegmentShape,
    pub s_in: f64,
    pub s_out: f64,
    pub length: f64,
}

impl Segment {
    pub fn exponential(s_in: f64, s_out: f64, length: f64) -> Result<Self, AcousticError> {
        validate_common(s_in, s_out, length)?;
        Ok(Self {
            shape: SegmentShape::Exponential,
            s_in,
            s_out,
            length,
        })
    }

    pub fn hyperbolic(s_in: f64, s_out: f64, length: f64, t: f64) -> Result<Self, AcousticError> {
        validate_common(s_in, s_out, length)?;
        if !(0.0..=1.0).contains(&t) {
            return Err(AcousticError::Domain {
                name: "t",
                value: t,
                reason: "Salmon parameter must lie in [0, 1]",
            });
        }
        let r2 = s_out / s_in;
        if r2 < 1.0 - t * t {
            // cosh(mx) + T·sinh(mx) cannot contract below √(1−T²).
            return Err(AcousticError::Domain {
                name: "s_out",
                value: s_out,
                reason: "contraction not reachable by this Salmon profile",
            });
        }
        Ok(Self {
            shape: SegmentShape::Hyperbolic { t },
            s_in,
            s_out,
            length,
        })
    }

    pub fn conical(s_in: f64, s_out: f64, length: f64) -> Result<Self, AcousticError> {
        validate_common(s_in, s_out, length)?;
        if ((s_out - s_in) / s_in).abs() < 1e-9 {
            return Err(AcousticError::Domain {
                name: "s_out",
                value: s_out,
                reason: "conical segment needs distinct entry and exit areas",
            });
        }
        Ok(Self {
            shape: SegmentShape::Conical,
            s_in,
            s_out,
            length,
        })
    }

    /// Pressure-amplitude flare constant m in 1/m. Zero for conical.
    pub fn flare_constant(&self) -> f64 {
        let r = (self.s_out / self.s_in).sqrt();
        match self.shape {
            SegmentShape::Exponential => r.ln() / self.length,
            SegmentShape::Hyperbolic { t } => {
                // Solve cosh(mL) + T·sinh(mL) = r for m. In u = e^{mL}:
                // (1+T)u² − 2ru + (1−T) = 0, positive root.
                let disc = (r * r - (1.0 - t * t)).max(0.0);
                let u = (r + disc.sqrt()) / (1.0 + t);
                u.ln() / self.length
            }
            SegmentShape::Conical => 0.0,
        }
    }

    /// Cutoff frequency c·|m|/(2π). `None` for conical segments, which have
    /// no cutoff.
    pub fn cutoff_frequency(&self, medium: &Medium) -> Option<f64> {
        match self.shape {
            SegmentShape::Conical => None,
            _ => Some(medium.c * self.flare_constant().abs() / (2.0 * PI)),
        }
    }

    /// Interior air volume in m³.
    pub fn volume(&self) -> f64 {
        let l = self.length;
        match self.shape {
            SegmentShape::Exponential => {
                let m = self.flare_constant();
                if m.abs() < 1e-12 {
                    self.s_in * l
                } else {
                    (self.s_out - self.s_in) / (2.0 * m)
                }
            }
            SegmentShape::Hyperbolic { t } => {
                let m = self.flare_constant();
                if m.abs() < 1e-12 {
                    return self.s_in * l;
                }
                let (sh2, ch2) = ((2.0 * m * l).sinh(), (2.0 * m * l).cosh());
                self.s_in
                    * ((1.0 + t * t) * sh2 / (4.0 * m)
                        + (1.0 - t * t) * l / 2.0
                        + t * (ch2 - 1.0) / (2.0 * m))
            }
            SegmentShape::Conical => {
                l / 3.0 * (self.s_in + self.s_out + (self.s_in * self.s_out).sqrt())
            }
        }
    }

    /// Transfer matrix at angular frequency ω (rad/s).
    pub fn transfer_matrix(&self, omega: f64, medium: &Medium) -> TransferMatrix {
        match self.shape {
            SegmentShape::Exponential => self.salmon_matrix(omega, medium, 1.0),
            SegmentShape::Hyperbolic { t } => self.salmon_matrix(omega, medium, t),
            SegmentShape::Conical => self.conical_matrix(omega, medium),
        }
    }

    /// Exact Salmon-family matrix (exponential when t = 1).
    ///
    /// With w(x) = cosh(mx) + T·sinh(mx) the weighted pressure w·p obeys
    /// (w·p)″ + μ²(w·p) = 0, μ² = k² − m². Writing g for the logarithmic
    /// derivative w′/w at each end and s̃ = sin(μL)/μ:
    ///
    /// ```text
    /// A = w(L)·(cos μL − g_out·s̃)        B = j·k·ρc·s̃/√(S_in·S_out)
    /// D = (cos μL + g_in·s̃)/w(L)         C = j·√(S_in·S_out)·
    ///                                         (μ²s̃ + (g_out−g_in)cos μL + g_in·g_out·s̃)/(ωρ)
    /// ```
    ///
    /// A·D − B·C telescopes to cos²μL + μ²s̃² = 1 for any g, so reciprocity
    /// holds exactly in both the propagating and evanescent branches.
    fn salmon_matrix(&self, omega: f64, medium: &Medium, t: f64) -> TransferMatrix {
        let l = self.length;
        let k = omega / medium.c;
        let m = self.flare_constant();

        let (w_l, g_in, g_out) = if t == 1.0 {
            ((m * l).exp(), m, m)
        } else {
            let ch = (m * l).cosh();
            let sh = (m * l).sinh();
            let w = ch + t * sh;
            (w, m * t, m * (sh + t * ch) / w)
        };

        let mu2 = k * k - m * m;
        let (c1, s_tilde) = cos_and_sinc(mu2, l);
        let root_ss = (self.s_in * self.s_out).sqrt();

        let a = w_l * (c1 - g_out * s_tilde);
        let d = (c1 + g_in * s_tilde) / w_l;
        let b = Complex64::new(0.0, k * medium.rho * medium.c * s_tilde / root_ss);
        let c = Complex64::new(
            0.0,
            root_ss * (mu2 * s_tilde + (g_out - g_in) * c1 + g_in * g_out * s_tilde)
                / (omega * medium.rho),
        );
        TransferMatrix::new(
            Complex64::new(a, 0.0),
            b,
            c,
            Complex64::new(d, 0.0),
        )
    }

    /// Spherical-wave matrix for a conical segment. The apex sits at axial
    /// distance x1 before the entry (negative for a converging cone).
    fn conical_matrix(&self, omega: f64, medium: &Medium) -> TransferMatrix {
        let l = self.length;
        let r_in = (self.s_in / PI).sqrt();
        let r_out = (self.s_out / PI).sqrt();
        let x1 = l * r_in / (r_out - r_in);
        let x2 = x1 + l;

        let k = omega / medium.c;
        let kl = k * l;
        let (s, c1) = (kl.sin(), kl.cos());
        let root_ss = (self.s_in * self.s_out).sqrt();

        let a = (x2 / x1) * c1 - s / (k * x1);
        let d = (x1 / x2) * c1 + s / (k * x2);
        let b = Complex64::new(0.0, medium.rho * medium.c * s / root_ss);
        // (sin kL − kL·cos kL) cancels catastrophically for small kL.
        let diff = if kl.abs() < 0.05 {
            kl.powi(3) / 3.0 - kl.powi(5) / 30.0
        } else {
            s - kl * c1
        };
        let c = Complex64::new(
            0.0,
            self.s_in / (medium.rho * medium.c) * (s * x2 / x1 + diff / (k * k * x1 * x1)),
        );
        TransferMatrix::new(
            Complex64::new(a, 0.0),
            b,
            c,
            Complex64::new(d, 0.0),
        )
    }
}

fn validate_common(s_in: f64, s_out: f64, length: f64) -> Result<(), AcousticError> {
    AcousticError::require_positive("s_in", s_in)?;
    AcousticError::require_positive("s_out", s_out)?;
    AcousticError::require_positive("length", length)?;
    Ok(())
}

/// (cos μL, sin(μL)/μ) with analytic continuation below cutoff:
/// for μ² < 0, cos μL → cosh νL and sin(μL)/μ → sinh(νL)/ν with
/// ν = √(−μ²). Near μ = 0 a series keeps the pair smooth.
fn cos_and_sinc(mu2: f64, l: f64) -> (f64, f64) {
    let arg2 = mu2 * l * l;
    if arg2.abs() < 1e-8 {
        (1.0 - arg2 / 2.0, l * (1.0 - arg2 / 6.0))
    } else if mu2 > 0.0 {
        let mu = mu2.sqrt();
        ((mu * l).cos(), (mu * l).sin() / mu)
    } else {
        let nu = (-mu2).sqrt();
        let x = (nu * l).min(EVANESCENT_CLAMP);
        (x.cosh(), x.sinh() / nu)
    }
}
