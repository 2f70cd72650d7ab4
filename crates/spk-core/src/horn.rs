//! Horn-loaded enclosure solver.
//!
//! The mouth is terminated by the piston radiation impedance, segments are
//! cascaded throat → mouth through their transfer matrices, an optional
//! throat chamber shunts the throat node, and an optional rear chamber
//! loads the back of the diaphragm. Below cutoff the chain is evanescent;
//! the response is still produced (and reported), never suppressed.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::chamber::{parallel, RearChamber, ThroatChamber};
use crate::driver::ThieleSmall;
use crate::error::AcousticError;
use crate::medium::Medium;
use crate::radiation;
use crate::response::{spl_from_power, Diagnostic, FrequencyGrid, ResponseBundle, DRIVE_VOLTAGE};
use crate::segment::{Segment, EVANESCENT_CLAMP};
use crate::transfer_matrix::TransferMatrix;

/// Relative tolerance for area continuity between adjacent segments.
pub const AREA_CONTINUITY_TOLERANCE: f64 = 0.01;

/// An ordered horn: throat-side segment first, optional chambers at the
/// ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HornGeometry {
    pub segments: Vec<Segment>,
    pub throat_chamber: Option<ThroatChamber>,
    pub rear_chamber: Option<RearChamber>,
}

impl HornGeometry {
    pub fn new(
        segments: Vec<Segment>,
        throat_chamber: Option<ThroatChamber>,
        rear_chamber: Option<RearChamber>,
    ) -> Result<Self, AcousticError> {
        if segments.is_empty() {
            return Err(AcousticError::Domain {
                name: "segments",
                value: 0.0,
                reason: "a horn needs at least one segment",
            });
        }
        for pair in segments.windows(2) {
            let (up, down) = (pair[0], pair[1]);
            if ((down.s_in - up.s_out) / up.s_out).abs() > AREA_CONTINUITY_TOLERANCE {
                return Err(AcousticError::GeometryInconsistency {
                    what: "segment area continuity",
                    declared: down.s_in,
                    computed: up.s_out,
                    tolerance: AREA_CONTINUITY_TOLERANCE,
                });
            }
        }
        Ok(Self {
            segments,
            throat_chamber,
            rear_chamber,
        })
    }

    pub fn single(segment: Segment) -> Result<Self, AcousticError> {
        Self::new(vec![segment], None, None)
    }

    pub fn throat_area(&self) -> f64 {
        self.segments[0].s_in
    }

    pub fn mouth_area(&self) -> f64 {
        self.segments[self.segments.len() - 1].s_out
    }

    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Interior air volume of the flare (informational; not part of the
    /// enclosure size unless the horn is boxed in).
    pub fn flare_volume(&self) -> f64 {
        self.segments.iter().map(|s| s.volume()).sum()
    }

    /// Chamber volume counted as enclosure size.
    pub fn chamber_volume(&self) -> f64 {
        self.rear_chamber.map(|r| r.volume).unwrap_or(0.0)
            + self.throat_chamber.map(|t| t.volume).unwrap_or(0.0)
    }

    /// Per-segment cutoff frequencies c·m/(2π) (`None` for conical).
    pub fn segment_cutoffs(&self, medium: &Medium) -> Vec<Option<f64>> {
        self.segments
            .iter()
            .map(|s| s.cutoff_frequency(medium))
            .collect()
    }

    /// Governing cutoff of the chain: the highest segment cutoff, below
    /// which at least one segment runs evanescent.
    pub fn cutoff_frequency(&self, medium: &Medium) -> Option<f64> {
        self.segment_cutoffs(medium)
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<f64>, fc| {
                Some(acc.map_or(fc, |a| a.max(fc)))
            })
    }

    /// Cascade of all segment matrices, throat → mouth.
    pub fn chain_matrix(&self, omega: f64, medium: &Medium) -> TransferMatrix {
        let mut total = TransferMatrix::identity();
        for seg in &self.segments {
            total = total.chain(&seg.transfer_matrix(omega, medium));
        }
        total
    }

    /// Acoustic impedance at the horn throat (before any throat chamber),
    /// with the mouth terminated by its radiation impedance. Also returns
    /// the chain matrix and the mouth termination for reuse.
    pub fn throat_impedance(
        &self,
        omega: f64,
        medium: &Medium,
    ) -> Result<(Complex64, TransferMatrix, Complex64), AcousticError> {
        let z_mouth = radiation::piston_impedance(omega / (2.0 * PI), self.mouth_area(), medium)?;
        let chain = self.chain_matrix(omega, medium);
        Ok((chain.input_impedance(z_mouth), chain, z_mouth))
    }
}

/// Frequency response of a horn-loaded driver.
pub fn frequency_response(
    driver: &ThieleSmall,
    geometry: &HornGeometry,
    grid: &FrequencyGrid,
    medium: &Medium,
) -> Result<ResponseBundle, AcousticError> {
    let cutoff = geometry.cutoff_frequency(medium);
    let flares: Vec<(f64, f64)> = geometry
        .segments
        .iter()
        .map(|s| (s.flare_constant().abs(), s.length))
        .collect();

    let mut out = ResponseBundle::with_capacity(grid.len());
    let mut below_cutoff_bins = 0usize;
    for f in grid.iter() {
        let omega = 2.0 * PI * f;
        let k = medium.wavenumber(f);

        let (z_throat, chain, z_mouth) = geometry.throat_impedance(omega, medium)?;

        // Clamp reporting: an exponent this size means the chain was cut
        // off hard enough that the hyperbolic branch saturated.
        for &(m, l) in &flares {
            if m > k && ((m * m - k * k).sqrt() * l) > EVANESCENT_CLAMP {
                out.diagnostics.push(Diagnostic::EvanescentClamp { freq_hz: f });
                break;
            }
        }
        if cutoff.is_some_and(|fc| f < fc) {
            below_cutoff_bins += 1;
        }

        let (z_front, tc_split) = match geometry.throat_chamber {
            Some(tc) => {
                let z_tc = tc.impedance(omega, medium);
                (parallel(z_tc, z_throat), Some(z_tc))
            }
            None => (z_throat, None),
        };
        let z_rear = geometry
            .rear_chamber
            .map(|rc| rc.impedance(omega, driver.f_s, medium))
            .unwrap_or_default();
        let z_ac = z_front + z_rear;

        let u_d = driver.diaphragm_volume_velocity(omega, DRIVE_VOLTAGE, z_ac);
        let u_horn = match tc_split {
            Some(z_tc) => u_d * z_tc / (z_tc + z_throat),
            None => u_d,
        };
        let u_mouth = chain.output_velocity(u_horn, z_mouth);

        let power = u_mouth.norm_sqr() * z_mouth.re;

        out.frequencies.push(f);
        out.z_e.push(driver.electrical_impedance(omega, z_ac));
        out.spl_db.push(spl_from_power(power, medium));
        out.u_d.push(u_d);
        out.u_out.push(u_mouth);
        out.excursion_m.push(u_d.norm() / (omega * driver.s_d));
    }
    if below_cutoff_bins > 0 {
        if let Some(fc) = cutoff {
            out.diagnostics.push(Diagnostic::BelowCutoff {
                cutoff_hz: fc,
                bins: below_cutoff_bins,
            });
        }
    }
    Ok(out)
}
