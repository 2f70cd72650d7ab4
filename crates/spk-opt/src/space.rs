//! Declarative parameter spaces per enclosure family.
//!
//! The optimizer works on a flat vector in the unit hypercube; each slot
//! maps its coordinate onto a physical range (linear or logarithmic), and
//! the space decodes the whole vector into a typed geometry. Constraints
//! are violation-valued: non-negative when satisfied, negative with the
//! violation magnitude otherwise, so infeasible candidates can be ranked
//! by closeness to feasibility.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use spk_core::chamber::RearChamber;
use spk_core::error::AcousticError;
use spk_core::horn::HornGeometry;
use spk_core::medium::Medium;
use spk_core::port;
use spk_core::ported::PortedGeometry;
use spk_core::sealed::SealedGeometry;
use spk_core::segment::Segment;
use spk_core::Enclosure;

/// Mapping of a unit coordinate onto a physical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Linear,
    Log,
}

/// One optimizable parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSlot {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub scale: Scale,
    /// Discrete slots round to the nearest integer after decoding.
    pub discrete: bool,
}

impl ParamSlot {
    pub fn linear(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            min,
            max,
            scale: Scale::Linear,
            discrete: false,
        }
    }

    pub fn log(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            min,
            max,
            scale: Scale::Log,
            discrete: false,
        }
    }

    /// Unit coordinate → physical value.
    pub fn decode(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        let v = match self.scale {
            Scale::Linear => self.min + u * (self.max - self.min),
            Scale::Log => self.min * (self.max / self.min).powf(u),
        };
        if self.discrete {
            v.round()
        } else {
            v
        }
    }

    /// Physical value → unit coordinate.
    pub fn encode(&self, v: f64) -> f64 {
        let u = match self.scale {
            Scale::Linear => (v - self.min) / (self.max - self.min),
            Scale::Log => (v / self.min).ln() / (self.max / self.min).ln(),
        };
        u.clamp(0.0, 1.0)
    }
}

/// Sealed-box search space: one slot, the box volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedSpace {
    /// Box volume range, m³.
    pub v_b: (f64, f64),
    /// Leakage Q applied to every candidate.
    pub q_l: f64,
}

impl SealedSpace {
    pub fn new(v_b_min: f64, v_b_max: f64) -> Self {
        Self {
            v_b: (v_b_min, v_b_max),
            q_l: f64::INFINITY,
        }
    }
}

/// Ported-box search space: volume, tuning, and port area; the port length
/// follows from the Helmholtz relation so every decoded candidate is
/// tuning-consistent by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortedSpace {
    pub v_b: (f64, f64),
    pub f_b: (f64, f64),
    pub s_p: (f64, f64),
    /// Fixed end-correction factor (a design property, not a search knob).
    pub k_end: f64,
    pub q_l: f64,
    /// Longest port that fits the cabinet, m.
    pub max_port_length: f64,
}

impl PortedSpace {
    pub fn new(v_b: (f64, f64), f_b: (f64, f64), s_p: (f64, f64), k_end: f64) -> Self {
        Self {
            v_b,
            f_b,
            s_p,
            k_end,
            q_l: 7.0,
            max_port_length: 0.5,
        }
    }
}

/// Horn profile searched by [`HornSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HornProfile {
    Exponential,
    /// Per-segment Salmon T becomes an extra slot per segment.
    Hyperbolic,
    Conical,
}

/// Horn search space: throat, mouth, per-segment lengths (and Salmon T for
/// hyperbolic profiles), and an optional rear chamber. Intermediate areas
/// follow a geometric progression over cumulative length, which keeps the
/// expansion monotone and area-continuous by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HornSpace {
    pub segments: usize,
    pub profile: HornProfile,
    pub s_throat: (f64, f64),
    pub s_mouth: (f64, f64),
    /// Per-segment length range, m.
    pub segment_length: (f64, f64),
    /// Rear chamber volume range, m³; `None` leaves the rear unloaded.
    pub v_rc: Option<(f64, f64)>,
    /// Diaphragm area of the driver the horn is designed for, used by the
    /// compression-ratio constraint S_throat/S_d ∈ [0.2, 2].
    pub driver_s_d: f64,
    /// Longest total axial length that fits, m.
    pub max_total_length: f64,
}

/// Search space of one enclosure family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DesignSpace {
    Sealed(SealedSpace),
    Ported(PortedSpace),
    Horn(HornSpace),
}

impl DesignSpace {
    /// Ordered parameter slots of this space.
    pub fn slots(&self) -> Vec<ParamSlot> {
        match self {
            DesignSpace::Sealed(s) => {
                vec![ParamSlot::log("v_b", s.v_b.0, s.v_b.1)]
            }
            DesignSpace::Ported(s) => vec![
                ParamSlot::log("v_b", s.v_b.0, s.v_b.1),
                ParamSlot::linear("f_b", s.f_b.0, s.f_b.1),
                ParamSlot::log("s_p", s.s_p.0, s.s_p.1),
            ],
            DesignSpace::Horn(s) => {
                let mut slots = vec![
                    ParamSlot::log("s_throat", s.s_throat.0, s.s_throat.1),
                    ParamSlot::log("s_mouth", s.s_mouth.0, s.s_mouth.1),
                ];
                for i in 0..s.segments {
                    slots.push(ParamSlot::log(
                        seg_slot_name("length", i),
                        s.segment_length.0,
                        s.segment_length.1,
                    ));
                }
                if s.profile == HornProfile::Hyperbolic {
                    for i in 0..s.segments {
                        slots.push(ParamSlot::linear(seg_slot_name("t", i), 0.0, 1.0));
                    }
                }
                if let Some(v_rc) = s.v_rc {
                    slots.push(ParamSlot::log("v_rc", v_rc.0, v_rc.1));
                }
                slots
            }
        }
    }

    pub fn dimension(&self) -> usize {
        self.slots().len()
    }

    /// Index of a named slot.
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots().iter().position(|s| s.name == name)
    }

    /// Decode a unit vector into a typed enclosure.
    pub fn decode(&self, x: &[f64], medium: &Medium) -> Result<Enclosure, AcousticError> {
        let slots = self.slots();
        if x.len() != slots.len() {
            return Err(AcousticError::Domain {
                name: "x",
                value: x.len() as f64,
                reason: "parameter vector length does not match the space",
            });
        }
        let v: Vec<f64> = slots.iter().zip(x).map(|(s, &u)| s.decode(u)).collect();

        match self {
            DesignSpace::Sealed(s) => {
                Ok(Enclosure::Sealed(SealedGeometry::new(v[0], s.q_l)?))
            }
            DesignSpace::Ported(s) => {
                let (v_b, f_b, s_p) = (v[0], v[1], v[2]);
                let mut g = PortedGeometry::from_tuning(v_b, f_b, s_p, s.k_end, medium)?;
                g.q_l = s.q_l;
                Ok(Enclosure::Ported(g))
            }
            DesignSpace::Horn(s) => {
                let s_throat = v[0];
                let s_mouth = v[1];
                let lengths = &v[2..2 + s.segments];
                let total: f64 = lengths.iter().sum();
                let t_base = 2 + s.segments;

                // Boundary areas follow a geometric progression over the
                // cumulative length fraction.
                let mut segments = Vec::with_capacity(s.segments);
                let mut run = 0.0;
                let mut s_in = s_throat;
                for (i, &l) in lengths.iter().enumerate() {
                    run += l;
                    let s_out = s_throat * (s_mouth / s_throat).powf(run / total);
                    let seg = match s.profile {
                        HornProfile::Exponential => Segment::exponential(s_in, s_out, l)?,
                        HornProfile::Hyperbolic => {
                            Segment::hyperbolic(s_in, s_out, l, v[t_base + i])?
                        }
                        HornProfile::Conical => Segment::conical(s_in, s_out, l)?,
                    };
                    segments.push(seg);
                    s_in = s_out;
                }

                let rear = match s.v_rc {
                    Some(_) => {
                        let idx = self.slot_index("v_rc").expect("v_rc slot exists");
                        Some(RearChamber::new(v[idx], RearChamber::DEFAULT_Q_L)?)
                    }
                    None => None,
                };
                Ok(Enclosure::Horn(HornGeometry::new(segments, None, rear)?))
            }
        }
    }

    /// Constraint values for a unit vector; each entry is ≥ 0 when the
    /// constraint is satisfied and negative (with magnitude) otherwise.
    pub fn constraints(&self, x: &[f64], medium: &Medium) -> Vec<f64> {
        let slots = self.slots();
        let v: Vec<f64> = slots.iter().zip(x).map(|(s, &u)| s.decode(u)).collect();

        match self {
            DesignSpace::Sealed(_) => Vec::new(),
            DesignSpace::Ported(s) => {
                let (v_b, f_b, s_p) = (v[0], v[1], v[2]);
                // Required effective length for the tuning, minus the end
                // correction, is the physical port length (may be negative
                // for infeasible tunings).
                let omega_b = 2.0 * PI * f_b;
                let l_eff = s_p * medium.c * medium.c / (v_b * omega_b * omega_b);
                let l_p = l_eff - s.k_end * (s_p / PI).sqrt();
                vec![l_p, s.max_port_length - l_p]
            }
            DesignSpace::Horn(s) => {
                let s_throat = v[0];
                let s_mouth = v[1];
                let total: f64 = v[2..2 + s.segments].iter().sum();
                let ratio = s_throat / s.driver_s_d;
                vec![
                    ratio - 0.2,
                    2.0 - ratio,
                    (s_mouth - s_throat) / s_throat,
                    (s.max_total_length - total) / s.max_total_length,
                ]
            }
        }
    }

    /// Total violation of a constraint vector: Σ max(0, −g).
    pub fn total_violation(constraints: &[f64]) -> f64 {
        constraints.iter().map(|g| (-g).max(0.0)).sum()
    }
}

fn seg_slot_name(kind: &str, index: usize) -> &'static str {
    // Slot names are static labels; segment counts are small and fixed.
    const LENGTH: [&str; 6] = [
        "length_1", "length_2", "length_3", "length_4", "length_5", "length_6",
    ];
    const T: [&str; 6] = ["t_1", "t_2", "t_3", "t_4", "t_5", "t_6"];
    match kind {
        "length" => LENGTH[index],
        _ => T[index],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_decode_encode_round_trip() {
        let lin = ParamSlot::linear("a", 2.0, 10.0);
        let log = ParamSlot::log("b", 0.01, 0.1);
        for u in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert!((lin.encode(lin.decode(u)) - u).abs() < 1e-12);
            assert!((log.encode(log.decode(u)) - u).abs() < 1e-12);
        }
        assert_eq!(lin.decode(0.0), 2.0);
        assert_eq!(lin.decode(1.0), 10.0);
        assert!((log.decode(0.5) - (0.01f64 * 0.1).sqrt() * 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_sealed_space_decodes() {
        let medium = Medium::half_space();
        let space = DesignSpace::Sealed(SealedSpace::new(0.01, 0.1));
        assert_eq!(space.dimension(), 1);
        let enc = space.decode(&[0.5], &medium).unwrap();
        match enc {
            Enclosure::Sealed(g) => {
                assert!((g.v_b - (0.01f64 * 0.1).sqrt()).abs() < 1e-9);
            }
            _ => panic!("wrong family"),
        }
        assert!(space.constraints(&[0.5], &medium).is_empty());
    }

    #[test]
    fn test_ported_space_is_tuning_consistent() {
        let medium = Medium::half_space();
        let space = DesignSpace::Ported(PortedSpace::new(
            (0.02, 0.1),
            (30.0, 60.0),
            (10e-4, 80e-4),
            0.85,
        ));
        let enc = space.decode(&[0.5, 0.5, 0.5], &medium).unwrap();
        match enc {
            Enclosure::Ported(g) => {
                let f = port::helmholtz_frequency(g.v_b, g.s_p, g.effective_length(), &medium);
                assert!((f - g.f_b).abs() < 0.5, "tuning drift {f} vs {}", g.f_b);
            }
            _ => panic!("wrong family"),
        }
    }

    #[test]
    fn test_ported_constraints_flag_infeasible_tuning() {
        let medium = Medium::half_space();
        let space = DesignSpace::Ported(PortedSpace::new(
            (0.005, 0.01),
            (200.0, 400.0),
            (50e-4, 80e-4),
            1.7,
        ));
        // Small box, high tuning, fat port: the end correction alone
        // overshoots the required effective length.
        let g = space.constraints(&[0.0, 1.0, 1.0], &medium);
        assert!(g[0] < 0.0, "expected negative feasibility value, got {g:?}");
        assert!(DesignSpace::total_violation(&g) > 0.0);
    }

    #[test]
    fn test_horn_space_monotone_and_continuous() {
        let medium = Medium::half_space();
        let space = DesignSpace::Horn(HornSpace {
            segments: 3,
            profile: HornProfile::Exponential,
            s_throat: (1e-3, 1e-2),
            s_mouth: (0.05, 0.5),
            segment_length: (0.1, 0.8),
            v_rc: Some((0.005, 0.05)),
            driver_s_d: 0.0135,
            max_total_length: 3.0,
        });
        assert_eq!(space.dimension(), 2 + 3 + 1);
        let x = vec![0.4, 0.6, 0.3, 0.5, 0.7, 0.5];
        let enc = space.decode(&x, &medium).unwrap();
        match enc {
            Enclosure::Horn(h) => {
                assert_eq!(h.segments.len(), 3);
                for pair in h.segments.windows(2) {
                    assert!(pair[1].s_in >= pair[0].s_out * 0.999);
                    assert!(pair[0].s_out > pair[0].s_in, "expansion must be monotone");
                }
                assert!(h.rear_chamber.is_some());
            }
            _ => panic!("wrong family"),
        }
        let g = space.constraints(&x, &medium);
        assert_eq!(g.len(), 4);
    }

    #[test]
    fn test_hyperbolic_horn_space_has_t_slots() {
        let space = DesignSpace::Horn(HornSpace {
            segments: 2,
            profile: HornProfile::Hyperbolic,
            s_throat: (1e-3, 1e-2),
            s_mouth: (0.05, 0.5),
            segment_length: (0.1, 0.8),
            v_rc: None,
            driver_s_d: 0.0135,
            max_total_length: 3.0,
        });
        let names: Vec<&str> = space.slots().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["s_throat", "s_mouth", "length_1", "length_2", "t_1", "t_2"]
        );
    }
}
