//! Tagged enclosure variant and family-dispatching solver entry point.

use serde::{Deserialize, Serialize};

use crate::driver::ThieleSmall;
use crate::error::AcousticError;
use crate::horn::{self, HornGeometry};
use crate::medium::Medium;
use crate::ported::{self, PortedGeometry};
use crate::response::{FrequencyGrid, ResponseBundle};
use crate::sealed::{self, SealedGeometry};

/// Enclosure family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnclosureFamily {
    Sealed,
    Ported,
    Horn,
}

/// An enclosure design of any family. Solvers are free functions keyed on
/// the variant; this enum only routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Enclosure {
    Sealed(SealedGeometry),
    Ported(PortedGeometry),
    Horn(HornGeometry),
}

impl Enclosure {
    pub fn family(&self) -> EnclosureFamily {
        match self {
            Enclosure::Sealed(_) => EnclosureFamily::Sealed,
            Enclosure::Ported(_) => EnclosureFamily::Ported,
            Enclosure::Horn(_) => EnclosureFamily::Horn,
        }
    }

    /// Electrical impedance, SPL, and velocity response over a grid.
    pub fn frequency_response(
        &self,
        driver: &ThieleSmall,
        grid: &FrequencyGrid,
        medium: &Medium,
    ) -> Result<ResponseBundle, AcousticError> {
        match self {
            Enclosure::Sealed(g) => sealed::frequency_response(driver, g, grid, medium),
            Enclosure::Ported(g) => ported::frequency_response(driver, g, grid, medium),
            Enclosure::Horn(g) => horn::frequency_response(driver, g, grid, medium),
        }
    }

    /// Enclosure size in m³: chamber volumes only. Horn flare volume is
    /// informational and reported separately by [`HornGeometry::flare_volume`].
    pub fn enclosure_volume(&self) -> f64 {
        match self {
            Enclosure::Sealed(g) => g.v_b,
            Enclosure::Ported(g) => g.v_b,
            Enclosure::Horn(g) => g.chamber_volume(),
        }
    }

    /// Horn cutoff when applicable; drives the adaptive flatness band.
    pub fn horn_cutoff(&self, medium: &Medium) -> Option<f64> {
        match self {
            Enclosure::Horn(g) => g.cutoff_frequency(medium),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_matches_direct_solver() {
        let medium = Medium::half_space();
        let d = ThieleSmall::from_alignment(
            "dispatch", 59.0, 0.444, 2.64, 0.022, 0.0135, 6.4, &medium,
        )
        .unwrap();
        let g = SealedGeometry::lossless(0.0265).unwrap();
        let grid = FrequencyGrid::log_spaced(20.0, 500.0, 60).unwrap();

        let via_enum = Enclosure::Sealed(g)
            .frequency_response(&d, &grid, &medium)
            .unwrap();
        let direct = sealed::frequency_response(&d, &g, &grid, &medium).unwrap();
        assert_eq!(via_enum.spl_db, direct.spl_db);
        assert_eq!(Enclosure::Sealed(g).family(), EnclosureFamily::Sealed);
    }

    #[test]
    fn test_enclosure_volume_counts_chambers_only() {
        use crate::chamber::RearChamber;
        use crate::segment::Segment;

        let seg = Segment::exponential(5e-3, 0.2, 1.2).unwrap();
        let mut horn = HornGeometry::single(seg).unwrap();
        assert_eq!(Enclosure::Horn(horn.clone()).enclosure_volume(), 0.0);
        horn.rear_chamber = Some(RearChamber::new(0.012, 7.0).unwrap());
        let e = Enclosure::Horn(horn);
        assert!((e.enclosure_volume() - 0.012).abs() < 1e-12);
        if let Enclosure::Horn(g) = &e {
            assert!(g.flare_volume() > 0.0);
        }
    }
}
