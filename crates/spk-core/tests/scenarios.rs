//! End-to-end scenarios across the solver pipeline.

use spk_core::metrics;
use spk_core::sealed::{self, SealedGeometry};
use spk_core::{
    Enclosure, FrequencyGrid, HornGeometry, Medium, RadiationSpace, Segment, ThieleSmall,
};

fn bookshelf_driver(medium: &Medium) -> ThieleSmall {
    // F_s 59 Hz, Q_ts 0.38, V_as 22 L.
    ThieleSmall::from_alignment("scenario-a", 59.0, 0.444, 2.64, 0.022, 0.0135, 6.4, medium)
        .unwrap()
}

#[test]
fn sealed_box_f3_tracks_alignment() {
    let medium = Medium::half_space();
    let driver = bookshelf_driver(&medium);
    let geometry = SealedGeometry::lossless(0.0265).unwrap();
    let a = sealed::alignment(&driver, &geometry);

    let grid = FrequencyGrid::log_spaced(20.0, 1000.0, 300).unwrap();
    let resp = sealed::frequency_response(&driver, &geometry, &grid, &medium).unwrap();
    let f3 = metrics::f3(&resp.frequencies, &resp.spl_db, (300.0, 800.0));

    // Analytic −3 dB corner of a second-order high-pass with (F_c, Q_tc):
    // F3² = F_c²·(A + √(A² + 1)), A = (1/Q_tc² − 2)/2.
    let aa = (1.0 / (a.q_tc * a.q_tc) - 2.0) / 2.0;
    let f3_expect = a.f_c * (aa + (aa * aa + 1.0).sqrt()).sqrt();
    assert!(
        (f3 - f3_expect).abs() / f3_expect < 0.10,
        "solver F3 {f3:.1} Hz vs lumped-alignment F3 {f3_expect:.1} Hz"
    );
}

#[test]
fn radiation_space_halving_shifts_spl_uniformly() {
    let half = Medium::half_space();
    let full = half.with_radiation_space(RadiationSpace::FullSpace);
    let driver = bookshelf_driver(&half);
    let geometry = SealedGeometry::lossless(0.0265).unwrap();
    let grid = FrequencyGrid::log_spaced(20.0, 10_000.0, 100).unwrap();

    let r_half = sealed::frequency_response(&driver, &geometry, &grid, &half).unwrap();
    let r_full = sealed::frequency_response(&driver, &geometry, &grid, &full).unwrap();

    let expect = 10.0 * 2.0f64.log10();
    for i in 0..grid.len() {
        let shift = r_half.spl_db[i] - r_full.spl_db[i];
        assert!(
            (shift - expect).abs() < 0.1,
            "shift at {} Hz is {shift:.3} dB, expected {expect:.3}",
            r_half.frequencies[i]
        );
    }
}

#[test]
fn all_families_produce_finite_bundles() {
    let medium = Medium::half_space();
    let driver = bookshelf_driver(&medium);
    let grid = FrequencyGrid::log_spaced(10.0, 20_000.0, 200).unwrap();

    let horn = HornGeometry::single(Segment::exponential(5e-3, 0.2, 1.2).unwrap()).unwrap();
    let ported = spk_core::PortedGeometry::from_tuning(0.0493, 40.0, 41.34e-4, 1.46, &medium)
        .unwrap();
    let enclosures = [
        Enclosure::Sealed(SealedGeometry::lossless(0.0265).unwrap()),
        Enclosure::Ported(ported),
        Enclosure::Horn(horn),
    ];

    for enclosure in &enclosures {
        let resp = enclosure.frequency_response(&driver, &grid, &medium).unwrap();
        assert_eq!(resp.frequencies.len(), grid.len());
        for i in 0..grid.len() {
            assert!(resp.spl_db[i].is_finite(), "{:?}", enclosure.family());
            assert!(resp.z_e[i].re.is_finite() && resp.z_e[i].im.is_finite());
            assert!(resp.excursion_m[i].is_finite());
            assert!(resp.z_e[i].re > 0.0, "passive system has positive Re(Z_e)");
        }
    }
}
