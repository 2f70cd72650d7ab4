//! Scalar metrics over a response: F3, passband flatness, reference
//! efficiency, and normalization helpers.

use crate::driver::ThieleSmall;
use crate::medium::Medium;

/// Mean SPL over a frequency band. `None` when the band contains no grid
/// points.
pub fn reference_level(freqs: &[f64], spl: &[f64], band: (f64, f64)) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for (f, s) in freqs.iter().zip(spl) {
        if *f >= band.0 && *f <= band.1 {
            sum += s;
            n += 1;
        }
    }
    (n > 0).then(|| sum / n as f64)
}

/// The −3 dB bass corner: scanning upward from the lowest frequency, the
/// first crossing from below `reference − 3 dB` to at-or-above it, linearly
/// interpolated between the bracketing samples.
///
/// Returns +∞ when the response never reaches the −3 dB line (penalty
/// value); the low end of the grid is never returned as a fake corner.
pub fn f3(freqs: &[f64], spl: &[f64], reference_band: (f64, f64)) -> f64 {
    let Some(reference) = reference_level(freqs, spl, reference_band) else {
        return f64::INFINITY;
    };
    let target = reference - 3.0;

    if spl.is_empty() || spl[0] >= target {
        // Already at level on the first bin: no crossing exists inside the
        // grid, and the grid's low end must not be reported as a corner.
        return f64::INFINITY;
    }
    for i in 1..spl.len() {
        if spl[i - 1] < target && spl[i] >= target {
            let frac = (target - spl[i - 1]) / (spl[i] - spl[i - 1]);
            return freqs[i - 1] + frac * (freqs[i] - freqs[i - 1]);
        }
    }
    f64::INFINITY
}

/// Standard deviation of SPL over a band, dB.
pub fn flatness_std(freqs: &[f64], spl: &[f64], band: (f64, f64)) -> f64 {
    let Some(mean) = reference_level(freqs, spl, band) else {
        return f64::INFINITY;
    };
    let mut sum = 0.0;
    let mut n = 0usize;
    for (f, s) in freqs.iter().zip(spl) {
        if *f >= band.0 && *f <= band.1 {
            sum += (s - mean) * (s - mean);
            n += 1;
        }
    }
    (sum / n as f64).sqrt()
}

/// Peak-to-peak SPL over a band, dB.
pub fn flatness_peak_to_peak(freqs: &[f64], spl: &[f64], band: (f64, f64)) -> f64 {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (f, s) in freqs.iter().zip(spl) {
        if *f >= band.0 && *f <= band.1 {
            lo = lo.min(*s);
            hi = hi.max(*s);
        }
    }
    if hi < lo {
        f64::INFINITY
    } else {
        hi - lo
    }
}

/// Flatness evaluation band adapted to the enclosure family and its cutoff.
///
/// Bass boxes (and bass horns) are judged over [20, 500] Hz; a midrange
/// horn over [1.5·F_c, max(5 kHz, 20·F_c)]; a tweeter horn up to 20 kHz.
pub fn flatness_band(horn_cutoff: Option<f64>) -> (f64, f64) {
    match horn_cutoff {
        None => (20.0, 500.0),
        Some(fc) if fc < 100.0 => (20.0, 500.0),
        Some(fc) if fc <= 500.0 => (1.5 * fc, (20.0 * fc).max(5_000.0)),
        Some(fc) => (1.5 * fc, 20_000.0),
    }
}

/// Small's reference efficiency of the bare driver, as a fraction.
pub fn reference_efficiency(driver: &ThieleSmall, medium: &Medium) -> f64 {
    driver.reference_efficiency(medium)
}

/// SPL series shifted so the mean over `band` is 0 dB. `None` when the
/// band contains no grid points.
pub fn normalize_to_band(freqs: &[f64], spl: &[f64], band: (f64, f64)) -> Option<Vec<f64>> {
    let reference = reference_level(freqs, spl, band)?;
    Some(spl.iter().map(|s| s - reference).collect())
}
