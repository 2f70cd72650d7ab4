//! One-dimensional parameter sweeps with sensitivity analysis.
//!
//! A sweep takes a base design (unit vector), varies one named slot over a
//! physical range, evaluates every sample, and reports per-objective
//! series, elasticity-style sensitivities, a trend classification, the
//! diminishing-returns knee, and the "good enough" band.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use spk_core::error::AcousticError;

use crate::objective::{EvaluationContext, Objective};

/// Sweep request: which slot, over what physical range, how many samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub parameter: String,
    pub range: (f64, f64),
    pub steps: usize,
    /// Log-spaced samples when true, linear otherwise.
    pub log: bool,
    /// "Good enough" tolerance as a fraction of the best value (default 5 %).
    pub good_fraction: f64,
}

impl SweepConfig {
    pub fn new(parameter: &str, range: (f64, f64), steps: usize, log: bool) -> Self {
        Self {
            parameter: parameter.to_string(),
            range,
            steps,
            log,
            good_fraction: 0.05,
        }
    }
}

/// Shape of an objective across the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    MonotoneIncreasing,
    MonotoneDecreasing,
    /// Falls, then rises: an interior optimum.
    UShaped,
    /// Rises, then falls.
    InvertedU,
    Plateau,
    Irregular,
}

/// Sweep series of one objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSeries {
    pub objective: Objective,
    /// Objective value at each sample.
    pub values: Vec<f64>,
    /// Normalised sensitivity (Δobj/obj)/(Δparam/param) at interior points;
    /// length = steps − 1, aligned with sample midpoints.
    pub sensitivity: Vec<f64>,
    pub trend: Trend,
    /// Parameter value past which further change buys little (sensitivity
    /// magnitude below a quarter of its peak), for monotone trends.
    pub knee: Option<f64>,
    /// Contiguous parameter range whose objective stays within
    /// `good_fraction` of the best sample.
    pub good_range: Option<(f64, f64)>,
}

/// Full sweep result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub parameter: String,
    /// Physical sample values.
    pub samples: Vec<f64>,
    pub series: Vec<SweepSeries>,
}

/// Relative tolerance below which a step is considered flat.
const FLAT_TOL: f64 = 2e-3;

/// Run a sweep around `base` (unit vector of the context's space).
pub fn sweep(
    ctx: &EvaluationContext,
    base: &[f64],
    cfg: &SweepConfig,
) -> Result<SweepResult, AcousticError> {
    let slots = ctx.space.slots();
    let slot_index = ctx
        .space
        .slot_index(&cfg.parameter)
        .ok_or(AcousticError::Domain {
            name: "parameter",
            value: f64::NAN,
            reason: "no slot with this name in the design space",
        })?;
    if cfg.steps < 3 {
        return Err(AcousticError::Domain {
            name: "steps",
            value: cfg.steps as f64,
            reason: "a sweep needs at least three samples",
        });
    }
    if base.len() != slots.len() {
        return Err(AcousticError::Domain {
            name: "base",
            value: base.len() as f64,
            reason: "base vector length does not match the space",
        });
    }

    let samples: Vec<f64> = (0..cfg.steps)
        .map(|i| {
            let t = i as f64 / (cfg.steps - 1) as f64;
            if cfg.log {
                cfg.range.0 * (cfg.range.1 / cfg.range.0).powf(t)
            } else {
                cfg.range.0 + t * (cfg.range.1 - cfg.range.0)
            }
        })
        .collect();

    let slot = &slots[slot_index];
    let evaluations: Vec<_> = samples
        .par_iter()
        .map(|&value| {
            let mut x = base.to_vec();
            x[slot_index] = slot.encode(value);
            ctx.evaluate(&x)
        })
        .collect();

    let series = ctx
        .objectives
        .iter()
        .enumerate()
        .map(|(m, &objective)| {
            let values: Vec<f64> = evaluations.iter().map(|e| e.objectives[m]).collect();
            analyze(objective, &samples, &values, cfg.good_fraction)
        })
        .collect();

    Ok(SweepResult {
        parameter: cfg.parameter.clone(),
        samples,
        series,
    })
}

fn analyze(objective: Objective, samples: &[f64], values: &[f64], good_fraction: f64) -> SweepSeries {
    let n = values.len();
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let scale = finite
        .iter()
        .fold(0.0f64, |a, v| a.max(v.abs()))
        .max(1e-300);

    // Elasticity at midpoints: (Δobj/obj)/(Δparam/param).
    let mut sensitivity = Vec::with_capacity(n - 1);
    for i in 1..n {
        let dv = values[i] - values[i - 1];
        let dp = samples[i] - samples[i - 1];
        let v_mid = 0.5 * (values[i] + values[i - 1]);
        let p_mid = 0.5 * (samples[i] + samples[i - 1]);
        let s = if dv.is_finite() && v_mid.abs() > 0.0 {
            (dv / v_mid) / (dp / p_mid)
        } else {
            f64::INFINITY
        };
        sensitivity.push(s);
    }

    // Classify step signs with a flatness tolerance on the series scale.
    let mut signs = Vec::with_capacity(n - 1);
    for i in 1..n {
        let dv = values[i] - values[i - 1];
        if !dv.is_finite() {
            signs.push(0i8);
        } else if dv > FLAT_TOL * scale {
            signs.push(1);
        } else if dv < -FLAT_TOL * scale {
            signs.push(-1);
        } else {
            signs.push(0);
        }
    }
    let pos = signs.iter().filter(|&&s| s > 0).count();
    let neg = signs.iter().filter(|&&s| s < 0).count();
    let trend = if pos == 0 && neg == 0 {
        Trend::Plateau
    } else if neg == 0 {
        Trend::MonotoneIncreasing
    } else if pos == 0 {
        Trend::MonotoneDecreasing
    } else {
        // One sign change, negative run then positive run → U shape.
        let first_pos = signs.iter().position(|&s| s > 0).unwrap();
        let first_neg = signs.iter().position(|&s| s < 0).unwrap();
        let last_pos = signs.iter().rposition(|&s| s > 0).unwrap();
        let last_neg = signs.iter().rposition(|&s| s < 0).unwrap();
        if last_neg < first_pos {
            Trend::UShaped
        } else if last_pos < first_neg {
            Trend::InvertedU
        } else {
            Trend::Irregular
        }
    };

    // Knee: where |elasticity| first drops below 25 % of its peak, for
    // monotone trends.
    let knee = match trend {
        Trend::MonotoneIncreasing | Trend::MonotoneDecreasing => {
            let peak = sensitivity
                .iter()
                .filter(|s| s.is_finite())
                .fold(0.0f64, |a, s| a.max(s.abs()));
            sensitivity
                .iter()
                .position(|s| s.is_finite() && s.abs() < 0.25 * peak)
                .map(|i| 0.5 * (samples[i] + samples[i + 1]))
        }
        _ => None,
    };

    // Good-enough band: contiguous run of samples within `good_fraction`
    // of the best (smallest) value, around the argmin.
    let good_range = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(i_best, &best)| {
            let limit = best + good_fraction * best.abs().max(1e-300);
            let mut lo = i_best;
            while lo > 0 && values[lo - 1].is_finite() && values[lo - 1] <= limit {
                lo -= 1;
            }
            let mut hi = i_best;
            while hi + 1 < n && values[hi + 1].is_finite() && values[hi + 1] <= limit {
                hi += 1;
            }
            (samples[lo], samples[hi])
        });

    SweepSeries {
        objective,
        values: values.to_vec(),
        sensitivity,
        trend,
        knee,
        good_range,
    }
}
