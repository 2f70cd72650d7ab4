//! Objective evaluation: bridges a decoded candidate through the acoustic
//! core to a vector of objective values. One evaluation is pure and runs on
//! one thread; a generation of them is dispatched in parallel by the
//! optimizer.

use serde::{Deserialize, Serialize};

use spk_core::driver::ThieleSmall;
use spk_core::medium::Medium;
use spk_core::metrics;
use spk_core::response::FrequencyGrid;

use crate::space::DesignSpace;

/// Optimization goals. All are minimized; efficiency is negated so that
/// "more efficient" sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Bass extension: the −3 dB corner, Hz (∞ when the response never
    /// reaches the reference level).
    F3,
    /// Passband flatness: SPL standard deviation over the family-adaptive
    /// band, dB.
    Flatness,
    /// Negated Small reference efficiency −η₀.
    NegEfficiency,
    /// Enclosure volume, m³ (chambers only).
    Volume,
}

/// Result of evaluating one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub objectives: Vec<f64>,
    pub violations: Vec<f64>,
    pub total_violation: f64,
}

/// Everything needed to score a candidate vector. Immutable and `Sync`;
/// workers share it by reference.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub driver: ThieleSmall,
    pub medium: Medium,
    pub grid: FrequencyGrid,
    pub space: DesignSpace,
    pub objectives: Vec<Objective>,
    /// Reference band for the F3 metric (mid-passband of the family).
    pub reference_band: (f64, f64),
}

impl EvaluationContext {
    pub fn new(
        driver: ThieleSmall,
        medium: Medium,
        grid: FrequencyGrid,
        space: DesignSpace,
        objectives: Vec<Objective>,
    ) -> Self {
        Self {
            driver,
            medium,
            grid,
            space,
            objectives,
            reference_band: (200.0, 500.0),
        }
    }

    /// Score a unit-hypercube vector. Infeasible candidates keep their
    /// violation magnitudes and get penalty objectives; they are never an
    /// error.
    pub fn evaluate(&self, x: &[f64]) -> Evaluation {
        let violations = self.space.constraints(x, &self.medium);
        let total_violation = DesignSpace::total_violation(&violations);
        if total_violation > 0.0 {
            return Evaluation {
                objectives: vec![f64::INFINITY; self.objectives.len()],
                violations,
                total_violation,
            };
        }

        let enclosure = match self.space.decode(x, &self.medium) {
            Ok(e) => e,
            Err(_) => {
                // Degenerate geometry the constraints did not anticipate:
                // treat as maximally infeasible rather than aborting the run.
                return Evaluation {
                    objectives: vec![f64::INFINITY; self.objectives.len()],
                    violations,
                    total_violation: 1.0,
                };
            }
        };
        let response = match enclosure.frequency_response(&self.driver, &self.grid, &self.medium)
        {
            Ok(r) => r,
            Err(_) => {
                return Evaluation {
                    objectives: vec![f64::INFINITY; self.objectives.len()],
                    violations,
                    total_violation: 1.0,
                };
            }
        };

        let flat_band = metrics::flatness_band(enclosure.horn_cutoff(&self.medium));
        let objectives = self
            .objectives
            .iter()
            .map(|o| match o {
                Objective::F3 => metrics::f3(
                    &response.frequencies,
                    &response.spl_db,
                    self.reference_band,
                ),
                Objective::Flatness => {
                    metrics::flatness_std(&response.frequencies, &response.spl_db, flat_band)
                }
                Objective::NegEfficiency => -self.driver.reference_efficiency(&self.medium),
                Objective::Volume => enclosure.enclosure_volume(),
            })
            .collect();

        Evaluation {
            objectives,
            violations,
            total_violation,
        }
    }
}
