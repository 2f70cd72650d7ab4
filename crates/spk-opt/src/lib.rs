//! Design engine for loudspeaker enclosures: declarative parameter spaces,
//! an NSGA-II multi-objective optimizer with constraint dominance, and a
//! one-dimensional parameter-sweep facility.
//!
//! Candidate evaluation goes through `spk-core` and is pure; a generation
//! of evaluations is dispatched across a rayon pool and collected in
//! candidate order, so results are reproducible by seed regardless of
//! worker count.

pub mod nsga;
pub mod objective;
pub mod space;
pub mod sweep;

pub use nsga::{optimize, Design, NsgaConfig, OptimizeMeta, OptimizeResult};
pub use objective::{Evaluation, EvaluationContext, Objective};
pub use space::{DesignSpace, HornProfile, HornSpace, ParamSlot, PortedSpace, Scale, SealedSpace};
pub use sweep::{sweep, SweepConfig, SweepResult, SweepSeries, Trend};
