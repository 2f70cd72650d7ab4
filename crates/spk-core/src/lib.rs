//! Acoustic simulation core for loudspeaker enclosures.
//!
//! Predicts the electrical input impedance and on-axis SPL (1 m, 2.83 V)
//! of a Thiele–Small driver in sealed, ported, and horn-loaded enclosures
//! over an arbitrary frequency grid. Everything is SI internally, pure,
//! and reentrant: the medium, driver record, and geometry are immutable
//! value types threaded through free-function solvers.

pub mod bessel;
pub mod chamber;
pub mod driver;
pub mod enclosure;
pub mod error;
pub mod horn;
pub mod medium;
pub mod metrics;
pub mod port;
pub mod ported;
pub mod radiation;
pub mod response;
pub mod sealed;
pub mod segment;
pub mod transfer_matrix;

pub use driver::{DriverParams, ThieleSmall};
pub use enclosure::{Enclosure, EnclosureFamily};
pub use error::AcousticError;
pub use horn::HornGeometry;
pub use medium::{Medium, RadiationSpace};
pub use ported::PortedGeometry;
pub use response::{Diagnostic, FrequencyGrid, ResponseBundle, DRIVE_VOLTAGE};
pub use sealed::SealedGeometry;
pub use segment::{Segment, SegmentShape};
pub use transfer_matrix::TransferMatrix;
