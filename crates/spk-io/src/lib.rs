//! External boundaries of the enclosure engine: the driver catalogue
//! (YAML/JSON Thiele–Small records) and the Hornresp text format (record
//! emitter plus readers for cross-validation). Unit conversions live here
//! and nowhere else; the core is SI throughout.

pub mod catalog;
pub mod hornresp;

pub use catalog::{CatalogError, DriverRecord, DriverSource, FileCatalog};
pub use hornresp::{
    emit, parse_results, HornrespError, HornrespRecord, HornrespResults, MAX_SEGMENTS,
};
