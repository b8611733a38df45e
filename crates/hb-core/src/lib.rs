//! hb-core: shared foundation for the heat balance solver.
//!
//! Contains:
//! - units (uom SI types + plant-unit conversions)
//! - numeric (Real + tolerances + float helpers + bounded root finding)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{HbError, HbResult};
pub use numeric::*;
pub use units::*;
