//! hb-props: steam/water property service for the heat balance solver.
//!
//! Provides:
//! - `PropertyService` trait (saturation, single-phase h/s, inverse lookups)
//! - `If97Properties` backend on top of `seuif97`
//! - moist-air helpers used by ambient correction and inlet cooling
//!
//! The rest of the workspace only talks to `PropertyService`, so a
//! different correlation library can be swapped in without touching the
//! solver.

pub mod error;
pub mod humid_air;
pub mod if97;
pub mod service;

pub use error::{PropertyError, PropertyResult};
pub use if97::If97Properties;
pub use service::{PropertyService, Saturation, SteamPoint};
