//! Property lookup errors.

use hb_core::HbError;
use thiserror::Error;

/// Result type for property lookups.
pub type PropertyResult<T> = Result<T, PropertyError>;

/// A property service could not resolve the requested state.
///
/// Every variant is fatal for a heat balance run: there is no valid
/// thermodynamic state to continue from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// Input outside the correlation's validity domain.
    #[error("{what} out of range: p={p_bar} bar, value={value}")]
    OutOfRange {
        what: &'static str,
        p_bar: f64,
        value: f64,
    },

    /// Non-physical input (non-positive pressure, NaN, ...).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Backend returned NaN or failed.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Inverse lookup (p,h) or (p,s) failed to converge.
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },
}

impl From<HbError> for PropertyError {
    fn from(err: HbError) -> Self {
        match err {
            HbError::NotBracketed { what, .. } | HbError::NoConvergence { what, .. } => {
                PropertyError::ConvergenceFailed { what }
            }
            HbError::NonFinite { what, .. } | HbError::InvalidArg { what } => {
                PropertyError::NonPhysical { what }
            }
        }
    }
}
