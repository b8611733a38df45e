//! Error types for the heat balance pipeline.

use hb_core::HbError;
use hb_props::PropertyError;
use thiserror::Error;

/// Fatal pipeline errors. Constraint and convergence trouble is reported
/// through warnings and `converged` flags instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Property lookup error: {0}")]
    Property(#[from] PropertyError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<HbError> for SolverError {
    fn from(e: HbError) -> Self {
        SolverError::Numeric {
            what: e.to_string(),
        }
    }
}

impl SolverError {
    pub(crate) fn missing(field: &str) -> Self {
        SolverError::Configuration {
            what: format!("missing required field {field}"),
        }
    }
}
