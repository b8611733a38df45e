//! Error types for the hb-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors behind one
/// interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Case error: {0}")]
    Case(String),

    #[error("Failed to read case file: {path}")]
    CaseFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Case validation failed: {0}")]
    Validation(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hb-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<hb_case::CaseError> for AppError {
    fn from(err: hb_case::CaseError) -> Self {
        match err {
            hb_case::CaseError::Validation(inner) => AppError::Validation(inner.to_string()),
            other => AppError::Case(other.to_string()),
        }
    }
}

impl From<hb_solver::SolverError> for AppError {
    fn from(err: hb_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<hb_results::ResultsError> for AppError {
    fn from(err: hb_results::ResultsError) -> Self {
        match err {
            hb_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Results(err.to_string())
    }
}
