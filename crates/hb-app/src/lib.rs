//! Shared application service layer for heatbal.
//!
//! Case loading, cached single runs and batch grids, behind one interface
//! for the CLI.

pub mod batch_service;
pub mod case_service;
pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;

pub use batch_service::{BatchPointResult, BatchRequest, BatchResponse, run_batch};
pub use case_service::{CaseSummary, DeviceSummary, load_case, validate_case_file};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use query::{StageStep, batch_csv, stage_steps};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    list_runs, load_run, load_trace,
};
