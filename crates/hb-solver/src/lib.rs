//! Staged heat balance solver for a three-pressure combined-cycle plant.
//!
//! Stages, in run order: ambient correction, gas turbine, HRSG, steam
//! turbine, condenser, plant summary. Optional devices act between stages at
//! fixed hook points. [`run_pipeline`] drives a complete run.

pub mod ambient;
pub mod condenser;
pub mod devices;
pub mod error;
pub mod gas_turbine;
pub mod hrsg;
pub mod pipeline;
pub mod steam_turbine;
pub mod summary;
pub mod warnings;

pub use ambient::{AmbientState, CorrectionFactors};
pub use condenser::CondenserResult;
pub use devices::{Device, DeviceHookRunner, HookContext, PlantModel};
pub use error::{SolverError, SolverResult};
pub use gas_turbine::{ExhaustGasState, GtResult};
pub use hrsg::{HrsgResult, LevelResult, SteamStreamState};
pub use pipeline::{PipelineArtifacts, PipelineTrace, PlantResult, RunMeta, run_pipeline};
pub use steam_turbine::{StResult, StSectionResult};
pub use summary::{PlantBalance, PlantSummary};
pub use warnings::{Warning, WarningCode};
