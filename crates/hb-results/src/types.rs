//! Result data types.

use hb_case::GridPoint;
use hb_solver::{PlantResult, WarningCode};
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    /// File name of the case the run was made from.
    pub case_name: String,
    pub timestamp: String,
    pub solver_version: String,
    /// Batch axis values when the run is one point of a grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_point: Option<GridPoint>,
    pub converged: bool,
    #[serde(rename = "NET_power_MW")]
    pub net_power_mw: f64,
    pub closure_error_pct: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warning_codes: Vec<WarningCode>,
}

impl RunManifest {
    pub fn new(
        run_id: RunId,
        case_name: String,
        timestamp: String,
        solver_version: String,
        result: &PlantResult,
    ) -> Self {
        Self {
            run_id,
            case_name,
            timestamp,
            solver_version,
            grid_point: None,
            converged: result.meta.converged,
            net_power_mw: result.summary.net_power_mw,
            closure_error_pct: result.mass_energy_balance.closure_error_pct,
            warning_codes: result.meta.warnings.iter().map(|w| w.code).collect(),
        }
    }

    pub fn with_grid_point(mut self, point: GridPoint) -> Self {
        self.grid_point = Some(point);
        self
    }
}
