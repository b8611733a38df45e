//! Parameter-grid execution.
//!
//! Every grid point is an independent pipeline run with its own cache entry.
//! Points run in parallel; the response keeps grid order. Points that map to
//! the same run id (repeated axis values) are solved once and share it.

use hb_case::{BatchAxis, CaseConfiguration, GridPoint, case_at_point, expand_grid};
use hb_props::If97Properties;
use hb_results::{RunStore, compute_run_id};
use hb_solver::{PlantSummary, WarningCode};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::case_service;
use crate::error::AppResult;
use crate::run_service::{PointRequest, RunOptions, RunResponse, run_point};

pub struct BatchRequest<'a> {
    pub case_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone)]
pub struct BatchPointResult {
    pub index: usize,
    pub point: GridPoint,
    pub run_id: String,
    pub loaded_from_cache: bool,
    pub converged: bool,
    pub closure_error_pct: f64,
    pub summary: PlantSummary,
    pub warning_codes: Vec<WarningCode>,
}

#[derive(Debug, Clone)]
pub struct BatchResponse {
    pub case_name: String,
    pub axes: Vec<BatchAxis>,
    pub points: Vec<BatchPointResult>,
    pub total_time_s: f64,
}

impl BatchResponse {
    pub fn converged_count(&self) -> usize {
        self.points.iter().filter(|p| p.converged).count()
    }

    pub fn cached_count(&self) -> usize {
        self.points.iter().filter(|p| p.loaded_from_cache).count()
    }
}

/// Run every point of the case's `vary` grid. A case without axes is a
/// one-point grid.
pub fn run_batch(request: &BatchRequest) -> AppResult<BatchResponse> {
    let started = Instant::now();
    let prepared = case_service::load_case(request.case_path)?;
    let case_name = case_service::case_name(request.case_path);
    let store = RunStore::for_case(request.case_path)?;
    let props = If97Properties::new();

    let grid = expand_grid(&prepared.axes);
    info!(case = %case_name, points = grid.len(), "batch start");

    let configs = grid
        .iter()
        .map(|point| -> AppResult<CaseConfiguration> {
            Ok(case_at_point(&prepared.merged, point)?.0)
        })
        .collect::<AppResult<Vec<_>>>()?;

    // One slot per distinct run id, owned by its first grid point.
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut owners: Vec<usize> = Vec::new();
    let slot_of: Vec<usize> = configs
        .iter()
        .enumerate()
        .map(|(index, config)| {
            let run_id = compute_run_id(config, &request.options.solver_version);
            *slots.entry(run_id).or_insert_with(|| {
                owners.push(index);
                owners.len() - 1
            })
        })
        .collect();
    if owners.len() < grid.len() {
        info!(
            repeated = grid.len() - owners.len(),
            "grid points share a run"
        );
    }

    let responses = owners
        .par_iter()
        .map(|&index| -> AppResult<RunResponse> {
            let point = &grid[index];
            let target = PointRequest {
                config: &configs[index],
                case_name: case_name.clone(),
                grid_point: (!point.is_empty()).then(|| point.clone()),
            };
            run_point(
                &target,
                &store,
                &request.options,
                &props,
                &mut None,
                Instant::now(),
            )
        })
        .collect::<AppResult<Vec<_>>>()?;

    let points = grid
        .iter()
        .zip(slot_of)
        .enumerate()
        .map(|(index, (point, slot))| {
            let response = &responses[slot];
            BatchPointResult {
                index,
                point: point.clone(),
                run_id: response.run_id.clone(),
                loaded_from_cache: response.loaded_from_cache,
                converged: response.result.meta.converged,
                closure_error_pct: response.result.mass_energy_balance.closure_error_pct,
                summary: response.result.summary.clone(),
                warning_codes: response.manifest.warning_codes.clone(),
            }
        })
        .collect();

    let response = BatchResponse {
        case_name,
        axes: prepared.axes,
        points,
        total_time_s: started.elapsed().as_secs_f64(),
    };
    info!(
        points = response.points.len(),
        converged = response.converged_count(),
        cached = response.cached_count(),
        "batch done"
    );
    Ok(response)
}
