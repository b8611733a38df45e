//! Run execution and caching service.

use hb_case::{CaseConfiguration, GridPoint};
use hb_props::{If97Properties, PropertyService};
use hb_results::{RunManifest, RunStore, compute_run_id};
use hb_solver::{PipelineTrace, PlantResult, RunMeta, run_pipeline};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::case_service;
use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};

/// Options for running cases.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
    pub solver_commit: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
            solver_commit: option_env!("HEATBAL_COMMIT").map(str::to_string),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub case_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub solve_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub result: PlantResult,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream stage events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingCase,
        started,
        Some(request.case_path.display().to_string()),
    );
    let prepared = case_service::load_case(request.case_path)?;
    if !prepared.axes.is_empty() {
        warn!(
            axes = prepared.axes.len(),
            "case declares batch axes; running the base point only"
        );
    }

    let store = RunStore::for_case(request.case_path)?;
    let point = PointRequest {
        config: &prepared.config,
        case_name: case_service::case_name(request.case_path),
        grid_point: None,
    };
    let response = run_point(
        &point,
        &store,
        &request.options,
        &If97Properties::new(),
        &mut progress_cb,
        started,
    )?;

    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some(if response.loaded_from_cache {
            "Loaded cached run".to_string()
        } else {
            "Run completed".to_string()
        }),
    );
    Ok(response)
}

/// One case configuration to run, single or a grid point.
pub(crate) struct PointRequest<'a> {
    pub config: &'a CaseConfiguration,
    pub case_name: String,
    pub grid_point: Option<GridPoint>,
}

/// Run one configuration through the cache.
pub(crate) fn run_point(
    point: &PointRequest<'_>,
    store: &RunStore,
    options: &RunOptions,
    props: &dyn PropertyService,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
) -> AppResult<RunResponse> {
    let mut timing = RunTimingSummary::default();

    emit_progress(progress_cb, RunStage::CheckingCache, started, None);
    let run_id = compute_run_id(point.config, &options.solver_version);

    if options.use_cache && store.has_run(&run_id) {
        emit_progress(progress_cb, RunStage::LoadingCachedResult, started, None);
        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        let result = store.load_result(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();
        info!(run_id = %run_id, "loaded cached run");

        return Ok(RunResponse {
            run_id,
            manifest,
            result,
            loaded_from_cache: true,
            timing,
        });
    }

    emit_progress(progress_cb, RunStage::Solving, started, None);
    let solve_started = Instant::now();
    let timestamp = chrono::Utc::now().to_rfc3339();
    let meta = RunMeta {
        timestamp_utc: Some(timestamp.clone()),
        solver_version: options.solver_version.clone(),
        solver_commit: options.solver_commit.clone(),
    };
    let artifacts = run_pipeline(point.config, props, meta)?;
    timing.solve_time_s = solve_started.elapsed().as_secs_f64();

    emit_progress(progress_cb, RunStage::SavingResults, started, None);
    let save_started = Instant::now();
    let mut manifest = RunManifest::new(
        run_id.clone(),
        point.case_name.clone(),
        timestamp,
        options.solver_version.clone(),
        &artifacts.result,
    );
    if let Some(grid_point) = &point.grid_point {
        manifest = manifest.with_grid_point(grid_point.clone());
    }
    store.save_run(&manifest, &artifacts)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();
    info!(
        run_id = %run_id,
        converged = manifest.converged,
        net_mw = manifest.net_power_mw,
        "run saved"
    );

    Ok(RunResponse {
        run_id,
        manifest,
        result: artifacts.result,
        loaded_from_cache: false,
        timing,
    })
}

/// List cached runs made from a case file, most recent first.
pub fn list_runs(case_path: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_case(case_path)?;
    let case_name = case_service::case_name(case_path);

    let mut runs = store.list_runs(Some(&case_name))?;
    runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(runs)
}

/// Load a specific run.
pub fn load_run(case_path: &Path, run_id: &str) -> AppResult<(RunManifest, PlantResult)> {
    let store = RunStore::for_case(case_path)?;

    let manifest = store.load_manifest(run_id)?;
    let result = store.load_result(run_id)?;

    Ok((manifest, result))
}

/// Load the per-stage trace of a run.
pub fn load_trace(case_path: &Path, run_id: &str) -> AppResult<PipelineTrace> {
    let store = RunStore::for_case(case_path)?;
    Ok(store.load_trace(run_id)?)
}

/// Write a result as pretty JSON.
pub fn write_result(path: &Path, result: &PlantResult) -> AppResult<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    Ok(())
}
