use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use hb_app::{
    AppError, BatchRequest, RunOptions, RunRequest, RunStage, batch_csv, ensure_run,
    ensure_run_with_progress, list_runs, load_run, load_trace, run_batch, stage_steps,
    validate_case_file,
};
use hb_results::RunStore;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

const SUMMER_CASE: &str = "\
ambient: {Ta_C: 35.0, RH_pct: 60.0, P_bar: 1.01325}
gas_turbine:
  ISO_power_MW: 270.0
  ISO_heat_rate_kJ_per_kWh: 9700.0
  ISO_exhaust_temp_C: 600.0
  ISO_exhaust_flow_kg_s: 650.0
  fuel_LHV_kJ_per_kg: 50000.0
  corr_coeff: {dPower_pct_per_K: -0.45, dFlow_pct_per_K: -0.3, dExhT_K_per_K: 0.25, dHeatRate_pct_per_K: 0.1}
hrsg:
  ip: {steam_temp_C: 250.0}
  lp: {steam_temp_C: 170.0}
  stack_temp_min_C: 80.0
bop: {aux_load_MW: 8.0}
devices:
  - {type: attemperator, id: att_hp, level: hp, limits: {m_dot_max_kg_s: 20.0}}
";

const GRID_CASE: &str = "\
schema_version: \"0.3\"
fixed:
  gas_turbine:
    ISO_power_MW: 270.0
    ISO_heat_rate_kJ_per_kWh: 9700.0
    ISO_exhaust_temp_C: 600.0
    ISO_exhaust_flow_kg_s: 650.0
    fuel_LHV_kJ_per_kg: 50000.0
    corr_coeff: {dPower_pct_per_K: -0.45, dFlow_pct_per_K: -0.3, dExhT_K_per_K: 0.25}
  hrsg:
    ip: {steam_temp_C: 250.0}
    lp: {steam_temp_C: 170.0}
    stack_temp_min_C: 80.0
vary:
  ambient.Ta_C: [40.0, 0.0, 20.0, -10.0, 30.0]
";

fn options(use_cache: bool) -> RunOptions {
    RunOptions {
        use_cache,
        solver_version: "0.1.0".to_string(),
        solver_commit: None,
    }
}

#[test]
fn run_persists_in_case_store_and_hits_cache() {
    let dir = unique_temp_dir("hb_app_run");
    let case_path = dir.join("summer.yaml");
    fs::write(&case_path, SUMMER_CASE).expect("failed to write case");

    let first = ensure_run(&RunRequest {
        case_path: &case_path,
        options: options(true),
    })
    .expect("run failed");
    assert!(!first.loaded_from_cache);
    assert!(first.result.meta.timestamp_utc.is_some());
    assert_eq!(first.result.meta.solver_version, "0.1.0");

    let store = RunStore::for_case(&case_path).expect("store");
    assert!(store.has_run(&first.run_id));

    let second = ensure_run(&RunRequest {
        case_path: &case_path,
        options: options(true),
    })
    .expect("cached run failed");
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(second.manifest.timestamp, first.manifest.timestamp);

    let runs = list_runs(&case_path).expect("list runs");
    assert_eq!(runs.len(), 1);

    let (manifest, result) = load_run(&case_path, &first.run_id).expect("load run");
    assert_eq!(manifest.case_name, "summer.yaml");
    assert_eq!(result.meta.converged, first.result.meta.converged);

    let trace = load_trace(&case_path, &first.run_id).expect("load trace");
    let steps = stage_steps(&result, &trace);
    assert_eq!(steps.first().map(|s| s.stage), Some("ambient"));
    assert_eq!(steps.last().map(|s| s.stage), Some("balance"));
    assert!(steps.iter().any(|s| s.stage == "HP" && s.detail.contains("spray")));
}

#[test]
fn no_cache_reruns_under_the_same_id() {
    let dir = unique_temp_dir("hb_app_nocache");
    let case_path = dir.join("summer.yaml");
    fs::write(&case_path, SUMMER_CASE).expect("failed to write case");

    let first = ensure_run(&RunRequest {
        case_path: &case_path,
        options: options(true),
    })
    .unwrap();

    let mut stages = Vec::new();
    let rerun = ensure_run_with_progress(
        &RunRequest {
            case_path: &case_path,
            options: options(false),
        },
        Some(&mut |event| stages.push(event.stage)),
    )
    .unwrap();
    assert!(!rerun.loaded_from_cache);
    assert_eq!(rerun.run_id, first.run_id);
    assert!(stages.contains(&RunStage::Solving));
    assert_eq!(stages.last(), Some(&RunStage::Completed));
    assert_eq!(rerun.result.summary, first.result.summary);
}

#[test]
fn batch_keeps_grid_order() {
    let dir = unique_temp_dir("hb_app_batch");
    let case_path = dir.join("grid.yaml");
    fs::write(&case_path, GRID_CASE).expect("failed to write case");

    let summary = validate_case_file(&case_path).expect("grid case is valid");
    assert_eq!(summary.grid_points, 5);
    assert_eq!(summary.axis_paths, vec!["ambient.Ta_C".to_string()]);

    let request = BatchRequest {
        case_path: &case_path,
        options: options(true),
    };
    let response = run_batch(&request).expect("batch failed");
    let temps: Vec<f64> = response.points.iter().map(|p| p.point[0].1).collect();
    assert_eq!(temps, vec![40.0, 0.0, 20.0, -10.0, 30.0]);
    for (i, point) in response.points.iter().enumerate() {
        assert_eq!(point.index, i);
    }

    // Colder air, more GT power.
    let power = |ta: f64| {
        response
            .points
            .iter()
            .find(|p| p.point[0].1 == ta)
            .map(|p| p.summary.gt_power_mw)
            .unwrap()
    };
    assert!(power(-10.0) > power(0.0));
    assert!(power(0.0) > power(20.0));
    assert!(power(30.0) > power(40.0));

    let csv = batch_csv(&response);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("index,ambient.Ta_C,GT_power_MW"));
    assert!(lines[1].starts_with("0,40,"));

    let again = run_batch(&request).expect("cached batch failed");
    assert_eq!(again.cached_count(), 5);
}

#[test]
fn repeated_grid_values_share_one_run() {
    let dir = unique_temp_dir("hb_app_batch_repeat");
    let case_path = dir.join("repeat.yaml");
    let case = GRID_CASE.replace("[40.0, 0.0, 20.0, -10.0, 30.0]", "[20.0, 30.0, 20.0]");
    fs::write(&case_path, case).expect("failed to write case");

    let response = run_batch(&BatchRequest {
        case_path: &case_path,
        options: options(true),
    })
    .expect("batch failed");
    assert_eq!(response.points.len(), 3);
    assert_eq!(response.points[0].run_id, response.points[2].run_id);
    assert_ne!(response.points[0].run_id, response.points[1].run_id);
    assert_eq!(response.points[0].summary, response.points[2].summary);
    assert_eq!(response.points[2].index, 2);
    assert_eq!(response.cached_count(), 0);

    let runs = list_runs(&case_path).expect("list runs");
    assert_eq!(runs.len(), 2);
}

#[test]
fn missing_case_file_is_reported() {
    let dir = unique_temp_dir("hb_app_missing");
    let err = validate_case_file(&dir.join("nope.yaml")).unwrap_err();
    assert!(matches!(err, AppError::CaseFileRead { .. }));
}

#[test]
fn invalid_case_is_a_validation_error() {
    let dir = unique_temp_dir("hb_app_invalid");
    let case_path = dir.join("bad.yaml");
    fs::write(&case_path, "ambient: {Ta_C: 15.0}\n").unwrap();
    let err = validate_case_file(&case_path).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
