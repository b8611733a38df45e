use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use hb_case::{
    CaseError, ConstraintMode, DeviceConfig, HookPoint, SteamLevel, ValidationError, case_at_point,
    expand_grid, load_case,
};

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

const FLAT_JSON: &str = r#"{
  "ambient": {"Ta_C": 35.0, "RH_pct": 60.0, "P_bar": 1.01325},
  "gas_turbine": {
    "ISO_power_MW": 270.0,
    "ISO_heat_rate_kJ_per_kWh": 9700.0,
    "ISO_exhaust_temp_C": 600.0,
    "ISO_exhaust_flow_kg_s": 650.0,
    "fuel_LHV_kJ_per_kg": 50000.0
  },
  "hrsg": {"hp": {"pinch_K": 8.0}},
  "devices": [
    {"type": "attemperator", "id": "att_hp", "level": "hp", "limits": {"m_dot_max_kg_s": 5.0}}
  ]
}"#;

const FIXED_YAML: &str = "\
schema_version: \"0.3\"
units_system: SI_IF97
fixed:
  ambient: {Ta_C: 20.0, RH_pct: 50.0, P_bar: 1.0}
  gas_turbine:
    ISO_power_MW: 270.0
    ISO_heat_rate_kJ_per_kWh: 9700.0
    ISO_exhaust_temp_C: 600.0
    ISO_exhaust_flow_kg_s: 650.0
    fuel_LHV_kJ_per_kg: 50000.0
constraints:
  stack_mode: relax
vary:
  ambient.Ta_C: [5.0, 25.0, 45.0]
  bop.aux_load_MW: {start: 4.0, stop: 8.0, step: 4.0}
";

#[test]
fn flat_json_case_merges_over_defaults() {
    let dir = unique_temp_dir("hb_case_flat");
    let path = dir.join("summer.json");
    fs::write(&path, FLAT_JSON).expect("failed to write case");

    let prepared = load_case(&path).expect("case should load");
    let case = &prepared.config;
    assert_eq!(case.meta.input_case.as_deref(), Some("summer.json"));
    assert_eq!(case.hrsg.level(SteamLevel::Hp).pinch_k, 8.0);
    assert_eq!(case.hrsg.level(SteamLevel::Hp).pressure_bar, 120.0);
    assert_eq!(case.hrsg.stack_temp_min_c, 90.0);
    assert_eq!(case.devices.len(), 1);
    assert!(matches!(case.devices[0], DeviceConfig::Attemperator { .. }));
    assert_eq!(
        case.devices[0].active_hooks(),
        vec![HookPoint::PreHrsg, HookPoint::PostHrsg]
    );
    assert!(prepared.axes.is_empty());
    assert_eq!(prepared.merged["condenser"]["vacuum_kPa_abs"], 8.0);
}

#[test]
fn fixed_yaml_case_migrates_and_carries_grid() {
    let dir = unique_temp_dir("hb_case_yaml");
    let path = dir.join("grid.yaml");
    fs::write(&path, FIXED_YAML).expect("failed to write case");

    let prepared = load_case(&path).expect("case should load");
    assert_eq!(prepared.config.ambient.ta_c, 20.0);
    assert_eq!(prepared.config.constraints.stack_mode, ConstraintMode::Relax);
    assert_eq!(prepared.config.meta.case_schema_version.as_deref(), Some("0.3"));

    let grid = expand_grid(&prepared.axes);
    assert_eq!(grid.len(), 6);

    let (config, merged) = case_at_point(&prepared.merged, &grid[5]).expect("grid point");
    assert_eq!(config.ambient.ta_c, 45.0);
    assert_eq!(config.bop.aux_load_mw, 8.0);
    assert_eq!(merged["ambient"]["Ta_C"], 45.0);
}

#[test]
fn missing_gas_turbine_rating_is_rejected() {
    let dir = unique_temp_dir("hb_case_missing");
    let path = dir.join("incomplete.json");
    fs::write(&path, r#"{"ambient": {"Ta_C": 15.0}}"#).expect("failed to write case");

    match load_case(&path) {
        Err(CaseError::Validation(ValidationError::MissingField { field })) => {
            assert_eq!(field, "gas_turbine.ISO_power_MW");
        }
        other => panic!("expected missing field, got {other:?}"),
    }
}

#[test]
fn out_of_order_pressures_are_rejected() {
    let dir = unique_temp_dir("hb_case_pressures");
    let path = dir.join("inverted.json");
    let mut raw: serde_json::Value = serde_json::from_str(FLAT_JSON).unwrap();
    raw["hrsg"]["ip"] = serde_json::json!({"pressure_bar": 130.0});
    fs::write(&path, raw.to_string()).expect("failed to write case");

    assert!(matches!(
        load_case(&path),
        Err(CaseError::Validation(ValidationError::InvalidValue { .. }))
    ));
}

#[test]
fn grid_point_outside_valid_range_is_rejected() {
    let dir = unique_temp_dir("hb_case_grid_bad");
    let path = dir.join("grid.yaml");
    fs::write(&path, FIXED_YAML.replace("45.0", "75.0")).expect("failed to write case");

    let prepared = load_case(&path).expect("base case is valid");
    let grid = expand_grid(&prepared.axes);
    assert!(case_at_point(&prepared.merged, &grid[0]).is_ok());
    assert!(case_at_point(&prepared.merged, &grid[5]).is_err());
}

#[test]
fn unreadable_file_is_an_io_error() {
    let dir = unique_temp_dir("hb_case_none");
    assert!(matches!(
        load_case(&dir.join("absent.json")),
        Err(CaseError::Io(_))
    ));
}
