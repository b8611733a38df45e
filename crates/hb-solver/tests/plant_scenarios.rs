//! End-to-end heat balance scenarios.
//!
//! Each case is built the way the CLI builds it: raw JSON layered over the
//! built-in defaults, validated, then handed to the pipeline.

use hb_case::{SteamLevel, prepare_case};
use hb_props::If97Properties;
use hb_solver::summary::closure_error_pct;
use hb_solver::{PipelineArtifacts, RunMeta, WarningCode, run_pipeline};
use serde_json::{Value, json};

fn nominal_summer() -> Value {
    json!({
        "meta": {"description": "hot day, no devices"},
        "ambient": {"Ta_C": 35.0, "RH_pct": 60.0, "P_bar": 1.01325},
        "gas_turbine": {
            "ISO_power_MW": 270.0,
            "ISO_heat_rate_kJ_per_kWh": 9700.0,
            "ISO_exhaust_temp_C": 600.0,
            "ISO_exhaust_flow_kg_s": 650.0,
            "fuel_LHV_kJ_per_kg": 50000.0,
            "corr_coeff": {
                "dPower_pct_per_K": -0.45,
                "dFlow_pct_per_K": -0.3,
                "dExhT_K_per_K": 0.25,
                "dHeatRate_pct_per_K": 0.1
            }
        },
        "hrsg": {
            "ip": {"steam_temp_C": 250.0},
            "lp": {"steam_temp_C": 170.0},
            "stack_temp_min_C": 80.0
        },
        "bop": {"aux_load_MW": 8.0}
    })
}

fn with(mut base: Value, overlay: Value) -> Value {
    merge(&mut base, overlay);
    base
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

fn run(raw: Value) -> PipelineArtifacts {
    let prepared = prepare_case(raw, "scenario.json").unwrap();
    run_pipeline(&prepared.config, &If97Properties::new(), RunMeta::default()).unwrap()
}

fn has_warning(artifacts: &PipelineArtifacts, code: WarningCode) -> bool {
    artifacts.result.meta.warnings.iter().any(|w| w.code == code)
}

#[test]
fn nominal_summer_case_balances() {
    let out = run(nominal_summer());
    let r = &out.result;

    assert!(r.summary.gt_power_mw < 270.0);
    assert!(r.summary.gt_power_mw > 230.0);
    for level in SteamLevel::ALL {
        assert!(r.hrsg_block.stream(level).flow_kg_s > 0.0, "{level:?}");
    }
    assert_eq!(
        r.summary.net_power_mw,
        r.summary.gt_power_mw + r.summary.st_power_mw - r.summary.aux_load_mw
    );
    assert!(r.summary.st_power_mw > 80.0 && r.summary.st_power_mw < 160.0);
    assert!(r.summary.net_eff_lhv_pct > 45.0 && r.summary.net_eff_lhv_pct < 65.0);
    assert!(r.hrsg_block.stack_temp_c >= 80.0 - 1e-6);
    assert!(r.mass_energy_balance.closure_error_pct < 1e-6);
    assert!(r.mass_energy_balance.converged);
    assert!(r.meta.converged);
    assert_eq!(r.meta.input_case.as_deref(), Some("scenario.json"));
}

#[test]
fn closure_error_matches_its_definition() {
    let out = run(nominal_summer());
    let balance = &out.result.mass_energy_balance;
    assert_eq!(
        balance.closure_error_pct,
        closure_error_pct(balance.energy_in_mw, balance.energy_out_mw)
    );
    assert_eq!(balance.energy_in_mw, out.result.summary.fuel_heat_input_mw);
    assert!((balance.energy_out.total() - balance.energy_out_mw).abs() < 1e-12);
}

#[test]
fn condensate_returned_equals_steam_raised() {
    let out = run(nominal_summer());
    let r = &out.result;
    assert!((r.condenser_block.steam_flow_kg_s - r.hrsg_block.total_steam_kg_s()).abs() < 1e-9);
    assert!((r.mass_energy_balance.steam_flow_kg_s - r.st_block.exhaust.flow_kg_s).abs() < 1e-9);
}

#[test]
fn runs_are_deterministic() {
    let first = run(nominal_summer());
    let second = run(nominal_summer());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.result).unwrap(),
        serde_json::to_string(&second.result).unwrap()
    );
}

#[test]
fn run_meta_is_carried_into_the_result() {
    let prepared = prepare_case(nominal_summer(), "nominal_summer.json").unwrap();
    let meta = RunMeta {
        timestamp_utc: Some("2026-01-01T00:00:00Z".to_string()),
        solver_version: "9.9.9".to_string(),
        solver_commit: Some("abc123".to_string()),
    };
    let out = run_pipeline(&prepared.config, &If97Properties::new(), meta).unwrap();
    assert_eq!(out.result.meta.timestamp_utc.as_deref(), Some("2026-01-01T00:00:00Z"));
    assert_eq!(out.result.meta.solver_version, "9.9.9");
    assert_eq!(out.result.meta.property_backend, "IAPWS-IF97");
}

#[test]
fn gt_power_falls_with_ambient_temperature() {
    let powers: Vec<f64> = [-10.0, 5.0, 20.0, 35.0, 45.0]
        .into_iter()
        .map(|ta| {
            let raw = with(nominal_summer(), json!({"ambient": {"Ta_C": ta}}));
            run(raw).result.summary.gt_power_mw
        })
        .collect();
    assert!(powers.windows(2).all(|w| w[1] < w[0]), "{powers:?}");
}

fn cold_exhaust(pinch_mode: &str) -> Value {
    with(
        nominal_summer(),
        json!({
            "ambient": {"Ta_C": 15.0},
            "gas_turbine": {"ISO_exhaust_temp_C": 330.0},
            "constraints": {"pinch_mode": pinch_mode}
        }),
    )
}

#[test]
fn enforced_pinch_shuts_in_hp_and_fails_convergence() {
    let out = run(cold_exhaust("enforce"));
    let r = &out.result;
    assert!(has_warning(&out, WarningCode::HrsgPinchViolation));
    assert!(!r.hrsg_block.converged);
    assert!(!r.mass_energy_balance.converged);
    assert!(!r.meta.converged);
    assert_eq!(r.hrsg_block.stream(SteamLevel::Hp).flow_kg_s, 0.0);
}

#[test]
fn relaxed_pinch_keeps_hp_steam_and_converges() {
    let out = run(cold_exhaust("relax"));
    let r = &out.result;
    assert!(has_warning(&out, WarningCode::HrsgPinchViolation));
    assert!(r.hrsg_block.converged);
    assert!(r.mass_energy_balance.converged);
    let hp = r.hrsg_block.level(SteamLevel::Hp);
    assert!(hp.stream.flow_kg_s > 0.0);
    assert_eq!(hp.pinch_applied_k, 1.0);
}

#[test]
fn stack_floor_enforced_curtails_steam() {
    let nominal = run(nominal_summer());
    let out = run(with(nominal_summer(), json!({"hrsg": {"stack_temp_min_C": 130.0}})));
    let r = &out.result;
    assert!(has_warning(&out, WarningCode::HrsgStackTempLow));
    assert!(!r.mass_energy_balance.converged);
    assert!((r.hrsg_block.stack_temp_c - 130.0).abs() < 0.01);
    assert!(r.summary.st_power_mw < nominal.result.summary.st_power_mw);
    assert!(r.mass_energy_balance.closure_error_pct < 1e-6);
}

#[test]
fn converged_flag_tracks_hrsg_and_closure() {
    let cases = [
        nominal_summer(),
        cold_exhaust("enforce"),
        cold_exhaust("relax"),
        with(nominal_summer(), json!({"hrsg": {"stack_temp_min_C": 130.0}})),
        with(nominal_summer(), json!({"hrsg": {"max_passes": 1, "stack_temp_min_C": 130.0}})),
        with(nominal_summer(), json!({"gas_turbine": {"ISO_heat_rate_kJ_per_kWh": 5000.0}})),
    ];
    for raw in cases {
        let r = run(raw).result;
        let expected = r.hrsg_block.converged && r.mass_energy_balance.closure_error_pct <= 0.5;
        assert_eq!(r.mass_energy_balance.converged, expected);
        assert_eq!(r.meta.converged, expected);
    }
}

#[test]
fn attemperator_trims_free_superheater_to_target() {
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "attemperator", "id": "att_hp", "level": "hp", "limits": {"m_dot_max_kg_s": 20.0}}
        ]}),
    );
    let out = run(raw);
    let hp = out.result.hrsg_block.stream(SteamLevel::Hp);
    assert!((hp.temp_c - 540.0).abs() < 1e-3);
    assert!(hp.spray_kg_s > 0.0);
    assert_eq!(out.trace.superheat_free, [true, false, false]);
    assert!(out.result.mass_energy_balance.spray_flow_kg_s > 0.0);
    assert!(out.result.mass_energy_balance.closure_error_pct < 1e-6);
}

#[test]
fn attemperator_saturates_at_flow_limit() {
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "duct_firing", "id": "db1", "fuel_heat_MW": 60.0},
            {"type": "attemperator", "id": "att_hp", "level": "hp", "limits": {"m_dot_max_kg_s": 0.5}}
        ]}),
    );
    let out = run(raw);
    let hp = out.result.hrsg_block.stream(SteamLevel::Hp);
    assert!(has_warning(&out, WarningCode::AttempLimitReached));
    assert!(hp.temp_c > 540.0);
    assert_eq!(hp.spray_kg_s, 0.5);
}

#[test]
fn attemperator_without_excess_superheat_is_a_no_op() {
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "attemperator", "id": "att_hp", "hooks": ["post_HRSG"], "level": "hp",
             "target_temp_C": 560.0, "limits": {"m_dot_max_kg_s": 5.0}}
        ]}),
    );
    let out = run(raw);
    let baseline = run(nominal_summer());
    assert!(has_warning(&out, WarningCode::AttempNotRequired));
    assert_eq!(out.result.summary, baseline.result.summary);
}

#[test]
fn attemperator_without_spray_hook_leaves_superheater_on_target() {
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "attemperator", "id": "att_hp", "hooks": ["pre_HRSG"], "level": "hp",
             "limits": {"m_dot_max_kg_s": 20.0}}
        ]}),
    );
    let out = run(raw);
    let baseline = run(nominal_summer());
    let hp = out.result.hrsg_block.stream(SteamLevel::Hp);
    assert!(hp.temp_c <= 540.0 + 1e-6);
    assert_eq!(hp.spray_kg_s, 0.0);
    assert_eq!(out.trace.superheat_free, [false, false, false]);
    assert_eq!(out.trace.inactive_devices, vec!["att_hp".to_string()]);
    assert!(has_warning(&out, WarningCode::DeviceInactive));
    assert_eq!(out.result.summary, baseline.result.summary);
}

#[test]
fn inconsistent_gt_rating_fails_closure_but_not_hrsg() {
    let out = run(with(
        nominal_summer(),
        json!({"gas_turbine": {"ISO_heat_rate_kJ_per_kWh": 5000.0}}),
    ));
    let r = &out.result;
    assert!(has_warning(&out, WarningCode::GtEnergyInconsistent));
    assert!(has_warning(&out, WarningCode::ClosureGt0p5));
    assert!(!has_warning(&out, WarningCode::ClosureNearLimit));
    assert!(r.mass_energy_balance.closure_error_pct > 0.5);
    assert!(r.hrsg_block.converged);
    assert!(!r.mass_energy_balance.converged);
    assert!(!r.meta.converged);
    assert_eq!(r.mass_energy_balance.energy_out.gt_loss_mw, 0.0);
}

#[test]
fn duct_firing_raises_steam_and_closes() {
    let baseline = run(nominal_summer());
    let raw = with(
        nominal_summer(),
        json!({"devices": [{"type": "duct_firing", "id": "db1", "fuel_heat_MW": 40.0}]}),
    );
    let out = run(raw);
    let r = &out.result;
    assert!(r.summary.fuel_heat_input_mw > baseline.result.summary.fuel_heat_input_mw + 39.9);
    assert!(out.trace.gas_path.hrsg_inlet.temp_c > out.trace.gas_path.gt_exhaust.temp_c);
    assert!(
        r.hrsg_block.stream(SteamLevel::Hp).flow_kg_s
            > baseline.result.hrsg_block.stream(SteamLevel::Hp).flow_kg_s
    );
    assert!(r.mass_energy_balance.closure_error_pct < 1e-6);
    assert!((r.mass_energy_balance.energy_out.duct_burner_loss_mw - 0.8).abs() < 1e-9);
}

#[test]
fn duct_firing_cap_holds_gas_temperature() {
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "duct_firing", "id": "db1", "fuel_heat_MW": 300.0, "max_gas_temp_C": 700.0}
        ]}),
    );
    let out = run(raw);
    assert!(has_warning(&out, WarningCode::DuctFiringLimitReached));
    assert!((out.trace.gas_path.hrsg_inlet.temp_c - 700.0).abs() < 1e-6);
    assert!(out.trace.gas_path.duct_firing.fuel_heat_mw < 300.0);
}

#[test]
fn inlet_cooling_recovers_hot_day_power() {
    let baseline = run(nominal_summer());
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "gt_inlet_cool", "id": "fog", "method": {"kind": "evaporative", "effectiveness": 0.9}}
        ]}),
    );
    let out = run(raw);
    assert!(out.trace.compressor_inlet.ta_c < 35.0);
    assert_eq!(out.trace.site.ta_c, 35.0);
    assert!(out.result.summary.gt_power_mw > baseline.result.summary.gt_power_mw);
    assert!(out.trace.inlet_cooling.is_some());
}

#[test]
fn bypass_gas_is_accounted_at_the_stack() {
    let baseline = run(nominal_summer());
    let out = run(with(nominal_summer(), json!({"hrsg": {"bypass_fraction": 0.2}})));
    let r = &out.result;
    let bypass = out.trace.gas_path.bypass.unwrap();
    assert!((bypass.flow_kg_s - 0.2 * out.trace.gas_path.gt_exhaust.flow_kg_s).abs() < 1e-9);
    assert!(r.mass_energy_balance.energy_out.bypass_stack_mw > 0.0);
    assert!(r.hrsg_block.total_steam_kg_s() < baseline.result.hrsg_block.total_steam_kg_s());
    assert!(r.mass_energy_balance.closure_error_pct < 1e-6);
    assert!(
        (r.mass_energy_balance.stack_gas_flow_kg_s - out.trace.gas_path.gt_exhaust.flow_kg_s).abs()
            < 1e-9
    );
}

#[test]
fn device_outside_its_hooks_is_reported_inactive() {
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "duct_firing", "id": "db_idle", "hooks": ["pre_ST"], "fuel_heat_MW": 40.0}
        ]}),
    );
    let out = run(raw);
    let baseline = run(nominal_summer());
    assert_eq!(out.trace.inactive_devices, vec!["db_idle".to_string()]);
    assert!(has_warning(&out, WarningCode::DeviceInactive));
    assert!(out.trace.device_calls.is_empty());
    assert_eq!(out.result.summary, baseline.result.summary);
}

#[test]
fn warnings_are_unique_by_code() {
    let raw = with(
        nominal_summer(),
        json!({"devices": [
            {"type": "duct_firing", "id": "a", "hooks": ["pre_ST"], "fuel_heat_MW": 1.0},
            {"type": "duct_firing", "id": "b", "hooks": ["pre_GT"], "fuel_heat_MW": 1.0}
        ]}),
    );
    let out = run(raw);
    let inactive = out
        .result
        .meta
        .warnings
        .iter()
        .filter(|w| w.code == WarningCode::DeviceInactive)
        .count();
    assert_eq!(inactive, 1);
    let raised = out
        .trace
        .warnings_raised
        .iter()
        .filter(|w| w.code == WarningCode::DeviceInactive)
        .count();
    assert_eq!(raised, 2);
}
