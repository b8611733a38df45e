//! Condenser heat rejection and cooling-water balance.

use crate::error::SolverResult;
use crate::steam_turbine::TurbineExhaust;
use crate::warnings::{Warning, WarningCode};
use hb_case::CondenserConfig;
use hb_core::units::constants::CP_WATER;
use hb_props::PropertyService;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CondenserResult {
    #[serde(rename = "heat_rejected_MW")]
    pub heat_rejected_mw: f64,
    pub steam_flow_kg_s: f64,
    #[serde(rename = "condensing_temp_C")]
    pub condensing_temp_c: f64,
    #[serde(rename = "condensate_enthalpy_kJ_per_kg")]
    pub condensate_enthalpy: f64,
    #[serde(rename = "cw_inlet_C")]
    pub cw_inlet_c: f64,
    #[serde(rename = "cw_outlet_C")]
    pub cw_outlet_c: f64,
    pub cw_flow_kg_s: f64,
    /// Condensing temperature minus cooling-water outlet [K].
    #[serde(rename = "ttd_K")]
    pub ttd_k: f64,
    #[serde(rename = "lmtd_K", default, skip_serializing_if = "Option::is_none")]
    pub lmtd_k: Option<f64>,
    pub warnings: Vec<Warning>,
}

fn log_mean(delta1: f64, delta2: f64) -> Option<f64> {
    if delta1 <= 0.0 || delta2 <= 0.0 {
        return None;
    }
    if (delta1 - delta2).abs() < 1e-9 {
        return Some(delta1);
    }
    Some((delta1 - delta2) / (delta1 / delta2).ln())
}

/// Condense the turbine exhaust at the configured vacuum.
///
/// With `cw_flow_kg_s` set the outlet temperature follows from the heat
/// balance; otherwise the configured temperature rise fixes the outlet and
/// the flow is derived.
pub fn solve_condenser(
    cfg: &CondenserConfig,
    exhaust: &TurbineExhaust,
    props: &dyn PropertyService,
) -> SolverResult<CondenserResult> {
    let sat = props.saturation(exhaust.pressure_bar)?;
    let heat_rejected_mw = exhaust.flow_kg_s * (exhaust.enthalpy_kj_per_kg - sat.h_liquid) / 1000.0;
    let heat_kw = heat_rejected_mw * 1000.0;

    let (cw_flow_kg_s, cw_outlet_c) = match cfg.cw_flow_kg_s {
        Some(flow) => (flow, cfg.cw_inlet_c + heat_kw / (flow * CP_WATER)),
        None => (
            heat_kw / (CP_WATER * cfg.cw_temp_rise_k),
            cfg.cw_inlet_c + cfg.cw_temp_rise_k,
        ),
    };

    let mut warnings = Vec::new();
    if cw_outlet_c >= sat.t_c {
        warnings.push(
            Warning::new(WarningCode::CondenserCwOutletHigh, "condenser").with_detail(format!(
                "cooling water leaves at {:.1} °C, steam condenses at {:.1} °C",
                cw_outlet_c, sat.t_c
            )),
        );
    }
    info!(heat_rejected_mw, cw_outlet_c, "condenser solved");

    Ok(CondenserResult {
        heat_rejected_mw,
        steam_flow_kg_s: exhaust.flow_kg_s,
        condensing_temp_c: sat.t_c,
        condensate_enthalpy: sat.h_liquid,
        cw_inlet_c: cfg.cw_inlet_c,
        cw_outlet_c,
        cw_flow_kg_s,
        ttd_k: sat.t_c - cw_outlet_c,
        lmtd_k: log_mean(sat.t_c - cfg.cw_inlet_c, sat.t_c - cw_outlet_c),
        warnings,
    })
}
