//! Gas turbine performance at site conditions.

use crate::ambient::CorrectionFactors;
use crate::error::{SolverError, SolverResult};
use hb_case::GasTurbineConfig;
use hb_props::humid_air::moist_cp;
use serde::{Deserialize, Serialize};

/// Exhaust gas leaving the gas turbine (or entering the HRSG).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExhaustGasState {
    pub flow_kg_s: f64,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "cp_kJ_per_kgK")]
    pub cp_kj_per_kgk: f64,
}

impl ExhaustGasState {
    /// Heat capacity rate [kW/K].
    pub fn capacity_rate(&self) -> f64 {
        self.flow_kg_s * self.cp_kj_per_kgk
    }

    /// Sensible energy relative to `reference_c` [MW].
    pub fn energy_above_mw(&self, reference_c: f64) -> f64 {
        self.capacity_rate() * (self.temp_c - reference_c) / 1000.0
    }

    /// The same gas with its flow scaled by `fraction`.
    pub fn split(&self, fraction: f64) -> Self {
        Self {
            flow_kg_s: self.flow_kg_s * fraction,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GtResult {
    #[serde(rename = "power_MW")]
    pub power_mw: f64,
    #[serde(rename = "heat_rate_kJ_per_kWh")]
    pub heat_rate_kj_per_kwh: f64,
    #[serde(rename = "fuel_heat_input_MW")]
    pub fuel_heat_input_mw: f64,
    pub fuel_flow_kg_s: f64,
    #[serde(rename = "fuel_LHV_kJ_per_kg")]
    pub fuel_lhv_kj_per_kg: f64,
    pub exhaust: ExhaustGasState,
    pub corrections: CorrectionFactors,
}

fn required(value: Option<f64>, field: &str) -> SolverResult<f64> {
    value.ok_or_else(|| SolverError::missing(field))
}

/// Scale ISO ratings by `corrections`. Closed form; the only failure is a
/// missing rating.
pub fn solve_gas_turbine(
    cfg: &GasTurbineConfig,
    corrections: &CorrectionFactors,
) -> SolverResult<GtResult> {
    let iso_power = required(cfg.iso_power_mw, "gas_turbine.ISO_power_MW")?;
    let iso_heat_rate = required(cfg.iso_heat_rate_kj_per_kwh, "gas_turbine.ISO_heat_rate_kJ_per_kWh")?;
    let iso_exhaust_temp = required(cfg.iso_exhaust_temp_c, "gas_turbine.ISO_exhaust_temp_C")?;
    let iso_exhaust_flow = required(cfg.iso_exhaust_flow_kg_s, "gas_turbine.ISO_exhaust_flow_kg_s")?;
    let lhv = required(cfg.fuel_lhv_kj_per_kg, "gas_turbine.fuel_LHV_kJ_per_kg")?;

    let power_mw = iso_power * corrections.power_multiplier;
    let heat_rate = iso_heat_rate * corrections.heat_rate_multiplier;
    // kJ/kWh × MW = MJ/h
    let fuel_heat_input_mw = heat_rate * power_mw / 3600.0;
    let fuel_flow_kg_s = fuel_heat_input_mw * 1000.0 / lhv;

    let exhaust = ExhaustGasState {
        flow_kg_s: iso_exhaust_flow * corrections.flow_multiplier,
        temp_c: iso_exhaust_temp + corrections.exhaust_temp_delta_k,
        cp_kj_per_kgk: moist_cp(cfg.exhaust_cp_kj_per_kgk, corrections.humidity_ratio),
    };

    Ok(GtResult {
        power_mw,
        heat_rate_kj_per_kwh: heat_rate,
        fuel_heat_input_mw,
        fuel_flow_kg_s,
        fuel_lhv_kj_per_kg: lhv,
        exhaust,
        corrections: *corrections,
    })
}
