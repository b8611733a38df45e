//! Plant totals and the energy closure check.
//!
//! All sensible gas energies are measured from site ambient temperature, and
//! duct-burner fuel enters at ambient. Under that convention the balance
//! closes exactly when every stage is internally consistent; a residual
//! points at a clamped loss term or an unconverged HRSG.

use crate::condenser::CondenserResult;
use crate::devices::DuctFiringDuty;
use crate::gas_turbine::{ExhaustGasState, GtResult};
use crate::hrsg::HrsgResult;
use crate::steam_turbine::StResult;
use crate::warnings::{Warning, WarningCode};
use serde::{Deserialize, Serialize};

/// Closure error accepted as converged [%].
pub const CLOSURE_LIMIT_PCT: f64 = 0.5;
/// Closure error above which a near-limit advisory is raised [%].
pub const CLOSURE_NEAR_LIMIT_PCT: f64 = 0.3;

const SOURCE: &str = "summary";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantSummary {
    #[serde(rename = "GT_power_MW")]
    pub gt_power_mw: f64,
    #[serde(rename = "ST_power_MW")]
    pub st_power_mw: f64,
    #[serde(rename = "AUX_load_MW")]
    pub aux_load_mw: f64,
    #[serde(rename = "NET_power_MW")]
    pub net_power_mw: f64,
    #[serde(rename = "NET_eff_LHV_pct")]
    pub net_eff_lhv_pct: f64,
    #[serde(rename = "fuel_heat_input_MW")]
    pub fuel_heat_input_mw: f64,
    #[serde(rename = "NET_heat_rate_kJ_per_kWh")]
    pub net_heat_rate_kj_per_kwh: f64,
}

/// Energy leaving the plant boundary [MW].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnergyOut {
    #[serde(rename = "net_power_MW")]
    pub net_power_mw: f64,
    #[serde(rename = "condenser_MW")]
    pub condenser_mw: f64,
    #[serde(rename = "stack_MW")]
    pub stack_mw: f64,
    #[serde(rename = "bypass_stack_MW")]
    pub bypass_stack_mw: f64,
    #[serde(rename = "aux_load_MW")]
    pub aux_load_mw: f64,
    #[serde(rename = "st_mech_elec_loss_MW")]
    pub st_mech_elec_loss_mw: f64,
    #[serde(rename = "gt_loss_MW")]
    pub gt_loss_mw: f64,
    #[serde(rename = "duct_burner_loss_MW")]
    pub duct_burner_loss_mw: f64,
}

impl EnergyOut {
    pub fn total(&self) -> f64 {
        self.net_power_mw
            + self.condenser_mw
            + self.stack_mw
            + self.bypass_stack_mw
            + self.aux_load_mw
            + self.st_mech_elec_loss_mw
            + self.gt_loss_mw
            + self.duct_burner_loss_mw
    }
}

/// The `mass_energy_balance` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantBalance {
    pub closure_error_pct: f64,
    pub converged: bool,
    pub iterations_used: usize,
    #[serde(rename = "energy_in_MW")]
    pub energy_in_mw: f64,
    #[serde(rename = "energy_out_MW")]
    pub energy_out_mw: f64,
    pub energy_out: EnergyOut,
    /// Steam leaving the HRSG plus spray; equals condensate returned.
    pub steam_flow_kg_s: f64,
    pub spray_flow_kg_s: f64,
    #[serde(rename = "stack_gas_flow_kg_s")]
    pub stack_gas_flow_kg_s: f64,
    pub warnings: Vec<Warning>,
}

/// Everything the summary reads.
#[derive(Debug, Clone, Copy)]
pub struct StageResults<'a> {
    pub ambient_c: f64,
    pub aux_load_mw: f64,
    pub gt: &'a GtResult,
    pub bypass: Option<&'a ExhaustGasState>,
    pub duct_firing: &'a DuctFiringDuty,
    pub hrsg: &'a HrsgResult,
    pub st: &'a StResult,
    pub condenser: &'a CondenserResult,
}

/// `|in − out| / in × 100`, zero when nothing goes in.
pub fn closure_error_pct(energy_in_mw: f64, energy_out_mw: f64) -> f64 {
    if energy_in_mw > 0.0 {
        (energy_in_mw - energy_out_mw).abs() / energy_in_mw * 100.0
    } else {
        0.0
    }
}

/// Advisory for a closure error: above the limit, or in the near-limit band.
pub fn closure_warning(closure_pct: f64) -> Option<Warning> {
    let code = if closure_pct > CLOSURE_LIMIT_PCT {
        WarningCode::ClosureGt0p5
    } else if closure_pct >= CLOSURE_NEAR_LIMIT_PCT {
        WarningCode::ClosureNearLimit
    } else {
        return None;
    };
    Some(Warning::new(code, SOURCE).with_detail(format!("{closure_pct:.3} %")))
}

pub fn summarize(stages: &StageResults<'_>) -> (PlantSummary, PlantBalance) {
    let gt = stages.gt;
    let hrsg = stages.hrsg;
    let ambient_c = stages.ambient_c;
    let mut warnings = Vec::new();

    let fuel_heat_input_mw = gt.fuel_heat_input_mw + stages.duct_firing.fuel_heat_mw;
    let net_power_mw = gt.power_mw + stages.st.power_mw - stages.aux_load_mw;
    let net_eff_lhv_pct = if fuel_heat_input_mw > 0.0 {
        net_power_mw / fuel_heat_input_mw * 100.0
    } else {
        0.0
    };
    let net_heat_rate_kj_per_kwh = if net_power_mw > 0.0 {
        fuel_heat_input_mw * 3600.0 / net_power_mw
    } else {
        0.0
    };

    let gt_loss_raw = gt.fuel_heat_input_mw - gt.power_mw - gt.exhaust.energy_above_mw(ambient_c);
    if gt_loss_raw < 0.0 {
        warnings.push(
            Warning::new(WarningCode::GtEnergyInconsistent, SOURCE).with_detail(format!(
                "fuel − power − exhaust = {gt_loss_raw:.2} MW"
            )),
        );
    }

    let stack_gas = ExhaustGasState {
        temp_c: hrsg.stack_temp_c,
        ..hrsg.inlet_gas
    };
    let energy_out = EnergyOut {
        net_power_mw,
        condenser_mw: stages.condenser.heat_rejected_mw,
        stack_mw: stack_gas.energy_above_mw(ambient_c),
        bypass_stack_mw: stages.bypass.map_or(0.0, |gas| gas.energy_above_mw(ambient_c)),
        aux_load_mw: stages.aux_load_mw,
        st_mech_elec_loss_mw: stages.st.mech_elec_loss_mw,
        gt_loss_mw: gt_loss_raw.max(0.0),
        duct_burner_loss_mw: stages.duct_firing.loss_mw(),
    };
    let energy_out_mw = energy_out.total();
    let closure = closure_error_pct(fuel_heat_input_mw, energy_out_mw);

    warnings.extend(closure_warning(closure));

    let spray_flow_kg_s = hrsg.levels.iter().map(|l| l.stream.spray_kg_s).sum();
    let summary = PlantSummary {
        gt_power_mw: gt.power_mw,
        st_power_mw: stages.st.power_mw,
        aux_load_mw: stages.aux_load_mw,
        net_power_mw,
        net_eff_lhv_pct,
        fuel_heat_input_mw,
        net_heat_rate_kj_per_kwh,
    };
    let balance = PlantBalance {
        closure_error_pct: closure,
        converged: hrsg.converged && closure <= CLOSURE_LIMIT_PCT,
        iterations_used: hrsg.iterations,
        energy_in_mw: fuel_heat_input_mw,
        energy_out_mw,
        energy_out,
        steam_flow_kg_s: hrsg.total_steam_kg_s(),
        spray_flow_kg_s,
        stack_gas_flow_kg_s: hrsg.inlet_gas.flow_kg_s
            + stages.bypass.map_or(0.0, |gas| gas.flow_kg_s),
        warnings,
    };
    (summary, balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_for(closure_pct: f64) -> Option<WarningCode> {
        closure_warning(closure_pct).map(|w| w.code)
    }

    #[test]
    fn small_closure_raises_nothing() {
        assert_eq!(code_for(0.0), None);
        assert_eq!(code_for(0.29), None);
    }

    #[test]
    fn near_limit_band_is_advisory() {
        assert_eq!(code_for(0.3), Some(WarningCode::ClosureNearLimit));
        assert_eq!(code_for(0.42), Some(WarningCode::ClosureNearLimit));
        assert_eq!(code_for(0.5), Some(WarningCode::ClosureNearLimit));
    }

    #[test]
    fn closure_above_limit_is_flagged() {
        let w = closure_warning(0.51).unwrap();
        assert_eq!(w.code, WarningCode::ClosureGt0p5);
        assert_eq!(w.detail.as_deref(), Some("0.510 %"));
        assert_eq!(code_for(90.0), Some(WarningCode::ClosureGt0p5));
    }
}
