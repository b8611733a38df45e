//! Steam turbine expansion, HP -> IP -> LP.
//!
//! Each section exhausts at the next level's pressure, where the level's own
//! steam is mixed in adiabatically before the next section. The LP section
//! exhausts to the condenser.

use crate::error::SolverResult;
use crate::hrsg::{HrsgResult, SteamStreamState};
use hb_case::{SteamLevel, SteamTurbineConfig};
use hb_props::PropertyService;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StSectionResult {
    pub section: SteamLevel,
    pub flow_kg_s: f64,
    pub inlet_pressure_bar: f64,
    #[serde(rename = "inlet_temp_C")]
    pub inlet_temp_c: f64,
    pub exit_pressure_bar: f64,
    #[serde(rename = "exit_temp_C")]
    pub exit_temp_c: f64,
    #[serde(rename = "h_in_kJ_per_kg")]
    pub h_in: f64,
    #[serde(rename = "h_exit_kJ_per_kg")]
    pub h_exit: f64,
    #[serde(rename = "isentropic_drop_kJ_per_kg")]
    pub isentropic_drop: f64,
    #[serde(rename = "actual_drop_kJ_per_kg")]
    pub actual_drop: f64,
    /// Electrical output after mechanical/generator losses.
    #[serde(rename = "power_MW")]
    pub power_mw: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_quality: Option<f64>,
}

/// Steam leaving the LP section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TurbineExhaust {
    pub flow_kg_s: f64,
    pub pressure_bar: f64,
    #[serde(rename = "enthalpy_kJ_per_kg")]
    pub enthalpy_kj_per_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StResult {
    pub sections: Vec<StSectionResult>,
    /// Shaft power before mechanical/generator losses [MW].
    #[serde(rename = "gross_power_MW")]
    pub gross_power_mw: f64,
    #[serde(rename = "power_MW")]
    pub power_mw: f64,
    #[serde(rename = "mech_elec_loss_MW")]
    pub mech_elec_loss_mw: f64,
    pub exhaust: TurbineExhaust,
}

impl StResult {
    pub fn section(&self, level: SteamLevel) -> &StSectionResult {
        &self.sections[level.index()]
    }
}

/// Expand the HRSG steam through the three sections.
pub fn solve_steam_turbine(
    cfg: &SteamTurbineConfig,
    hrsg: &HrsgResult,
    condenser_bar: f64,
    props: &dyn PropertyService,
) -> SolverResult<StResult> {
    let mut sections = Vec::with_capacity(3);
    // Steam carried from the previous section's exhaust.
    let mut carried: Option<(f64, f64)> = None;

    for level in SteamLevel::ALL {
        let admitted = hrsg.stream(level);
        let (flow, h_in) = mix(carried, admitted);
        let exit_bar = match level {
            SteamLevel::Hp => hrsg.stream(SteamLevel::Ip).pressure_bar,
            SteamLevel::Ip => hrsg.stream(SteamLevel::Lp).pressure_bar,
            SteamLevel::Lp => condenser_bar,
        };
        let section = expand(
            level,
            flow,
            admitted.pressure_bar,
            h_in,
            exit_bar,
            cfg.isentropic_eff(level),
            cfg.mech_elec_eff,
            props,
        )?;
        carried = Some((section.flow_kg_s, section.h_exit));
        sections.push(section);
    }

    let gross_power_mw: f64 = sections
        .iter()
        .map(|s| s.flow_kg_s * s.actual_drop / 1000.0)
        .sum();
    let power_mw: f64 = sections.iter().map(|s| s.power_mw).sum();
    let last = &sections[SteamLevel::Lp.index()];
    let exhaust = TurbineExhaust {
        flow_kg_s: last.flow_kg_s,
        pressure_bar: last.exit_pressure_bar,
        enthalpy_kj_per_kg: last.h_exit,
        quality: last.exit_quality,
    };
    info!(gross_mw = gross_power_mw, power_mw, exhaust_quality = ?exhaust.quality, "steam turbine solved");

    Ok(StResult {
        sections,
        gross_power_mw,
        power_mw,
        mech_elec_loss_mw: gross_power_mw - power_mw,
        exhaust,
    })
}

/// Adiabatic mixing of the carried exhaust with a level's steam.
fn mix(carried: Option<(f64, f64)>, admitted: &SteamStreamState) -> (f64, f64) {
    match carried {
        Some((flow, h)) if flow > 0.0 => {
            let total = flow + admitted.flow_kg_s;
            let h_mix = (flow * h + admitted.flow_kg_s * admitted.enthalpy_kj_per_kg) / total;
            (total, h_mix)
        }
        _ => (admitted.flow_kg_s, admitted.enthalpy_kj_per_kg),
    }
}

#[allow(clippy::too_many_arguments)]
fn expand(
    section: SteamLevel,
    flow_kg_s: f64,
    inlet_bar: f64,
    h_in: f64,
    exit_bar: f64,
    isentropic_eff: f64,
    mech_elec_eff: f64,
    props: &dyn PropertyService,
) -> SolverResult<StSectionResult> {
    let inlet = props.state_ph(inlet_bar, h_in)?;
    let h_is = props.enthalpy_ps(exit_bar, inlet.s)?;
    let isentropic_drop = h_in - h_is;
    let actual_drop = isentropic_eff * isentropic_drop;
    let h_exit = h_in - actual_drop;
    let exit = props.state_ph(exit_bar, h_exit)?;

    Ok(StSectionResult {
        section,
        flow_kg_s,
        inlet_pressure_bar: inlet_bar,
        inlet_temp_c: inlet.t_c,
        exit_pressure_bar: exit_bar,
        exit_temp_c: exit.t_c,
        h_in,
        h_exit,
        isentropic_drop,
        actual_drop,
        power_mw: flow_kg_s * actual_drop * mech_elec_eff / 1000.0,
        exit_quality: exit.quality,
    })
}
