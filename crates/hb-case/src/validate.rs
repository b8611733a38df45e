//! Case validation.
//!
//! Everything that can be checked without a property service is checked
//! here, so the solver only ever sees a structurally sound case.

use crate::schema::{
    CaseConfiguration, CorrectionMode, DeviceConfig, InletCoolingMethod, PressureLevelConfig,
    SteamLevel,
};
use hb_core::units::kpa_to_bar;
use std::collections::HashSet;

/// Highest drum pressure accepted [bar].
pub const MAX_LEVEL_PRESSURE_BAR: f64 = 160.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },
}

fn invalid(field: impl Into<String>, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be non-negative"))
    }
}

fn in_range(field: &str, value: f64, lo: f64, hi: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(invalid(field, value, &format!("must lie in [{lo}, {hi}]")))
    }
}

fn efficiency(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must lie in (0, 1]"))
    }
}

fn required(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })?;
    positive(field, value)?;
    Ok(value)
}

pub fn validate_case(case: &CaseConfiguration) -> Result<(), ValidationError> {
    validate_ambient(case)?;
    validate_gas_turbine(case)?;
    validate_hrsg(case)?;
    validate_steam_cycle(case)?;
    validate_devices(case)?;
    Ok(())
}

fn validate_ambient(case: &CaseConfiguration) -> Result<(), ValidationError> {
    let ambient = &case.ambient;
    in_range("ambient.Ta_C", ambient.ta_c, -50.0, 60.0)?;
    in_range("ambient.RH_pct", ambient.rh_pct, 0.0, 100.0)?;
    in_range("ambient.P_bar", ambient.p_bar, 0.5, 1.2)?;
    Ok(())
}

fn validate_gas_turbine(case: &CaseConfiguration) -> Result<(), ValidationError> {
    let gt = &case.gas_turbine;
    required("gas_turbine.ISO_power_MW", gt.iso_power_mw)?;
    required("gas_turbine.ISO_heat_rate_kJ_per_kWh", gt.iso_heat_rate_kj_per_kwh)?;
    required("gas_turbine.ISO_exhaust_temp_C", gt.iso_exhaust_temp_c)?;
    required("gas_turbine.ISO_exhaust_flow_kg_s", gt.iso_exhaust_flow_kg_s)?;
    required("gas_turbine.fuel_LHV_kJ_per_kg", gt.fuel_lhv_kj_per_kg)?;
    positive("gas_turbine.exhaust_cp_kJ_per_kgK", gt.exhaust_cp_kj_per_kgk)?;

    let coeff = &gt.corr_coeff;
    positive(
        "gas_turbine.corr_coeff.reference_pressure_bar",
        coeff.reference_pressure_bar,
    )?;
    in_range(
        "gas_turbine.corr_coeff.blend_weight",
        coeff.blend_weight,
        0.0,
        1.0,
    )?;

    if coeff.mode == CorrectionMode::VendorBlend {
        let name = coeff
            .vendor_curve
            .as_ref()
            .ok_or_else(|| ValidationError::MissingField {
                field: "gas_turbine.corr_coeff.vendor_curve".to_string(),
            })?;
        let curve = case
            .vendor_curves
            .get(name)
            .ok_or_else(|| ValidationError::MissingReference {
                id: name.clone(),
                context: "vendor_curves".to_string(),
            })?;
        if curve.points.is_empty() {
            return Err(ValidationError::MissingField {
                field: format!("vendor_curves.{name}.points"),
            });
        }
        for (i, point) in curve.points.iter().enumerate() {
            positive(&format!("vendor_curves.{name}.points[{i}].power_factor"), point.power_factor)?;
            positive(&format!("vendor_curves.{name}.points[{i}].flow_factor"), point.flow_factor)?;
            positive(
                &format!("vendor_curves.{name}.points[{i}].heat_rate_factor"),
                point.heat_rate_factor,
            )?;
        }
        if curve.points.windows(2).any(|w| w[1].t_c <= w[0].t_c) {
            return Err(ValidationError::InvalidValue {
                field: format!("vendor_curves.{name}.points"),
                value: "T_C".to_string(),
                reason: "temperatures must be strictly increasing".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_level(level: SteamLevel, cfg: &PressureLevelConfig) -> Result<(), ValidationError> {
    let prefix = format!("hrsg.{}", level.label().to_ascii_lowercase());
    in_range(
        &format!("{prefix}.pressure_bar"),
        cfg.pressure_bar,
        0.1,
        MAX_LEVEL_PRESSURE_BAR,
    )?;
    positive(&format!("{prefix}.steam_temp_C"), cfg.steam_temp_c)?;
    positive(&format!("{prefix}.pinch_K"), cfg.pinch_k)?;
    non_negative(&format!("{prefix}.approach_K"), cfg.approach_k)?;
    if let Some(flow) = cfg.design_flow_kg_s {
        non_negative(&format!("{prefix}.design_flow_kg_s"), flow)?;
    }
    if let Some(max) = cfg.steam_temp_max_c
        && cfg.steam_temp_c > max
    {
        return Err(invalid(
            format!("{prefix}.steam_temp_C"),
            cfg.steam_temp_c,
            "exceeds steam_temp_max_C",
        ));
    }
    Ok(())
}

fn validate_hrsg(case: &CaseConfiguration) -> Result<(), ValidationError> {
    let hrsg = &case.hrsg;
    for level in SteamLevel::ALL {
        validate_level(level, hrsg.level(level))?;
    }

    let vacuum_bar = kpa_to_bar(case.condenser.vacuum_kpa_abs);
    let ordered = hrsg.hp.pressure_bar > hrsg.ip.pressure_bar
        && hrsg.ip.pressure_bar > hrsg.lp.pressure_bar
        && hrsg.lp.pressure_bar > vacuum_bar;
    if !ordered {
        return Err(ValidationError::InvalidValue {
            field: "hrsg.{hp,ip,lp}.pressure_bar".to_string(),
            value: format!(
                "{}/{}/{}",
                hrsg.hp.pressure_bar, hrsg.ip.pressure_bar, hrsg.lp.pressure_bar
            ),
            reason: "pressures must satisfy HP > IP > LP > condenser".to_string(),
        });
    }

    positive("hrsg.stack_temp_min_C", hrsg.stack_temp_min_c)?;
    if let Some(max) = hrsg.stack_temp_max_c
        && max <= hrsg.stack_temp_min_c
    {
        return Err(invalid(
            "hrsg.stack_temp_max_C",
            max,
            "must exceed stack_temp_min_C",
        ));
    }
    positive("hrsg.feedwater_temp_C", hrsg.feedwater_temp_c)?;
    if !(0.0..1.0).contains(&hrsg.bypass_fraction) {
        return Err(invalid(
            "hrsg.bypass_fraction",
            hrsg.bypass_fraction,
            "must lie in [0, 1)",
        ));
    }
    if hrsg.max_passes == 0 {
        return Err(invalid("hrsg.max_passes", 0.0, "must be at least 1"));
    }
    positive("hrsg.tolerance_pct", hrsg.tolerance_pct)?;
    Ok(())
}

fn validate_steam_cycle(case: &CaseConfiguration) -> Result<(), ValidationError> {
    let st = &case.steam_turbine;
    efficiency("steam_turbine.isentropic_eff_hp", st.isentropic_eff_hp)?;
    efficiency("steam_turbine.isentropic_eff_ip", st.isentropic_eff_ip)?;
    efficiency("steam_turbine.isentropic_eff_lp", st.isentropic_eff_lp)?;
    efficiency("steam_turbine.mech_elec_eff", st.mech_elec_eff)?;

    let cond = &case.condenser;
    in_range("condenser.vacuum_kPa_abs", cond.vacuum_kpa_abs, 1.0, 50.0)?;
    in_range("condenser.cw_inlet_C", cond.cw_inlet_c, 0.0, 50.0)?;
    if let Some(flow) = cond.cw_flow_kg_s {
        positive("condenser.cw_flow_kg_s", flow)?;
    }
    positive("condenser.cw_temp_rise_K", cond.cw_temp_rise_k)?;

    non_negative("bop.aux_load_MW", case.bop.aux_load_mw)?;
    Ok(())
}

fn validate_devices(case: &CaseConfiguration) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for device in &case.devices {
        if !ids.insert(device.id()) {
            return Err(ValidationError::DuplicateId {
                id: device.id().to_string(),
                context: "devices".to_string(),
            });
        }
        let prefix = format!("devices.{}", device.id());
        match device {
            DeviceConfig::Attemperator {
                target_temp_c,
                limits,
                ..
            } => {
                non_negative(&format!("{prefix}.limits.m_dot_max_kg_s"), limits.m_dot_max_kg_s)?;
                if let Some(target) = target_temp_c {
                    positive(&format!("{prefix}.target_temp_C"), *target)?;
                }
            }
            DeviceConfig::DuctFiring {
                fuel_heat_mw,
                efficiency: eff,
                max_gas_temp_c,
                fuel_lhv_kj_per_kg,
                ..
            } => {
                non_negative(&format!("{prefix}.fuel_heat_MW"), *fuel_heat_mw)?;
                efficiency(&format!("{prefix}.efficiency"), *eff)?;
                if let Some(t) = max_gas_temp_c {
                    positive(&format!("{prefix}.max_gas_temp_C"), *t)?;
                }
                if let Some(lhv) = fuel_lhv_kj_per_kg {
                    positive(&format!("{prefix}.fuel_LHV_kJ_per_kg"), *lhv)?;
                }
            }
            DeviceConfig::GtInletCool { method, .. } => match method {
                InletCoolingMethod::Evaporative { effectiveness } => {
                    efficiency(&format!("{prefix}.method.effectiveness"), *effectiveness)?;
                }
                InletCoolingMethod::Chiller {
                    delta_t_k,
                    min_inlet_temp_c,
                } => {
                    non_negative(&format!("{prefix}.method.delta_T_K"), *delta_t_k)?;
                    in_range(
                        &format!("{prefix}.method.min_inlet_temp_C"),
                        *min_inlet_temp_c,
                        -20.0,
                        40.0,
                    )?;
                }
            },
        }
    }
    Ok(())
}
