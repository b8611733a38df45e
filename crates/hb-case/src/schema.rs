//! Case file schema.
//!
//! Field names follow the plant data sheets (`Ta_C`, `ISO_power_MW`, ...)
//! so that case files stay readable by the engineers who write them.

use hb_core::units::constants::{ISO_TEMP_C, P_ATM_BAR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseConfiguration {
    #[serde(default)]
    pub meta: CaseMeta,
    pub ambient: AmbientConfig,
    pub gas_turbine: GasTurbineConfig,
    pub hrsg: HrsgConfig,
    pub steam_turbine: SteamTurbineConfig,
    pub condenser: CondenserConfig,
    pub bop: BopConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub constraints: ConstraintModes,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vendor_curves: BTreeMap<String, VendorCurve>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_case: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AmbientConfig {
    #[serde(rename = "Ta_C")]
    pub ta_c: f64,
    #[serde(rename = "RH_pct")]
    pub rh_pct: f64,
    #[serde(rename = "P_bar")]
    pub p_bar: f64,
}

/// ISO ratings are optional in the schema so that a missing rating is
/// reported as a configuration error naming the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasTurbineConfig {
    #[serde(rename = "ISO_power_MW", default)]
    pub iso_power_mw: Option<f64>,
    #[serde(rename = "ISO_heat_rate_kJ_per_kWh", default)]
    pub iso_heat_rate_kj_per_kwh: Option<f64>,
    #[serde(rename = "ISO_exhaust_temp_C", default)]
    pub iso_exhaust_temp_c: Option<f64>,
    #[serde(rename = "ISO_exhaust_flow_kg_s", default)]
    pub iso_exhaust_flow_kg_s: Option<f64>,
    #[serde(rename = "fuel_LHV_kJ_per_kg", default)]
    pub fuel_lhv_kj_per_kg: Option<f64>,
    /// Dry exhaust specific heat [kJ/(kg·K)].
    #[serde(rename = "exhaust_cp_kJ_per_kgK", default = "default_exhaust_cp")]
    pub exhaust_cp_kj_per_kgk: f64,
    #[serde(default)]
    pub corr_coeff: CorrectionCoefficients,
}

fn default_exhaust_cp() -> f64 {
    1.15
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrectionCoefficients {
    #[serde(rename = "reference_temp_C", default = "default_reference_temp")]
    pub reference_temp_c: f64,
    #[serde(rename = "reference_pressure_bar", default = "default_reference_pressure")]
    pub reference_pressure_bar: f64,
    #[serde(rename = "dPower_pct_per_K", default)]
    pub d_power_pct_per_k: f64,
    #[serde(rename = "dFlow_pct_per_K", default)]
    pub d_flow_pct_per_k: f64,
    #[serde(rename = "dExhT_K_per_K", default)]
    pub d_exh_t_k_per_k: f64,
    #[serde(rename = "dHeatRate_pct_per_K", default)]
    pub d_heat_rate_pct_per_k: f64,
    #[serde(default)]
    pub mode: CorrectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_curve: Option<String>,
    /// 0 = pure linear, 1 = pure vendor curve.
    #[serde(default)]
    pub blend_weight: f64,
}

impl Default for CorrectionCoefficients {
    fn default() -> Self {
        Self {
            reference_temp_c: default_reference_temp(),
            reference_pressure_bar: default_reference_pressure(),
            d_power_pct_per_k: 0.0,
            d_flow_pct_per_k: 0.0,
            d_exh_t_k_per_k: 0.0,
            d_heat_rate_pct_per_k: 0.0,
            mode: CorrectionMode::Linear,
            vendor_curve: None,
            blend_weight: 0.0,
        }
    }
}

fn default_reference_temp() -> f64 {
    ISO_TEMP_C
}

fn default_reference_pressure() -> f64 {
    P_ATM_BAR
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMode {
    #[default]
    Linear,
    VendorBlend,
}

/// Vendor correction table, sorted by temperature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorCurve {
    pub points: Vec<VendorCurvePoint>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VendorCurvePoint {
    #[serde(rename = "T_C")]
    pub t_c: f64,
    pub power_factor: f64,
    pub flow_factor: f64,
    #[serde(rename = "exhaust_delta_C", default)]
    pub exhaust_delta_c: f64,
    #[serde(default = "unity")]
    pub heat_rate_factor: f64,
}

fn unity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HrsgConfig {
    pub hp: PressureLevelConfig,
    pub ip: PressureLevelConfig,
    pub lp: PressureLevelConfig,
    #[serde(rename = "stack_temp_min_C")]
    pub stack_temp_min_c: f64,
    #[serde(rename = "stack_temp_max_C", default, skip_serializing_if = "Option::is_none")]
    pub stack_temp_max_c: Option<f64>,
    #[serde(rename = "feedwater_temp_C", default = "default_feedwater_temp")]
    pub feedwater_temp_c: f64,
    /// Fraction of exhaust routed around the HRSG.
    #[serde(default)]
    pub bypass_fraction: f64,
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    #[serde(default = "default_tolerance_pct")]
    pub tolerance_pct: f64,
}

fn default_feedwater_temp() -> f64 {
    95.0
}

fn default_max_passes() -> usize {
    50
}

fn default_tolerance_pct() -> f64 {
    0.5
}

impl HrsgConfig {
    pub fn level(&self, level: SteamLevel) -> &PressureLevelConfig {
        match level {
            SteamLevel::Hp => &self.hp,
            SteamLevel::Ip => &self.ip,
            SteamLevel::Lp => &self.lp,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PressureLevelConfig {
    pub pressure_bar: f64,
    #[serde(rename = "steam_temp_C")]
    pub steam_temp_c: f64,
    #[serde(rename = "pinch_K")]
    pub pinch_k: f64,
    #[serde(rename = "approach_K")]
    pub approach_k: f64,
    /// Initial guess for the level's steam flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_flow_kg_s: Option<f64>,
    /// Upper bound on delivered steam temperature.
    #[serde(rename = "steam_temp_max_C", default, skip_serializing_if = "Option::is_none")]
    pub steam_temp_max_c: Option<f64>,
}

/// HRSG pressure levels in allocation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SteamLevel {
    Hp,
    Ip,
    Lp,
}

impl SteamLevel {
    pub const ALL: [SteamLevel; 3] = [SteamLevel::Hp, SteamLevel::Ip, SteamLevel::Lp];

    pub fn index(self) -> usize {
        match self {
            SteamLevel::Hp => 0,
            SteamLevel::Ip => 1,
            SteamLevel::Lp => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SteamLevel::Hp => "HP",
            SteamLevel::Ip => "IP",
            SteamLevel::Lp => "LP",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SteamTurbineConfig {
    pub isentropic_eff_hp: f64,
    pub isentropic_eff_ip: f64,
    pub isentropic_eff_lp: f64,
    pub mech_elec_eff: f64,
}

impl SteamTurbineConfig {
    pub fn isentropic_eff(&self, level: SteamLevel) -> f64 {
        match level {
            SteamLevel::Hp => self.isentropic_eff_hp,
            SteamLevel::Ip => self.isentropic_eff_ip,
            SteamLevel::Lp => self.isentropic_eff_lp,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CondenserConfig {
    #[serde(rename = "vacuum_kPa_abs")]
    pub vacuum_kpa_abs: f64,
    #[serde(rename = "cw_inlet_C")]
    pub cw_inlet_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cw_flow_kg_s: Option<f64>,
    #[serde(rename = "cw_temp_rise_K", default = "default_cw_rise")]
    pub cw_temp_rise_k: f64,
}

fn default_cw_rise() -> f64 {
    10.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BopConfig {
    #[serde(rename = "aux_load_MW")]
    pub aux_load_mw: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintMode {
    #[default]
    Enforce,
    Relax,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstraintModes {
    #[serde(default)]
    pub pinch_mode: ConstraintMode,
    #[serde(default)]
    pub approach_mode: ConstraintMode,
    #[serde(default)]
    pub stack_mode: ConstraintMode,
}

/// Lifecycle points at which devices may act.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HookPoint {
    #[serde(rename = "pre_GT")]
    PreGt,
    #[serde(rename = "pre_HRSG")]
    PreHrsg,
    #[serde(rename = "post_HRSG")]
    PostHrsg,
    #[serde(rename = "pre_ST")]
    PreSt,
    #[serde(rename = "pre_Condenser")]
    PreCondenser,
}

impl HookPoint {
    pub const ALL: [HookPoint; 5] = [
        HookPoint::PreGt,
        HookPoint::PreHrsg,
        HookPoint::PostHrsg,
        HookPoint::PreSt,
        HookPoint::PreCondenser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HookPoint::PreGt => "pre_GT",
            HookPoint::PreHrsg => "pre_HRSG",
            HookPoint::PostHrsg => "post_HRSG",
            HookPoint::PreSt => "pre_ST",
            HookPoint::PreCondenser => "pre_Condenser",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceConfig {
    Attemperator {
        id: String,
        /// Restricts the device to a subset of its hook points.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hooks: Option<Vec<HookPoint>>,
        level: SteamLevel,
        /// Defaults to the level's `steam_temp_C`.
        #[serde(rename = "target_temp_C", default, skip_serializing_if = "Option::is_none")]
        target_temp_c: Option<f64>,
        limits: AttemperatorLimits,
    },
    DuctFiring {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hooks: Option<Vec<HookPoint>>,
        #[serde(rename = "fuel_heat_MW")]
        fuel_heat_mw: f64,
        #[serde(default = "default_burner_efficiency")]
        efficiency: f64,
        #[serde(rename = "max_gas_temp_C", default, skip_serializing_if = "Option::is_none")]
        max_gas_temp_c: Option<f64>,
        /// Defaults to the gas turbine fuel.
        #[serde(rename = "fuel_LHV_kJ_per_kg", default, skip_serializing_if = "Option::is_none")]
        fuel_lhv_kj_per_kg: Option<f64>,
    },
    GtInletCool {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hooks: Option<Vec<HookPoint>>,
        method: InletCoolingMethod,
    },
}

fn default_burner_efficiency() -> f64 {
    0.98
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AttemperatorLimits {
    pub m_dot_max_kg_s: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InletCoolingMethod {
    /// Media/fogging: approaches wet bulb by `effectiveness`.
    Evaporative { effectiveness: f64 },
    /// Mechanical chiller: fixed temperature drop down to a floor.
    Chiller {
        #[serde(rename = "delta_T_K")]
        delta_t_k: f64,
        #[serde(rename = "min_inlet_temp_C", default = "default_chiller_floor")]
        min_inlet_temp_c: f64,
    },
}

fn default_chiller_floor() -> f64 {
    7.0
}

impl DeviceConfig {
    pub fn id(&self) -> &str {
        match self {
            DeviceConfig::Attemperator { id, .. }
            | DeviceConfig::DuctFiring { id, .. }
            | DeviceConfig::GtInletCool { id, .. } => id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DeviceConfig::Attemperator { .. } => "attemperator",
            DeviceConfig::DuctFiring { .. } => "duct_firing",
            DeviceConfig::GtInletCool { .. } => "gt_inlet_cool",
        }
    }

    /// Hook points the device kind can act on.
    pub fn supported_hooks(&self) -> &'static [HookPoint] {
        match self {
            DeviceConfig::Attemperator { .. } => &[HookPoint::PreHrsg, HookPoint::PostHrsg],
            DeviceConfig::DuctFiring { .. } => &[HookPoint::PreHrsg],
            DeviceConfig::GtInletCool { .. } => &[HookPoint::PreGt],
        }
    }

    /// Hook points this device participates in: the supported set,
    /// narrowed by the `hooks` list when one is declared.
    ///
    /// An attemperator only frees its superheater at `pre_HRSG` so the
    /// `post_HRSG` spray can trim it; without `post_HRSG` it is inactive.
    pub fn active_hooks(&self) -> Vec<HookPoint> {
        let declared = match self {
            DeviceConfig::Attemperator { hooks, .. }
            | DeviceConfig::DuctFiring { hooks, .. }
            | DeviceConfig::GtInletCool { hooks, .. } => hooks.as_ref(),
        };
        let active: Vec<HookPoint> = self
            .supported_hooks()
            .iter()
            .copied()
            .filter(|hook| declared.is_none_or(|list| list.contains(hook)))
            .collect();
        match self {
            DeviceConfig::Attemperator { .. } if !active.contains(&HookPoint::PostHrsg) => {
                Vec::new()
            }
            _ => active,
        }
    }
}
