//! Ambient correction of gas turbine ratings.

use hb_case::{AmbientConfig, CorrectionCoefficients, CorrectionMode, VendorCurve};
use hb_core::interp_clamped;
use hb_core::units::bar_to_kpa;
use hb_props::humid_air::humidity_ratio_from_rh;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Air state at the compressor inlet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AmbientState {
    #[serde(rename = "Ta_C")]
    pub ta_c: f64,
    #[serde(rename = "RH_pct")]
    pub rh_pct: f64,
    #[serde(rename = "P_bar")]
    pub p_bar: f64,
}

impl From<&AmbientConfig> for AmbientState {
    fn from(cfg: &AmbientConfig) -> Self {
        Self {
            ta_c: cfg.ta_c,
            rh_pct: cfg.rh_pct,
            p_bar: cfg.p_bar,
        }
    }
}

/// Multipliers and deltas applied to the ISO ratings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CorrectionFactors {
    pub power_multiplier: f64,
    pub flow_multiplier: f64,
    #[serde(rename = "exhaust_temp_delta_K")]
    pub exhaust_temp_delta_k: f64,
    pub heat_rate_multiplier: f64,
    /// kg vapour / kg dry air at the compressor inlet
    pub humidity_ratio: f64,
}

/// Correction factors for `ambient`.
///
/// In vendor-blend mode a curve that cannot be found contributes nothing and
/// the linear model is used; validation rejects such cases before they get
/// here.
pub fn correct(
    ambient: &AmbientState,
    coeff: &CorrectionCoefficients,
    curves: &BTreeMap<String, VendorCurve>,
) -> CorrectionFactors {
    let dt = ambient.ta_c - coeff.reference_temp_c;
    let linear = [
        1.0 + coeff.d_power_pct_per_k * dt / 100.0,
        1.0 + coeff.d_flow_pct_per_k * dt / 100.0,
        coeff.d_exh_t_k_per_k * dt,
        1.0 + coeff.d_heat_rate_pct_per_k * dt / 100.0,
    ];

    let vendor = match coeff.mode {
        CorrectionMode::Linear => None,
        CorrectionMode::VendorBlend => coeff
            .vendor_curve
            .as_ref()
            .and_then(|name| curves.get(name))
            .and_then(|curve| vendor_factors(curve, ambient.ta_c)),
    };
    let [power, flow, exhaust, heat_rate] = match vendor {
        Some(vendor) => {
            let w = coeff.blend_weight.clamp(0.0, 1.0);
            std::array::from_fn(|i| (1.0 - w) * linear[i] + w * vendor[i])
        }
        None => linear,
    };

    let pressure_ratio = ambient.p_bar / coeff.reference_pressure_bar;
    let humidity = humidity_ratio_from_rh(ambient.ta_c, ambient.rh_pct, bar_to_kpa(ambient.p_bar));

    CorrectionFactors {
        power_multiplier: power * pressure_ratio,
        flow_multiplier: flow * pressure_ratio,
        exhaust_temp_delta_k: exhaust,
        heat_rate_multiplier: heat_rate,
        humidity_ratio: humidity.humidity_ratio,
    }
}

/// Vendor-blend mode names a curve that is not in the case.
pub fn vendor_curve_missing(
    coeff: &CorrectionCoefficients,
    curves: &BTreeMap<String, VendorCurve>,
) -> bool {
    coeff.mode == CorrectionMode::VendorBlend
        && coeff
            .vendor_curve
            .as_ref()
            .is_none_or(|name| curves.get(name).is_none_or(|c| c.points.is_empty()))
}

fn vendor_factors(curve: &VendorCurve, t_c: f64) -> Option<[f64; 4]> {
    let column = |pick: fn(&hb_case::VendorCurvePoint) -> f64| {
        let table: Vec<(f64, f64)> = curve.points.iter().map(|p| (p.t_c, pick(p))).collect();
        interp_clamped(&table, t_c)
    };
    Some([
        column(|p| p.power_factor)?,
        column(|p| p.flow_factor)?,
        column(|p| p.exhaust_delta_c)?,
        column(|p| p.heat_rate_factor)?,
    ])
}
