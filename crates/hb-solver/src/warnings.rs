//! Stable warning codes and the messages attached to them.
//!
//! Codes are part of the output format: console, result files and any UI
//! show the same strings, so variants may be added but never renamed.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    GtVendorCurveMissing,
    GtEnergyInconsistent,
    HrsgPinchViolation,
    HrsgApproachViolation,
    HrsgStackTempLow,
    HrsgStackTempHigh,
    HrsgSteamTempLimited,
    HrsgNotConverged,
    AttempLimitReached,
    AttempNotRequired,
    DuctFiringLimitReached,
    DeviceInactive,
    CondenserCwOutletHigh,
    #[serde(rename = "CLOSURE_GT_0P5")]
    ClosureGt0p5,
    ClosureNearLimit,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCode::GtVendorCurveMissing => "GT_VENDOR_CURVE_MISSING",
            WarningCode::GtEnergyInconsistent => "GT_ENERGY_INCONSISTENT",
            WarningCode::HrsgPinchViolation => "HRSG_PINCH_VIOLATION",
            WarningCode::HrsgApproachViolation => "HRSG_APPROACH_VIOLATION",
            WarningCode::HrsgStackTempLow => "HRSG_STACK_TEMP_LOW",
            WarningCode::HrsgStackTempHigh => "HRSG_STACK_TEMP_HIGH",
            WarningCode::HrsgSteamTempLimited => "HRSG_STEAM_TEMP_LIMITED",
            WarningCode::HrsgNotConverged => "HRSG_NOT_CONVERGED",
            WarningCode::AttempLimitReached => "ATTEMP_LIMIT_REACHED",
            WarningCode::AttempNotRequired => "ATTEMP_NOT_REQUIRED",
            WarningCode::DuctFiringLimitReached => "DUCT_FIRING_LIMIT_REACHED",
            WarningCode::DeviceInactive => "DEVICE_INACTIVE",
            WarningCode::CondenserCwOutletHigh => "CONDENSER_CW_OUTLET_HIGH",
            WarningCode::ClosureGt0p5 => "CLOSURE_GT_0P5",
            WarningCode::ClosureNearLimit => "CLOSURE_NEAR_LIMIT",
        }
    }

    /// Catalogue message shown next to the code.
    pub fn message(self) -> &'static str {
        match self {
            WarningCode::GtVendorCurveMissing => {
                "Vendor correction curve not found; linear correction used"
            }
            WarningCode::GtEnergyInconsistent => {
                "GT exhaust energy exceeds fuel input minus power; loss term clamped at zero"
            }
            WarningCode::HrsgPinchViolation => "Exhaust gas too cold for evaporator pinch",
            WarningCode::HrsgApproachViolation => "Economizer approach cannot be honoured",
            WarningCode::HrsgStackTempLow => "Stack temperature below configured minimum",
            WarningCode::HrsgStackTempHigh => "Stack temperature above configured maximum",
            WarningCode::HrsgSteamTempLimited => "Steam temperature limited by superheater pinch",
            WarningCode::HrsgNotConverged => "HRSG energy balance did not converge",
            WarningCode::AttempLimitReached => "Attemperator spray at its flow limit",
            WarningCode::AttempNotRequired => "Attemperator spray not required",
            WarningCode::DuctFiringLimitReached => "Duct firing capped at maximum gas temperature",
            WarningCode::DeviceInactive => "Device declared but active at no hook point",
            WarningCode::CondenserCwOutletHigh => {
                "Cooling-water outlet not below condensing temperature"
            }
            WarningCode::ClosureGt0p5 => "Plant energy closure error above 0.5 %",
            WarningCode::ClosureNearLimit => "Plant energy closure error approaching 0.5 %",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A soft failure or advisory raised by a stage or device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Stage or device id that raised it.
    pub source: String,
}

impl Warning {
    pub fn new(code: WarningCode, source: impl Into<String>) -> Self {
        Self {
            code,
            message: code.message().to_string(),
            detail: None,
            source: source.into(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        write!(f, " ({})", self.source)
    }
}

/// Keep the first warning of each code, preserving order.
pub fn dedup_by_code(warnings: impl IntoIterator<Item = Warning>) -> Vec<Warning> {
    let mut seen = std::collections::HashSet::new();
    warnings
        .into_iter()
        .filter(|w| seen.insert(w.code))
        .collect()
}
