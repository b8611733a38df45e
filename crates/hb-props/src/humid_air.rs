//! Moist-air helpers for ambient correction and inlet cooling.

use hb_core::units::constants::{CP_VAPOUR, H_FG_0C};

/// Dry-air specific heat [kJ/(kg·K)].
pub const CP_DRY_AIR: f64 = 1.006;

/// Humidity state of ambient air.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumidAirState {
    /// Relative humidity [%]
    pub relative_humidity_pct: f64,
    /// Humidity ratio [kg vapour / kg dry air]
    pub humidity_ratio: f64,
    /// Vapour partial pressure [kPa]
    pub vapor_pressure_kpa: f64,
}

/// Humidity ratio from dry bulb and relative humidity.
///
/// Tetens saturation pressure, then `W = 0.622 * Pv / (P - Pv)`.
pub fn humidity_ratio_from_rh(
    dry_bulb_c: f64,
    relative_humidity_pct: f64,
    total_pressure_kpa: f64,
) -> HumidAirState {
    let rh = (relative_humidity_pct / 100.0).clamp(0.0, 1.0);
    let pv = rh * saturation_pressure_tetens_kpa(dry_bulb_c);
    let w = 0.622 * pv / (total_pressure_kpa.max(pv + 1e-6) - pv);
    HumidAirState {
        relative_humidity_pct: rh * 100.0,
        humidity_ratio: w,
        vapor_pressure_kpa: pv,
    }
}

/// Relative humidity [%] for a given humidity ratio, capped at saturation.
pub fn relative_humidity_from_ratio(
    dry_bulb_c: f64,
    humidity_ratio: f64,
    total_pressure_kpa: f64,
) -> f64 {
    let w = humidity_ratio.max(0.0);
    let pv = w * total_pressure_kpa / (0.622 + w);
    (100.0 * pv / saturation_pressure_tetens_kpa(dry_bulb_c)).clamp(0.0, 100.0)
}

/// Tetens: Psat(kPa) = 0.61078 * exp(17.27*T / (T+237.3))
pub fn saturation_pressure_tetens_kpa(t_c: f64) -> f64 {
    0.61078 * (17.27 * t_c / (t_c + 237.3)).exp()
}

/// Wet-bulb temperature [°C] from the Stull (2011) fit.
///
/// Valid for RH 5-99 % and -20..50 °C at sea-level pressure.
pub fn wet_bulb_stull_c(dry_bulb_c: f64, relative_humidity_pct: f64) -> f64 {
    let t = dry_bulb_c;
    let rh = relative_humidity_pct.clamp(5.0, 99.0);
    let tw = t * (0.151_977 * (rh + 8.313_659).sqrt()).atan() + (t + rh).atan()
        - (rh - 1.676_331).atan()
        + 0.003_918_38 * rh.powf(1.5) * (0.023_101 * rh).atan()
        - 4.686_035;
    tw.min(t)
}

/// Water picked up per kg dry air when air is evaporatively cooled by `delta_t_k`.
pub fn evaporated_water_per_kg(delta_t_k: f64) -> f64 {
    (CP_DRY_AIR * delta_t_k.max(0.0)) / H_FG_0C
}

/// Moist-gas specific heat per kg of mixture.
pub fn moist_cp(cp_dry: f64, humidity_ratio: f64) -> f64 {
    (cp_dry + humidity_ratio * CP_VAPOUR) / (1.0 + humidity_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humidity_ratio_at_iso_conditions() {
        let state = humidity_ratio_from_rh(15.0, 60.0, 101.325);
        assert!((state.humidity_ratio - 0.0063).abs() < 0.0005);
    }

    #[test]
    fn ratio_round_trips_through_relative_humidity() {
        let state = humidity_ratio_from_rh(30.0, 40.0, 101.325);
        let rh = relative_humidity_from_ratio(30.0, state.humidity_ratio, 101.325);
        assert!((rh - 40.0).abs() < 1e-6);
    }

    #[test]
    fn wet_bulb_below_dry_bulb() {
        let tw = wet_bulb_stull_c(35.0, 30.0);
        assert!(tw < 35.0);
        assert!((tw - 22.0).abs() < 1.5, "tw={tw}");
    }

    #[test]
    fn moist_cp_raises_with_humidity() {
        assert!(moist_cp(1.15, 0.02) > 1.15);
        assert_eq!(moist_cp(1.15, 0.0), 1.15);
    }
}
