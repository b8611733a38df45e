//! Steam/water property service trait.

use crate::error::{PropertyError, PropertyResult};
use hb_core::numeric::bisect;

/// Saturation data at a given pressure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Saturation {
    /// Saturation temperature [°C]
    pub t_c: f64,
    /// Saturated liquid enthalpy [kJ/kg]
    pub h_liquid: f64,
    /// Saturated vapour enthalpy [kJ/kg]
    pub h_vapor: f64,
    /// Saturated liquid entropy [kJ/(kg·K)]
    pub s_liquid: f64,
    /// Saturated vapour entropy [kJ/(kg·K)]
    pub s_vapor: f64,
}

impl Saturation {
    pub fn h_fg(&self) -> f64 {
        self.h_vapor - self.h_liquid
    }
}

/// Fully resolved water/steam state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteamPoint {
    pub p_bar: f64,
    pub t_c: f64,
    pub h: f64,
    pub s: f64,
    /// Vapour mass fraction inside the dome, `None` for single phase.
    pub quality: Option<f64>,
}

const INVERSE_T_TOL: f64 = 1e-7;
const INVERSE_MAX_ITER: usize = 100;

/// Steam/water property service.
///
/// Units: pressure in bar(abs), temperature in °C, enthalpy in kJ/kg,
/// entropy in kJ/(kg·K). Implementations must be reentrant (`Send + Sync`)
/// so that independent runs can share one instance across threads.
///
/// `enthalpy` and `entropy` are single-phase lookups: temperatures below
/// saturation resolve to compressed liquid, temperatures at or above
/// saturation resolve to vapour.
pub trait PropertyService: Send + Sync {
    /// Backend name (for logs and run metadata).
    fn name(&self) -> &str;

    /// Saturation data at pressure `p_bar`.
    fn saturation(&self, p_bar: f64) -> PropertyResult<Saturation>;

    /// Single-phase specific enthalpy [kJ/kg].
    fn enthalpy(&self, p_bar: f64, t_c: f64) -> PropertyResult<f64>;

    /// Single-phase specific entropy [kJ/(kg·K)].
    fn entropy(&self, p_bar: f64, t_c: f64) -> PropertyResult<f64>;

    /// Lowest temperature the backend resolves [°C].
    fn t_min_c(&self) -> f64 {
        0.01
    }

    /// Highest temperature the backend resolves [°C].
    fn t_max_c(&self) -> f64 {
        800.0
    }

    /// Resolve a state from pressure and enthalpy.
    ///
    /// The default inverts `enthalpy(p, T)` by bisection; backends with
    /// native backward equations may override it.
    fn state_ph(&self, p_bar: f64, h: f64) -> PropertyResult<SteamPoint> {
        let sat = self.saturation(p_bar)?;
        if let Some(point) = wet_state_ph(p_bar, h, &sat) {
            return Ok(point);
        }
        let bracket = single_phase_bracket(self, &sat, h < sat.h_liquid);
        let t_c = invert(p_bar, h, bracket, "T(p,h)", |t| self.enthalpy(p_bar, t))?;
        Ok(SteamPoint {
            p_bar,
            t_c,
            h,
            s: self.entropy(p_bar, t_c)?,
            quality: None,
        })
    }

    /// Resolve a state from pressure and entropy.
    fn state_ps(&self, p_bar: f64, s: f64) -> PropertyResult<SteamPoint> {
        let sat = self.saturation(p_bar)?;
        if let Some(point) = wet_state_ps(p_bar, s, &sat) {
            return Ok(point);
        }
        let bracket = single_phase_bracket(self, &sat, s < sat.s_liquid);
        let t_c = invert(p_bar, s, bracket, "T(p,s)", |t| self.entropy(p_bar, t))?;
        Ok(SteamPoint {
            p_bar,
            t_c,
            h: self.enthalpy(p_bar, t_c)?,
            s,
            quality: None,
        })
    }

    /// Isentropic-expansion helper: enthalpy at `(p, s)`.
    fn enthalpy_ps(&self, p_bar: f64, s: f64) -> PropertyResult<f64> {
        Ok(self.state_ps(p_bar, s)?.h)
    }
}

/// Two-phase state when `h` lies inside the dome at `p_bar`.
pub(crate) fn wet_state_ph(p_bar: f64, h: f64, sat: &Saturation) -> Option<SteamPoint> {
    if !(sat.h_liquid..=sat.h_vapor).contains(&h) {
        return None;
    }
    let x = (h - sat.h_liquid) / sat.h_fg();
    Some(SteamPoint {
        p_bar,
        t_c: sat.t_c,
        h,
        s: sat.s_liquid + x * (sat.s_vapor - sat.s_liquid),
        quality: Some(x),
    })
}

/// Two-phase state when `s` lies inside the dome at `p_bar`.
pub(crate) fn wet_state_ps(p_bar: f64, s: f64, sat: &Saturation) -> Option<SteamPoint> {
    if !(sat.s_liquid..=sat.s_vapor).contains(&s) {
        return None;
    }
    let x = (s - sat.s_liquid) / (sat.s_vapor - sat.s_liquid);
    Some(SteamPoint {
        p_bar,
        t_c: sat.t_c,
        h: sat.h_liquid + x * sat.h_fg(),
        s,
        quality: Some(x),
    })
}

pub(crate) fn single_phase_bracket(
    svc: &(impl PropertyService + ?Sized),
    sat: &Saturation,
    liquid: bool,
) -> (f64, f64) {
    if liquid {
        (svc.t_min_c(), sat.t_c - INVERSE_T_TOL)
    } else {
        (sat.t_c, svc.t_max_c())
    }
}

/// Invert a monotone single-phase property `prop(T)` for temperature.
pub(crate) fn invert<F>(
    p_bar: f64,
    target: f64,
    (lo, hi): (f64, f64),
    what: &'static str,
    prop: F,
) -> PropertyResult<f64>
where
    F: Fn(f64) -> PropertyResult<f64>,
{
    let at_lo = prop(lo)?;
    let at_hi = prop(hi)?;
    if target < at_lo.min(at_hi) || target > at_lo.max(at_hi) {
        return Err(PropertyError::OutOfRange {
            what,
            p_bar,
            value: target,
        });
    }
    bisect(
        |t| Ok::<f64, PropertyError>(prop(t)? - target),
        lo,
        hi,
        INVERSE_T_TOL,
        INVERSE_MAX_ITER,
        what,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy backend: constant cp liquid and vapour with a fixed latent heat.
    struct LinearWater;

    impl PropertyService for LinearWater {
        fn name(&self) -> &str {
            "linear"
        }

        fn saturation(&self, p_bar: f64) -> PropertyResult<Saturation> {
            let t_c = 100.0 + 10.0 * (p_bar - 1.0);
            Ok(Saturation {
                t_c,
                h_liquid: 4.0 * t_c,
                h_vapor: 4.0 * t_c + 2000.0,
                s_liquid: 0.01 * t_c,
                s_vapor: 0.01 * t_c + 5.0,
            })
        }

        fn enthalpy(&self, p_bar: f64, t_c: f64) -> PropertyResult<f64> {
            let sat = self.saturation(p_bar)?;
            if t_c < sat.t_c {
                Ok(4.0 * t_c)
            } else {
                Ok(sat.h_vapor + 2.0 * (t_c - sat.t_c))
            }
        }

        fn entropy(&self, p_bar: f64, t_c: f64) -> PropertyResult<f64> {
            let sat = self.saturation(p_bar)?;
            if t_c < sat.t_c {
                Ok(0.01 * t_c)
            } else {
                Ok(sat.s_vapor + 0.002 * (t_c - sat.t_c))
            }
        }
    }

    #[test]
    fn state_ph_inside_dome_reports_quality() {
        let pt = LinearWater.state_ph(1.0, 400.0 + 1000.0).unwrap();
        assert_eq!(pt.t_c, 100.0);
        assert!((pt.quality.unwrap() - 0.5).abs() < 1e-12);
        assert!((pt.s - 3.5).abs() < 1e-12);
    }

    #[test]
    fn state_ph_superheated_inverts_temperature() {
        let pt = LinearWater.state_ph(1.0, 2400.0 + 100.0).unwrap();
        assert!((pt.t_c - 150.0).abs() < 1e-5);
        assert!(pt.quality.is_none());
    }

    #[test]
    fn state_ph_liquid_inverts_temperature() {
        let pt = LinearWater.state_ph(1.0, 200.0).unwrap();
        assert!((pt.t_c - 50.0).abs() < 1e-5);
    }

    #[test]
    fn enthalpy_ps_out_of_range_is_error() {
        let err = LinearWater.enthalpy_ps(1.0, 1e6).unwrap_err();
        assert!(matches!(err, PropertyError::OutOfRange { .. }));
    }
}
