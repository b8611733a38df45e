//! IAPWS-IF97 backend delegating to the `seuif97` crate.
//!
//! Liquid states are forced into region 1 and vapour states into region 2,
//! which keeps lookups unambiguous right at the saturation line. The
//! saturation temperature comes from the vapour-pressure equation solved
//! by Newton iteration. (p,h) and (p,s) states start from the crate's
//! backward equations and are polished against the forward lookup, so a
//! resolved temperature reproduces the input exactly.

use crate::error::{PropertyError, PropertyResult};
use crate::service::{
    PropertyService, Saturation, SteamPoint, invert, single_phase_bracket, wet_state_ph,
    wet_state_ps,
};
use hb_core::units::{bar_to_mpa, celsius_to_kelvin, kelvin_to_celsius};
use seuif97::{OCP, OH, OS, OT, ph, ps, pt};

const P_CRIT_MPA: f64 = 22.064;
const T_CRIT_K: f64 = 647.096;
const VP_N: [f64; 6] = [
    -7.859_517_83,
    1.844_082_59,
    -11.786_649_7,
    22.680_741_1,
    -15.961_871_9,
    1.801_225_02,
];

/// Lowest pressure resolved [bar] (just above the triple point).
pub const P_MIN_BAR: f64 = 0.01;
/// Highest pressure resolved [bar]; above it saturation leaves region 1/2.
pub const P_MAX_BAR: f64 = 165.0;

const REGION_LIQUID: i32 = 1;
const REGION_VAPOUR: i32 = 2;

const POLISH_MAX_ITER: usize = 12;
const POLISH_REL_TOL: f64 = 1e-11;

/// IF97 steam tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct If97Properties;

impl If97Properties {
    pub fn new() -> Self {
        Self
    }

    fn check_pressure(p_bar: f64) -> PropertyResult<()> {
        if !p_bar.is_finite() || p_bar <= 0.0 {
            return Err(PropertyError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        if !(P_MIN_BAR..=P_MAX_BAR).contains(&p_bar) {
            return Err(PropertyError::OutOfRange {
                what: "pressure",
                p_bar,
                value: p_bar,
            });
        }
        Ok(())
    }

    fn check_temperature(&self, p_bar: f64, t_c: f64) -> PropertyResult<()> {
        if !t_c.is_finite() || t_c < self.t_min_c() || t_c > self.t_max_c() {
            return Err(PropertyError::OutOfRange {
                what: "temperature",
                p_bar,
                value: t_c,
            });
        }
        Ok(())
    }

    /// Saturation temperature [°C] at `p_bar`.
    pub fn saturation_temperature(p_bar: f64) -> PropertyResult<f64> {
        Self::check_pressure(p_bar)?;
        let ln_pr = (bar_to_mpa(p_bar) / P_CRIT_MPA).ln();

        let mut t_k = 373.15_f64;
        for _ in 0..50 {
            let (f, df_dt) = vapour_pressure_residual(t_k, ln_pr);
            let delta = f / df_dt;
            t_k -= delta;
            if !t_k.is_finite() {
                break;
            }
            if delta.abs() < 1e-10 {
                return Ok(kelvin_to_celsius(t_k));
            }
        }
        Err(PropertyError::ConvergenceFailed {
            what: "saturation temperature",
        })
    }

    fn lookup(&self, p_bar: f64, t_c: f64, output: i32, region: i32) -> PropertyResult<f64> {
        let value = pt(bar_to_mpa(p_bar), t_c, (output, region));
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PropertyError::Backend {
                message: format!("IF97 region {region} failed at p={p_bar} bar, T={t_c} °C"),
            })
        }
    }

    /// Single-phase temperature at which `output` (enthalpy or entropy)
    /// equals `target`.
    fn single_phase_temperature(
        &self,
        p_bar: f64,
        target: f64,
        sat: &Saturation,
        output: i32,
        what: &'static str,
    ) -> PropertyResult<f64> {
        let liquid = if output == OH {
            target < sat.h_liquid
        } else {
            target < sat.s_liquid
        };
        let region = if liquid { REGION_LIQUID } else { REGION_VAPOUR };
        let (lo, hi) = single_phase_bracket(self, sat, liquid);
        let forward = |t_c: f64| self.lookup(p_bar, t_c, output, region);
        if target < forward(lo)? || target > forward(hi)? {
            return Err(PropertyError::OutOfRange {
                what,
                p_bar,
                value: target,
            });
        }

        let p_mpa = bar_to_mpa(p_bar);
        let estimate = if output == OH {
            ph(p_mpa, target, (OT, region))
        } else {
            ps(p_mpa, target, (OT, region))
        };
        if estimate.is_finite() {
            let mut t_c = estimate.clamp(lo, hi);
            for _ in 0..POLISH_MAX_ITER {
                let residual = forward(t_c)? - target;
                if residual.abs() <= POLISH_REL_TOL * target.abs().max(1.0) {
                    return Ok(t_c);
                }
                let cp = self.lookup(p_bar, t_c, OCP, region)?;
                let slope = if output == OH {
                    cp
                } else {
                    cp / celsius_to_kelvin(t_c)
                };
                if !(slope.is_finite() && slope > 0.0) {
                    break;
                }
                t_c = (t_c - residual / slope).clamp(lo, hi);
            }
        }
        // Backward equation unusable here; fall back to bisection.
        invert(p_bar, target, (lo, hi), what, forward)
    }

    fn region_for(&self, p_bar: f64, t_c: f64) -> PropertyResult<i32> {
        Self::check_pressure(p_bar)?;
        self.check_temperature(p_bar, t_c)?;
        let t_sat = Self::saturation_temperature(p_bar)?;
        Ok(if t_c < t_sat {
            REGION_LIQUID
        } else {
            REGION_VAPOUR
        })
    }
}

/// Residual of the vapour-pressure equation `ln(p/pc) - (Tc/T)·Σ n_i θ^e_i`
/// and its derivative with respect to T.
fn vapour_pressure_residual(t_k: f64, ln_pr: f64) -> (f64, f64) {
    let theta = 1.0 - t_k / T_CRIT_K;
    let series = VP_N[0] * theta
        + VP_N[1] * theta.powf(1.5)
        + VP_N[2] * theta.powi(3)
        + VP_N[3] * theta.powf(3.5)
        + VP_N[4] * theta.powi(4)
        + VP_N[5] * theta.powf(7.5);
    let dseries_dtheta = VP_N[0]
        + 1.5 * VP_N[1] * theta.powf(0.5)
        + 3.0 * VP_N[2] * theta.powi(2)
        + 3.5 * VP_N[3] * theta.powf(2.5)
        + 4.0 * VP_N[4] * theta.powi(3)
        + 7.5 * VP_N[5] * theta.powf(6.5);
    let f = (T_CRIT_K / t_k) * series - ln_pr;
    let df_dt = -(T_CRIT_K / t_k.powi(2)) * series - (1.0 / t_k) * dseries_dtheta;
    (f, df_dt)
}

impl PropertyService for If97Properties {
    fn name(&self) -> &str {
        "IAPWS-IF97"
    }

    fn saturation(&self, p_bar: f64) -> PropertyResult<Saturation> {
        let t_c = Self::saturation_temperature(p_bar)?;
        Ok(Saturation {
            t_c,
            h_liquid: self.lookup(p_bar, t_c, OH, REGION_LIQUID)?,
            h_vapor: self.lookup(p_bar, t_c, OH, REGION_VAPOUR)?,
            s_liquid: self.lookup(p_bar, t_c, OS, REGION_LIQUID)?,
            s_vapor: self.lookup(p_bar, t_c, OS, REGION_VAPOUR)?,
        })
    }

    fn enthalpy(&self, p_bar: f64, t_c: f64) -> PropertyResult<f64> {
        let region = self.region_for(p_bar, t_c)?;
        self.lookup(p_bar, t_c, OH, region)
    }

    fn entropy(&self, p_bar: f64, t_c: f64) -> PropertyResult<f64> {
        let region = self.region_for(p_bar, t_c)?;
        self.lookup(p_bar, t_c, OS, region)
    }

    fn state_ph(&self, p_bar: f64, h: f64) -> PropertyResult<SteamPoint> {
        let sat = self.saturation(p_bar)?;
        if let Some(point) = wet_state_ph(p_bar, h, &sat) {
            return Ok(point);
        }
        let t_c = self.single_phase_temperature(p_bar, h, &sat, OH, "T(p,h)")?;
        Ok(SteamPoint {
            p_bar,
            t_c,
            h,
            s: self.entropy(p_bar, t_c)?,
            quality: None,
        })
    }

    fn state_ps(&self, p_bar: f64, s: f64) -> PropertyResult<SteamPoint> {
        let sat = self.saturation(p_bar)?;
        if let Some(point) = wet_state_ps(p_bar, s, &sat) {
            return Ok(point);
        }
        let t_c = self.single_phase_temperature(p_bar, s, &sat, OS, "T(p,s)")?;
        Ok(SteamPoint {
            p_bar,
            t_c,
            h: self.enthalpy(p_bar, t_c)?,
            s,
            quality: None,
        })
    }
}
