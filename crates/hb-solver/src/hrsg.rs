//! Three-pressure HRSG energy balance.
//!
//! Gas path, hot to cold:
//!
//! ```text
//! SH+EVAP(HP) | ECO band HP | SH+EVAP(IP) | ECO band IP | SH+EVAP(LP) | ECO band LP | preheater | stack
//! ```
//!
//! Each level's superheater and evaporator take the gas down to the level's
//! pinch point (`T_sat + pinch_K`). The economizer band placed after a
//! level's evaporator heats every level at or above that pressure between
//! the band's temperature limits: band LP spans feedwater temperature up to
//! the LP economizer outlet, band IP spans the LP outlet up to the IP outlet,
//! band HP spans the IP outlet up to the HP outlet. Economizer outlets sit
//! `approach_K` below saturation. The preheater raises condensate from the
//! condenser to feedwater temperature.
//!
//! A pass is fully determined by the per-level flow caps. When the water side
//! needs more heat than the gas can give above the stack floor, the next pass
//! curtails the lowest-priority level (LP, then IP, then HP) by exactly the
//! deficit.

use crate::error::{SolverError, SolverResult};
use crate::gas_turbine::ExhaustGasState;
use crate::warnings::{Warning, WarningCode};
use hb_case::{ConstraintMode, ConstraintModes, HrsgConfig, PressureLevelConfig, SteamLevel};
use hb_core::bisect;
use hb_core::units::kpa_to_bar;
use hb_props::{PropertyService, Saturation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Pinch and approach used when a violated constraint is relaxed [K].
pub const RELAXED_DELTA_T_K: f64 = 1.0;

const FLOW_TOL_KG_S: f64 = 1e-9;
const FLOW_MAX_ITER: usize = 100;
const BRACKET_GROWTHS: usize = 64;
const TEMP_EPS_K: f64 = 1e-6;

const SOURCE: &str = "hrsg";

/// Steam delivered by one pressure level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SteamStreamState {
    pub pressure_bar: f64,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    pub flow_kg_s: f64,
    #[serde(rename = "enthalpy_kJ_per_kg")]
    pub enthalpy_kj_per_kg: f64,
    /// Attemperation spray included in `flow_kg_s`.
    #[serde(default)]
    pub spray_kg_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelResult {
    pub level: SteamLevel,
    pub stream: SteamStreamState,
    #[serde(rename = "t_sat_C")]
    pub t_sat_c: f64,
    /// Water temperature leaving the level's economizer [°C].
    #[serde(rename = "eco_outlet_C")]
    pub eco_outlet_c: f64,
    #[serde(rename = "gas_in_C")]
    pub gas_in_c: f64,
    #[serde(rename = "gas_evap_out_C")]
    pub gas_evap_out_c: f64,
    /// Gas leaving the economizer band that follows this evaporator.
    #[serde(rename = "gas_eco_out_C")]
    pub gas_eco_out_c: f64,
    /// Gas temperature leaving the evaporator minus saturation [K].
    #[serde(rename = "pinch_margin_K")]
    pub pinch_margin_k: f64,
    /// Saturation minus economizer outlet [K].
    #[serde(rename = "approach_margin_K")]
    pub approach_margin_k: f64,
    #[serde(rename = "pinch_applied_K")]
    pub pinch_applied_k: f64,
    /// Superheater + evaporator duty [MW].
    #[serde(rename = "evaporator_duty_MW")]
    pub evaporator_duty_mw: f64,
    /// Duty of the economizer band after this evaporator [MW].
    #[serde(rename = "economizer_duty_MW")]
    pub economizer_duty_mw: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WaterState {
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "enthalpy_kJ_per_kg")]
    pub enthalpy_kj_per_kg: f64,
}

/// Summary of one allocation pass, kept for the run trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HrsgPassTrace {
    pub pass: usize,
    pub flows_kg_s: [f64; 3],
    #[serde(rename = "stack_temp_C")]
    pub stack_temp_c: f64,
    #[serde(rename = "required_duty_MW")]
    pub required_duty_mw: f64,
    #[serde(rename = "available_duty_MW")]
    pub available_duty_mw: f64,
    pub discrepancy_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HrsgResult {
    pub levels: Vec<LevelResult>,
    pub inlet_gas: ExhaustGasState,
    #[serde(rename = "stack_temp_C")]
    pub stack_temp_c: f64,
    pub condensate: WaterState,
    #[serde(rename = "feedwater_temp_C")]
    pub feedwater_temp_c: f64,
    #[serde(rename = "preheater_duty_MW")]
    pub preheater_duty_mw: f64,
    /// Heat transferred to water and steam [MW].
    #[serde(rename = "total_duty_MW")]
    pub total_duty_mw: f64,
    pub discrepancy_pct: f64,
    pub converged: bool,
    pub iterations: usize,
    pub violations: Vec<WarningCode>,
    pub warnings: Vec<Warning>,
    pub passes: Vec<HrsgPassTrace>,
}

impl HrsgResult {
    pub fn level(&self, level: SteamLevel) -> &LevelResult {
        &self.levels[level.index()]
    }

    pub fn level_mut(&mut self, level: SteamLevel) -> &mut LevelResult {
        &mut self.levels[level.index()]
    }

    pub fn stream(&self, level: SteamLevel) -> &SteamStreamState {
        &self.level(level).stream
    }

    pub fn total_steam_kg_s(&self) -> f64 {
        self.levels.iter().map(|l| l.stream.flow_kg_s).sum()
    }
}

/// Inputs to one HRSG solve.
#[derive(Debug, Clone, Copy)]
pub struct HrsgInput<'a> {
    pub config: &'a HrsgConfig,
    pub constraints: ConstraintModes,
    pub condenser_vacuum_kpa: f64,
    /// Gas entering the HRSG (after bypass and duct firing).
    pub gas: ExhaustGasState,
    /// Levels whose superheater runs unrestricted because an attemperator
    /// trims the outlet afterwards.
    pub superheat_free: [bool; 3],
}

/// Fixed per-level data that does not change between passes.
struct LevelDesign<'a> {
    level: SteamLevel,
    cfg: &'a PressureLevelConfig,
    sat: Saturation,
    /// Economizer outlet after approach handling [°C].
    eco_outlet_c: f64,
    approach_violated: bool,
    /// Approach was relaxed to make room; warning only.
    approach_relaxed: bool,
}

#[derive(Debug, Clone)]
struct PassOutcome {
    levels: Vec<LevelResult>,
    stack_temp_c: f64,
    preheater_duty_mw: f64,
    required_mw: f64,
    available_mw: f64,
    discrepancy_pct: f64,
    deficit_mw: f64,
    violations: Vec<(WarningCode, String)>,
    steam_limited: Vec<String>,
}

/// Solve the HRSG for the given inlet gas.
///
/// Never fails on constraint or convergence trouble; those come back as
/// violations, warnings and `converged = false`. Only property lookups can
/// abort the solve.
pub fn solve_hrsg(input: &HrsgInput<'_>, props: &dyn PropertyService) -> SolverResult<HrsgResult> {
    let cfg = input.config;
    let vacuum_bar = kpa_to_bar(input.condenser_vacuum_kpa);
    let cond_sat = props.saturation(vacuum_bar)?;
    let condensate = WaterState {
        temp_c: cond_sat.t_c,
        enthalpy_kj_per_kg: cond_sat.h_liquid,
    };
    // Feedwater must stay liquid at LP pressure.
    let lp_sat = props.saturation(cfg.lp.pressure_bar)?;
    let feedwater_c = cfg
        .feedwater_temp_c
        .max(condensate.temp_c)
        .min(lp_sat.t_c - RELAXED_DELTA_T_K);

    let designs = level_designs(cfg, input.constraints.approach_mode, feedwater_c, props)?;
    let gas_floor_c = match input.constraints.stack_mode {
        ConstraintMode::Enforce => cfg.stack_temp_min_c.max(condensate.temp_c),
        ConstraintMode::Relax => condensate.temp_c,
    };

    let mut caps: [Option<f64>; 3] = [None; 3];
    let mut guesses: [f64; 3] =
        std::array::from_fn(|i| designs[i].cfg.design_flow_kg_s.unwrap_or(1.0).max(1.0));
    let mut traces = Vec::new();
    let mut stack_breached = false;
    let mut best: Option<PassOutcome> = None;
    let mut loop_converged = false;

    for pass in 1..=cfg.max_passes.max(1) {
        let outcome = run_pass(
            input,
            &designs,
            feedwater_c,
            &condensate,
            gas_floor_c,
            &caps,
            &guesses,
            props,
        )?;
        debug!(
            pass,
            hp = outcome.levels[0].stream.flow_kg_s,
            ip = outcome.levels[1].stream.flow_kg_s,
            lp = outcome.levels[2].stream.flow_kg_s,
            stack_c = outcome.stack_temp_c,
            discrepancy_pct = outcome.discrepancy_pct,
            "HRSG pass"
        );
        traces.push(HrsgPassTrace {
            pass,
            flows_kg_s: std::array::from_fn(|i| outcome.levels[i].stream.flow_kg_s),
            stack_temp_c: outcome.stack_temp_c,
            required_duty_mw: outcome.required_mw,
            available_duty_mw: outcome.available_mw,
            discrepancy_pct: outcome.discrepancy_pct,
        });
        if outcome.stack_temp_c < cfg.stack_temp_min_c - TEMP_EPS_K {
            stack_breached = true;
        }

        guesses = std::array::from_fn(|i| outcome.levels[i].stream.flow_kg_s.max(1.0));
        caps = curtail(&outcome, &condensate, caps);
        let done = outcome.discrepancy_pct <= cfg.tolerance_pct;
        if best
            .as_ref()
            .is_none_or(|b| outcome.discrepancy_pct < b.discrepancy_pct || done)
        {
            best = Some(outcome);
        }
        if done {
            loop_converged = true;
            break;
        }
    }

    let outcome = best.ok_or_else(|| SolverError::Numeric {
        what: "HRSG ran no passes".to_string(),
    })?;
    finish(
        input,
        outcome,
        traces,
        condensate,
        feedwater_c,
        stack_breached,
        loop_converged,
    )
}

fn level_designs<'a>(
    cfg: &'a HrsgConfig,
    approach_mode: ConstraintMode,
    feedwater_c: f64,
    props: &dyn PropertyService,
) -> SolverResult<Vec<LevelDesign<'a>>> {
    // Walk LP -> HP so each level sees the outlet of the band below it.
    let mut designs = Vec::with_capacity(3);
    let mut water_in_c = feedwater_c;
    for level in SteamLevel::ALL.into_iter().rev() {
        let level_cfg = cfg.level(level);
        let sat = props.saturation(level_cfg.pressure_bar)?;
        let mut eco_outlet_c = sat.t_c - level_cfg.approach_k;
        let mut approach_violated = false;
        let mut approach_relaxed = false;
        if eco_outlet_c < water_in_c {
            approach_violated = true;
            if approach_mode == ConstraintMode::Relax {
                let relaxed = sat.t_c - level_cfg.approach_k.min(RELAXED_DELTA_T_K);
                approach_relaxed = relaxed >= water_in_c;
                eco_outlet_c = relaxed;
            }
        }
        // Keep band limits monotone even when the level cannot use them.
        eco_outlet_c = eco_outlet_c.max(water_in_c).min(sat.t_c - TEMP_EPS_K);
        water_in_c = eco_outlet_c;
        designs.push(LevelDesign {
            level,
            cfg: level_cfg,
            sat,
            eco_outlet_c,
            approach_violated,
            approach_relaxed,
        });
    }
    designs.reverse();
    Ok(designs)
}

#[allow(clippy::too_many_arguments)]
fn run_pass(
    input: &HrsgInput<'_>,
    designs: &[LevelDesign<'_>],
    feedwater_c: f64,
    condensate: &WaterState,
    gas_floor_c: f64,
    caps: &[Option<f64>; 3],
    guesses: &[f64; 3],
    props: &dyn PropertyService,
) -> SolverResult<PassOutcome> {
    let gas = &input.gas;
    let c_kw = gas.capacity_rate();
    let modes = input.constraints;
    let mut gas_c = gas.temp_c;
    let mut levels: Vec<LevelResult> = Vec::with_capacity(3);
    let mut violations = Vec::new();
    let mut steam_limited = Vec::new();

    for (k, design) in designs.iter().enumerate() {
        let level = design.level;
        let gas_in_c = gas_c;
        let p_bar = design.cfg.pressure_bar;

        // Evaporator pinch.
        let mut pinch_k = design.cfg.pinch_k;
        let mut producing = true;
        if gas_in_c < design.sat.t_c + pinch_k {
            violations.push((
                WarningCode::HrsgPinchViolation,
                format!(
                    "{}: gas {:.1} °C below saturation {:.1} °C + pinch {:.1} K",
                    level.label(),
                    gas_in_c,
                    design.sat.t_c,
                    pinch_k
                ),
            ));
            match modes.pinch_mode {
                ConstraintMode::Enforce => producing = false,
                ConstraintMode::Relax => {
                    pinch_k = pinch_k.min(RELAXED_DELTA_T_K);
                    producing = gas_in_c > design.sat.t_c + pinch_k;
                }
            }
        }
        if design.approach_violated {
            violations.push((
                WarningCode::HrsgApproachViolation,
                format!(
                    "{}: economizer outlet {:.1} °C cannot sit {:.1} K below saturation {:.1} °C",
                    level.label(),
                    design.sat.t_c - design.cfg.approach_k,
                    design.cfg.approach_k,
                    design.sat.t_c
                ),
            ));
            if !design.approach_relaxed {
                producing = false;
            }
        }

        let h_eco_out = props.enthalpy(p_bar, design.eco_outlet_c)?;
        let (steam_c, h_steam) = if producing {
            let sh_limit_c = gas_in_c - pinch_k;
            let target_c = if input.superheat_free[level.index()] {
                let ceiling = design.cfg.steam_temp_max_c.unwrap_or(props.t_max_c());
                sh_limit_c.min(ceiling)
            } else {
                if design.cfg.steam_temp_c > sh_limit_c + TEMP_EPS_K {
                    steam_limited.push(format!(
                        "{}: {:.1} °C delivered, {:.1} °C requested",
                        level.label(),
                        sh_limit_c.max(design.sat.t_c),
                        design.cfg.steam_temp_c
                    ));
                }
                design.cfg.steam_temp_c.min(sh_limit_c)
            };
            steam_state(props, p_bar, &design.sat, target_c)?
        } else {
            (design.sat.t_c, design.sat.h_vapor)
        };

        let evap_kw = if producing {
            c_kw * (gas_in_c - (design.sat.t_c + pinch_k))
        } else {
            0.0
        };
        let dh = h_steam - h_eco_out;
        let uncapped = level_flow(evap_kw, dh, guesses[k])?;
        let flow = caps[k].map_or(uncapped, |cap| uncapped.min(cap));
        let evaporator_kw = flow * dh;
        gas_c -= evaporator_kw / c_kw;
        let gas_evap_out_c = gas_c;

        // Economizer band below this evaporator.
        let band_floor_c = designs.get(k + 1).map_or(feedwater_c, |d| d.eco_outlet_c);
        let band_ceiling_c = design.eco_outlet_c;
        let mut band_kw = flow * (h_eco_out - props.enthalpy(p_bar, band_floor_c)?);
        for (upper, result) in designs.iter().zip(levels.iter()) {
            if result.stream.flow_kg_s > 0.0 {
                let p = upper.cfg.pressure_bar;
                let dh_band =
                    props.enthalpy(p, band_ceiling_c)? - props.enthalpy(p, band_floor_c)?;
                band_kw += result.stream.flow_kg_s * dh_band;
            }
        }
        gas_c -= band_kw / c_kw;
        if band_kw > 0.0 && gas_c < band_floor_c - TEMP_EPS_K {
            violations.push((
                WarningCode::HrsgApproachViolation,
                format!(
                    "{} economizer band: gas leaves at {:.1} °C, water enters at {:.1} °C",
                    level.label(),
                    gas_c,
                    band_floor_c
                ),
            ));
        }

        levels.push(LevelResult {
            level,
            stream: SteamStreamState {
                pressure_bar: p_bar,
                temp_c: steam_c,
                flow_kg_s: flow,
                enthalpy_kj_per_kg: h_steam,
                spray_kg_s: 0.0,
            },
            t_sat_c: design.sat.t_c,
            eco_outlet_c: design.eco_outlet_c,
            gas_in_c,
            gas_evap_out_c,
            gas_eco_out_c: gas_c,
            pinch_margin_k: gas_evap_out_c - design.sat.t_c,
            approach_margin_k: design.sat.t_c - design.eco_outlet_c,
            pinch_applied_k: pinch_k,
            evaporator_duty_mw: evaporator_kw / 1000.0,
            economizer_duty_mw: band_kw / 1000.0,
        });
    }

    // Preheater: condensate to feedwater temperature, per level pressure.
    let mut preheater_kw = 0.0;
    for (design, result) in designs.iter().zip(levels.iter()) {
        let h_fw = props.enthalpy(design.cfg.pressure_bar, feedwater_c)?;
        preheater_kw += result.stream.flow_kg_s * (h_fw - condensate.enthalpy_kj_per_kg);
    }
    let stack_temp_c = gas_c - preheater_kw / c_kw;

    let required_mw: f64 = levels
        .iter()
        .map(|l| l.evaporator_duty_mw + l.economizer_duty_mw)
        .sum::<f64>()
        + preheater_kw / 1000.0;
    let available_mw = (c_kw * (gas.temp_c - gas_floor_c) / 1000.0).max(0.0);
    let deficit_mw = (required_mw - available_mw).max(0.0);
    let discrepancy_pct = if available_mw > 0.0 {
        deficit_mw / available_mw * 100.0
    } else if required_mw > 0.0 {
        100.0
    } else {
        0.0
    };

    Ok(PassOutcome {
        levels,
        stack_temp_c,
        preheater_duty_mw: preheater_kw / 1000.0,
        required_mw,
        available_mw,
        discrepancy_pct,
        deficit_mw,
        violations,
        steam_limited,
    })
}

/// Steam temperature and enthalpy for a superheater outlet of `target_c`.
fn steam_state(
    props: &dyn PropertyService,
    p_bar: f64,
    sat: &Saturation,
    target_c: f64,
) -> SolverResult<(f64, f64)> {
    if target_c <= sat.t_c + TEMP_EPS_K {
        Ok((sat.t_c, sat.h_vapor))
    } else {
        Ok((target_c, props.enthalpy(p_bar, target_c)?))
    }
}

/// Flow that absorbs `duty_kw` at `dh` kJ/kg: root of `m·dh − Q` by
/// bisection, bracket grown from the previous guess.
fn level_flow(duty_kw: f64, dh: f64, guess: f64) -> SolverResult<f64> {
    if duty_kw <= 0.0 || dh <= 0.0 {
        return Ok(0.0);
    }
    let residual = |m: f64| Ok::<f64, SolverError>(m * dh - duty_kw);
    let mut hi = guess.max(1.0);
    for _ in 0..BRACKET_GROWTHS {
        if hi * dh >= duty_kw {
            break;
        }
        hi *= 2.0;
    }
    bisect(residual, 0.0, hi, FLOW_TOL_KG_S, FLOW_MAX_ITER, "HRSG level flow")
}

/// Caps for the next pass: remove the deficit from LP first, then IP,
/// then HP. Taking `m` kg/s out of a level frees `m·(h_steam − h_cond)`.
fn curtail(outcome: &PassOutcome, condensate: &WaterState, caps: [Option<f64>; 3]) -> [Option<f64>; 3] {
    let mut caps = caps;
    let mut deficit_kw = outcome.deficit_mw * 1000.0;
    for level in SteamLevel::ALL.into_iter().rev() {
        if deficit_kw <= 0.0 {
            break;
        }
        let stream = &outcome.levels[level.index()].stream;
        let dh = stream.enthalpy_kj_per_kg - condensate.enthalpy_kj_per_kg;
        if stream.flow_kg_s <= 0.0 || dh <= 0.0 {
            continue;
        }
        let cut = (deficit_kw / dh).min(stream.flow_kg_s);
        caps[level.index()] = Some(stream.flow_kg_s - cut);
        deficit_kw -= cut * dh;
    }
    caps
}

#[allow(clippy::too_many_arguments)]
fn finish(
    input: &HrsgInput<'_>,
    outcome: PassOutcome,
    passes: Vec<HrsgPassTrace>,
    condensate: WaterState,
    feedwater_c: f64,
    stack_breached: bool,
    loop_converged: bool,
) -> SolverResult<HrsgResult> {
    let iterations = passes.len();
    let cfg = input.config;
    let modes = input.constraints;
    let mut warnings = Vec::new();
    let mut violations = Vec::new();
    let mut hard_violation = false;

    for (code, detail) in &outcome.violations {
        let mode = match code {
            WarningCode::HrsgPinchViolation => modes.pinch_mode,
            _ => modes.approach_mode,
        };
        hard_violation |= mode == ConstraintMode::Enforce;
        if !violations.contains(code) {
            violations.push(*code);
        }
        warnings.push(Warning::new(*code, SOURCE).with_detail(detail.clone()));
    }

    if stack_breached {
        hard_violation |= modes.stack_mode == ConstraintMode::Enforce;
        violations.push(WarningCode::HrsgStackTempLow);
        let detail = match modes.stack_mode {
            ConstraintMode::Enforce => format!(
                "natural stack below {:.1} °C; steam curtailed to hold the floor",
                cfg.stack_temp_min_c
            ),
            ConstraintMode::Relax => format!(
                "stack {:.1} °C, minimum {:.1} °C",
                outcome.stack_temp_c, cfg.stack_temp_min_c
            ),
        };
        warnings.push(Warning::new(WarningCode::HrsgStackTempLow, SOURCE).with_detail(detail));
    }
    if let Some(max) = cfg.stack_temp_max_c
        && outcome.stack_temp_c > max
    {
        warnings.push(
            Warning::new(WarningCode::HrsgStackTempHigh, SOURCE).with_detail(format!(
                "stack {:.1} °C, maximum {:.1} °C",
                outcome.stack_temp_c, max
            )),
        );
    }
    for detail in &outcome.steam_limited {
        warnings.push(Warning::new(WarningCode::HrsgSteamTempLimited, SOURCE).with_detail(detail.clone()));
    }
    if !loop_converged {
        warnings.push(
            Warning::new(WarningCode::HrsgNotConverged, SOURCE).with_detail(format!(
                "discrepancy {:.3} % after {} passes",
                outcome.discrepancy_pct, iterations
            )),
        );
    }

    let converged = loop_converged && !hard_violation;
    for w in &warnings {
        warn!(code = %w.code, detail = w.detail.as_deref().unwrap_or(""), "HRSG");
    }
    let total_duty_mw = outcome.required_mw;
    info!(
        hp_kg_s = outcome.levels[0].stream.flow_kg_s,
        ip_kg_s = outcome.levels[1].stream.flow_kg_s,
        lp_kg_s = outcome.levels[2].stream.flow_kg_s,
        stack_c = outcome.stack_temp_c,
        passes = iterations,
        converged,
        "HRSG solved"
    );

    Ok(HrsgResult {
        levels: outcome.levels,
        inlet_gas: input.gas,
        stack_temp_c: outcome.stack_temp_c,
        condensate,
        feedwater_temp_c: feedwater_c,
        preheater_duty_mw: outcome.preheater_duty_mw,
        total_duty_mw,
        discrepancy_pct: outcome.discrepancy_pct,
        converged,
        iterations,
        violations,
        warnings,
        passes,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use hb_props::If97Properties;
    use proptest::prelude::*;

    fn config(stack_min: f64, max_passes: usize) -> HrsgConfig {
        let level = |pressure_bar, steam_temp_c| PressureLevelConfig {
            pressure_bar,
            steam_temp_c,
            pinch_k: 10.0,
            approach_k: 5.0,
            design_flow_kg_s: None,
            steam_temp_max_c: None,
        };
        HrsgConfig {
            hp: level(120.0, 540.0),
            ip: level(28.0, 250.0),
            lp: level(4.5, 170.0),
            stack_temp_min_c: stack_min,
            stack_temp_max_c: None,
            feedwater_temp_c: 95.0,
            bypass_fraction: 0.0,
            max_passes,
            tolerance_pct: 0.5,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn passes_never_exceed_budget(
            gas_c in 250.0f64..700.0,
            stack_min in 60.0f64..180.0,
            max_passes in 1usize..8,
        ) {
            let cfg = config(stack_min, max_passes);
            let input = HrsgInput {
                config: &cfg,
                constraints: ConstraintModes::default(),
                condenser_vacuum_kpa: 8.0,
                gas: ExhaustGasState { flow_kg_s: 600.0, temp_c: gas_c, cp_kj_per_kgk: 1.16 },
                superheat_free: [false; 3],
            };
            let r = solve_hrsg(&input, &If97Properties::new()).unwrap();
            prop_assert!(r.iterations >= 1 && r.iterations <= max_passes);
            prop_assert_eq!(r.passes.len(), r.iterations);
            for l in &r.levels {
                prop_assert!(l.stream.flow_kg_s >= 0.0);
            }
        }

        #[test]
        fn hotter_gas_never_raises_less_hp_steam(gas_c in 400.0f64..650.0, dt in 1.0f64..40.0) {
            let cfg = config(80.0, 50);
            let run = |t| {
                let input = HrsgInput {
                    config: &cfg,
                    constraints: ConstraintModes::default(),
                    condenser_vacuum_kpa: 8.0,
                    gas: ExhaustGasState { flow_kg_s: 600.0, temp_c: t, cp_kj_per_kgk: 1.16 },
                    superheat_free: [false; 3],
                };
                solve_hrsg(&input, &If97Properties::new()).unwrap()
            };
            let cool = run(gas_c);
            let hot = run(gas_c + dt);
            prop_assert!(hot.stream(SteamLevel::Hp).flow_kg_s >= cool.stream(SteamLevel::Hp).flow_kg_s);
        }
    }
}
