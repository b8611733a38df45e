//! The staged heat balance run.
//!
//! ```text
//! pre_GT -> ambient correction -> GT -> bypass split -> pre_HRSG -> HRSG
//!        -> post_HRSG -> pre_ST -> ST -> pre_Condenser -> condenser -> summary
//! ```
//!
//! Every stage is a function of the case and the stages before it; a run
//! keeps no state between calls, so runs can execute on any thread.

use crate::ambient::{AmbientState, CorrectionFactors, correct, vendor_curve_missing};
use crate::condenser::{CondenserResult, solve_condenser};
use crate::devices::{
    DeviceHookRunner, DeviceInvocation, DuctFiringDuty, HookContext, InletCoolingRecord,
    PlantModel,
};
use crate::error::{SolverError, SolverResult};
use crate::gas_turbine::{ExhaustGasState, GtResult, solve_gas_turbine};
use crate::hrsg::{HrsgInput, HrsgResult, solve_hrsg};
use crate::steam_turbine::{StResult, solve_steam_turbine};
use crate::summary::{PlantBalance, PlantSummary, StageResults, summarize};
use crate::warnings::{Warning, WarningCode, dedup_by_code};
use hb_case::{CaseConfiguration, HookPoint};
use hb_core::units::kpa_to_bar;
use hb_props::PropertyService;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Run identification supplied by the caller. The pipeline never reads
/// clocks or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunMeta {
    pub timestamp_utc: Option<String>,
    pub solver_version: String,
    pub solver_commit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultMeta {
    pub input_case: Option<String>,
    pub timestamp_utc: Option<String>,
    pub solver_version: String,
    pub solver_commit: Option<String>,
    pub property_backend: String,
    pub converged: bool,
    pub warnings: Vec<Warning>,
}

/// The structured result of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantResult {
    pub summary: PlantSummary,
    pub gt_block: GtResult,
    pub hrsg_block: HrsgResult,
    pub st_block: StResult,
    pub condenser_block: CondenserResult,
    pub mass_energy_balance: PlantBalance,
    pub meta: ResultMeta,
}

/// How the gas reached the HRSG.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasPathTrace {
    pub gt_exhaust: ExhaustGasState,
    pub bypass: Option<ExhaustGasState>,
    pub hrsg_inlet: ExhaustGasState,
    pub duct_firing: DuctFiringDuty,
}

/// Per-stage record of a run, for reports and debugging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineTrace {
    pub site: AmbientState,
    pub compressor_inlet: AmbientState,
    pub inlet_cooling: Option<InletCoolingRecord>,
    pub corrections: CorrectionFactors,
    pub gas_path: GasPathTrace,
    pub superheat_free: [bool; 3],
    pub device_calls: Vec<DeviceInvocation>,
    pub inactive_devices: Vec<String>,
    /// Every warning in the order raised, before de-duplication.
    pub warnings_raised: Vec<Warning>,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineArtifacts {
    pub result: PlantResult,
    pub trace: PipelineTrace,
    pub merged_case: CaseConfiguration,
}

fn stage_output<T>(slot: Option<T>, stage: &str) -> SolverResult<T> {
    slot.ok_or_else(|| SolverError::Numeric {
        what: format!("{stage} output missing from plant model"),
    })
}

struct HookDriver<'a> {
    runner: DeviceHookRunner<'a>,
    ctx: HookContext<'a>,
    calls: Vec<DeviceInvocation>,
    warnings: Vec<Warning>,
}

impl HookDriver<'_> {
    fn run(&mut self, hook: HookPoint, model: PlantModel) -> SolverResult<PlantModel> {
        let outcome = self.runner.run(hook, model, &self.ctx)?;
        self.calls.extend(outcome.invocations);
        self.warnings.extend(outcome.warnings);
        Ok(outcome.model)
    }
}

/// Run the full heat balance for one case.
pub fn run_pipeline(
    case: &CaseConfiguration,
    props: &dyn PropertyService,
    meta: RunMeta,
) -> SolverResult<PipelineArtifacts> {
    let input_case = case.meta.input_case.clone();
    info!(case = input_case.as_deref().unwrap_or("<unnamed>"), "heat balance start");

    let site = AmbientState::from(&case.ambient);
    let runner = DeviceHookRunner::new(&case.devices);
    let inactive_devices = runner.inactive_devices();
    let mut hooks = HookDriver {
        runner,
        ctx: HookContext { case, props },
        calls: Vec::new(),
        warnings: inactive_devices
            .iter()
            .map(|id| Warning::new(WarningCode::DeviceInactive, id.clone()))
            .collect(),
    };

    // Gas turbine.
    let model = hooks.run(HookPoint::PreGt, PlantModel::new(site))?;
    let coeff = &case.gas_turbine.corr_coeff;
    if vendor_curve_missing(coeff, &case.vendor_curves) {
        hooks.warnings.push(
            Warning::new(WarningCode::GtVendorCurveMissing, "ambient")
                .with_detail(coeff.vendor_curve.clone().unwrap_or_default()),
        );
    }
    let corrections = correct(&model.inlet_air, coeff, &case.vendor_curves);
    let gt = solve_gas_turbine(&case.gas_turbine, &corrections)?;
    info!(power_mw = gt.power_mw, exhaust_c = gt.exhaust.temp_c, "gas turbine solved");

    // HRSG.
    let bypass_fraction = case.hrsg.bypass_fraction;
    let bypass = (bypass_fraction > 0.0).then(|| gt.exhaust.split(bypass_fraction));
    let model = PlantModel {
        hrsg_gas: Some(gt.exhaust.split(1.0 - bypass_fraction)),
        ..model
    };
    let mut model = hooks.run(HookPoint::PreHrsg, model)?;
    let hrsg_gas = stage_output(model.hrsg_gas, "HRSG inlet")?;
    let input = HrsgInput {
        config: &case.hrsg,
        constraints: case.constraints,
        condenser_vacuum_kpa: case.condenser.vacuum_kpa_abs,
        gas: hrsg_gas,
        superheat_free: model.superheat_free,
    };
    model.hrsg = Some(solve_hrsg(&input, props)?);
    let model = hooks.run(HookPoint::PostHrsg, model)?;
    let mut model = hooks.run(HookPoint::PreSt, model)?;

    // Steam cycle.
    let hrsg = stage_output(model.hrsg.clone(), "HRSG")?;
    let condenser_bar = kpa_to_bar(case.condenser.vacuum_kpa_abs);
    model.steam_turbine = Some(solve_steam_turbine(
        &case.steam_turbine,
        &hrsg,
        condenser_bar,
        props,
    )?);
    let model = hooks.run(HookPoint::PreCondenser, model)?;
    let st = stage_output(model.steam_turbine.clone(), "steam turbine")?;
    let condenser = solve_condenser(&case.condenser, &st.exhaust, props)?;

    let (summary, balance) = summarize(&StageResults {
        ambient_c: site.ta_c,
        aux_load_mw: case.bop.aux_load_mw,
        gt: &gt,
        bypass: bypass.as_ref(),
        duct_firing: &model.duct_firing,
        hrsg: &hrsg,
        st: &st,
        condenser: &condenser,
    });
    info!(
        net_mw = summary.net_power_mw,
        eff_pct = summary.net_eff_lhv_pct,
        closure_pct = balance.closure_error_pct,
        converged = balance.converged,
        "heat balance done"
    );

    let HookDriver {
        calls,
        warnings: mut raised,
        ..
    } = hooks;
    raised.extend(hrsg.warnings.iter().cloned());
    raised.extend(condenser.warnings.iter().cloned());
    raised.extend(balance.warnings.iter().cloned());

    let trace = PipelineTrace {
        site,
        compressor_inlet: model.inlet_air,
        inlet_cooling: model.inlet_cooling,
        corrections,
        gas_path: GasPathTrace {
            gt_exhaust: gt.exhaust,
            bypass,
            hrsg_inlet: hrsg_gas,
            duct_firing: model.duct_firing,
        },
        superheat_free: model.superheat_free,
        device_calls: calls,
        inactive_devices,
        warnings_raised: raised.clone(),
    };
    let result = PlantResult {
        meta: ResultMeta {
            input_case,
            timestamp_utc: meta.timestamp_utc,
            solver_version: meta.solver_version,
            solver_commit: meta.solver_commit,
            property_backend: props.name().to_string(),
            converged: balance.converged,
            warnings: dedup_by_code(raised),
        },
        summary,
        gt_block: gt,
        hrsg_block: hrsg,
        st_block: st,
        condenser_block: condenser,
        mass_energy_balance: balance,
    };

    Ok(PipelineArtifacts {
        result,
        trace,
        merged_case: case.clone(),
    })
}
