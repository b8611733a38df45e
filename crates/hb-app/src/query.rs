//! Tabular views of run results.

use hb_solver::{PipelineTrace, PlantResult};

use crate::batch_service::BatchResponse;

/// One row per grid point, in grid order, with one column per axis.
pub fn batch_csv(response: &BatchResponse) -> String {
    let mut csv = String::from("index");
    for axis in &response.axes {
        csv.push(',');
        csv.push_str(&axis.path);
    }
    csv.push_str(
        ",GT_power_MW,ST_power_MW,NET_power_MW,NET_eff_LHV_pct,closure_error_pct,converged,run_id\n",
    );

    for point in &response.points {
        csv.push_str(&point.index.to_string());
        for (_, value) in &point.point {
            csv.push_str(&format!(",{}", value));
        }
        let s = &point.summary;
        csv.push_str(&format!(
            ",{:.3},{:.3},{:.3},{:.3},{:.4},{},{}\n",
            s.gt_power_mw,
            s.st_power_mw,
            s.net_power_mw,
            s.net_eff_lhv_pct,
            point.closure_error_pct,
            point.converged,
            point.run_id
        ));
    }
    csv
}

/// A labelled stage line for step-by-step output.
#[derive(Debug, Clone, PartialEq)]
pub struct StageStep {
    pub stage: &'static str,
    pub detail: String,
}

/// Stage-by-stage narrative of a run, in pipeline order.
pub fn stage_steps(result: &PlantResult, trace: &PipelineTrace) -> Vec<StageStep> {
    let mut steps = Vec::new();
    let gas = &trace.gas_path;

    let mut ambient = format!(
        "site {:.1} °C / {:.0} % RH / {:.4} bar",
        trace.site.ta_c, trace.site.rh_pct, trace.site.p_bar
    );
    if let Some(cooling) = &trace.inlet_cooling {
        ambient.push_str(&format!(
            ", inlet cooled by {:.1} K to {:.1} °C",
            cooling.temp_drop_k, trace.compressor_inlet.ta_c
        ));
    }
    steps.push(StageStep {
        stage: "ambient",
        detail: ambient,
    });

    let c = &trace.corrections;
    steps.push(StageStep {
        stage: "corrections",
        detail: format!(
            "power ×{:.4}, flow ×{:.4}, exhaust {:+.2} K, heat rate ×{:.4}",
            c.power_multiplier, c.flow_multiplier, c.exhaust_temp_delta_k, c.heat_rate_multiplier
        ),
    });

    let gt = &result.gt_block;
    steps.push(StageStep {
        stage: "gas turbine",
        detail: format!(
            "{:.2} MW, fuel {:.2} MW, exhaust {:.1} kg/s at {:.1} °C",
            gt.power_mw, gt.fuel_heat_input_mw, gas.gt_exhaust.flow_kg_s, gas.gt_exhaust.temp_c
        ),
    });

    if let Some(bypass) = &gas.bypass {
        steps.push(StageStep {
            stage: "bypass",
            detail: format!("{:.1} kg/s to stack", bypass.flow_kg_s),
        });
    }
    if gas.duct_firing.fuel_heat_mw > 0.0 {
        steps.push(StageStep {
            stage: "duct firing",
            detail: format!(
                "{:.2} MW fuel, HRSG inlet {:.1} °C",
                gas.duct_firing.fuel_heat_mw, gas.hrsg_inlet.temp_c
            ),
        });
    }

    let hrsg = &result.hrsg_block;
    for level in &hrsg.levels {
        let s = &level.stream;
        let mut detail = format!(
            "{:.2} kg/s at {:.1} bar / {:.1} °C, pinch margin {:.1} K",
            s.flow_kg_s, s.pressure_bar, s.temp_c, level.pinch_margin_k
        );
        if s.spray_kg_s > 0.0 {
            detail.push_str(&format!(", spray {:.2} kg/s", s.spray_kg_s));
        }
        steps.push(StageStep {
            stage: level.level.label(),
            detail,
        });
    }
    steps.push(StageStep {
        stage: "stack",
        detail: format!(
            "{:.1} °C after {} pass(es), discrepancy {:.3} %",
            hrsg.stack_temp_c, hrsg.iterations, hrsg.discrepancy_pct
        ),
    });

    steps.push(StageStep {
        stage: "steam turbine",
        detail: format!(
            "{:.2} MW, exhaust quality {}",
            result.st_block.power_mw,
            result
                .st_block
                .exhaust
                .quality
                .map_or_else(|| "superheated".to_string(), |x| format!("{:.3}", x))
        ),
    });

    let cond = &result.condenser_block;
    steps.push(StageStep {
        stage: "condenser",
        detail: format!(
            "{:.2} MW rejected, CW {:.1} -> {:.1} °C",
            cond.heat_rejected_mw, cond.cw_inlet_c, cond.cw_outlet_c
        ),
    });

    let balance = &result.mass_energy_balance;
    steps.push(StageStep {
        stage: "balance",
        detail: format!(
            "in {:.2} MW, out {:.2} MW, closure {:.4} %",
            balance.energy_in_mw, balance.energy_out_mw, balance.closure_error_pct
        ),
    });
    steps
}
