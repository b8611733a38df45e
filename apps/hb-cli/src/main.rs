use clap::{Parser, Subcommand};
use hb_app::{
    AppResult, BatchRequest, RunOptions, RunProgressEvent, RunRequest, batch_csv, case_service,
    query, run_service,
};
use hb_solver::PlantResult;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hb-cli")]
#[command(about = "heatbal CLI - combined-cycle heat balance solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a case file against the schema and defaults
    Validate {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
    },
    /// Run the heat balance for a case
    Run {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Write the result JSON here
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Print the stage-by-stage trace
        #[arg(long)]
        show_steps: bool,
    },
    /// Run every point of the case's `vary` grid
    Batch {
        /// Path to the case file (YAML or JSON)
        case_path: PathBuf,
        /// Write the grid table as CSV here (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached runs for a case
    Runs {
        /// Path to the case file
        case_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the case file
        case_path: PathBuf,
        /// Run ID to display
        run_id: String,
        /// Print the stage-by-stage trace
        #[arg(long)]
        show_steps: bool,
    },
}

fn main() -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Run {
            case_path,
            out,
            no_cache,
            show_steps,
        } => cmd_run(&case_path, out.as_deref(), !no_cache, show_steps),
        Commands::Batch {
            case_path,
            out,
            no_cache,
        } => cmd_batch(&case_path, out.as_deref(), !no_cache),
        Commands::Runs { case_path } => cmd_runs(&case_path),
        Commands::ShowRun {
            case_path,
            run_id,
            show_steps,
        } => cmd_show_run(&case_path, &run_id, show_steps),
    }
}

fn options(use_cache: bool) -> RunOptions {
    RunOptions {
        use_cache,
        ..RunOptions::default()
    }
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", case_path.display());
    let summary = case_service::validate_case_file(case_path)?;
    println!("✓ Case is valid");
    if let Some(description) = &summary.description {
        println!("  {}", description);
    }
    if let Some(version) = &summary.schema_version {
        println!("  Schema version: {}", version);
    }
    if summary.devices.is_empty() {
        println!("  Devices: none");
    } else {
        println!("  Devices:");
        for device in &summary.devices {
            let hooks = if device.hooks.is_empty() {
                "inactive".to_string()
            } else {
                device.hooks.join(", ")
            };
            println!("    {} ({}) at {}", device.id, device.kind, hooks);
        }
    }
    if !summary.axis_paths.is_empty() {
        println!(
            "  Batch grid: {} points over {}",
            summary.grid_points,
            summary.axis_paths.join(" × ")
        );
    }
    Ok(())
}

fn cmd_run(case_path: &Path, out: Option<&Path>, use_cache: bool, show_steps: bool) -> AppResult<()> {
    println!("Running heat balance: {}", case_path.display());

    let request = RunRequest {
        case_path,
        options: options(use_cache),
    };
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| render_cli_progress(&event)),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }

    print_result(&response.result);
    if show_steps {
        print_steps(case_path, &response.run_id, &response.result)?;
    }
    println!(
        "\nTiming: solve {:.3}s, save {:.3}s, total {:.3}s",
        response.timing.solve_time_s, response.timing.save_time_s, response.timing.total_time_s
    );

    if let Some(path) = out {
        run_service::write_result(path, &response.result)?;
        println!("✓ Result written to {}", path.display());
    }
    Ok(())
}

fn cmd_batch(case_path: &Path, out: Option<&Path>, use_cache: bool) -> AppResult<()> {
    println!("Running batch grid: {}", case_path.display());

    let response = hb_app::run_batch(&BatchRequest {
        case_path,
        options: options(use_cache),
    })?;
    println!(
        "✓ {} points ({} converged, {} from cache) in {:.2}s",
        response.points.len(),
        response.converged_count(),
        response.cached_count(),
        response.total_time_s
    );

    let csv = batch_csv(&response);
    if let Some(path) = out {
        std::fs::write(path, csv)?;
        println!("✓ Grid table written to {}", path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_runs(case_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(case_path)?;

    if runs.is_empty() {
        println!("No cached runs found for case: {}", case_path.display());
    } else {
        println!("Cached runs for '{}':", case_path.display());
        for manifest in runs {
            let status = if manifest.converged { "converged" } else { "NOT converged" };
            println!(
                "  {} ({}) NET {:.2} MW, {}",
                manifest.run_id, manifest.timestamp, manifest.net_power_mw, status
            );
        }
    }
    Ok(())
}

fn cmd_show_run(case_path: &Path, run_id: &str, show_steps: bool) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, result) = run_service::load_run(case_path, run_id)?;
    println!("  Case: {}", manifest.case_name);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Solver: {}", manifest.solver_version);
    if let Some(point) = &manifest.grid_point {
        let values: Vec<String> = point.iter().map(|(path, v)| format!("{path}={v}")).collect();
        println!("  Grid point: {}", values.join(", "));
    }

    print_result(&result);
    if show_steps {
        print_steps(case_path, run_id, &result)?;
    }
    Ok(())
}

fn print_result(result: &PlantResult) {
    let s = &result.summary;
    let balance = &result.mass_energy_balance;

    println!("\nPlant summary:");
    println!("  GT power:   {:>9.2} MW", s.gt_power_mw);
    println!("  ST power:   {:>9.2} MW", s.st_power_mw);
    println!("  Aux load:   {:>9.2} MW", s.aux_load_mw);
    println!("  NET power:  {:>9.2} MW", s.net_power_mw);
    println!("  NET eff:    {:>9.2} % (LHV)", s.net_eff_lhv_pct);
    println!("  Heat rate:  {:>9.1} kJ/kWh", s.net_heat_rate_kj_per_kwh);

    println!("\nSteam:");
    for level in &result.hrsg_block.levels {
        let st = &level.stream;
        println!(
            "  {}: {:>7.2} kg/s  {:>6.1} bar  {:>6.1} °C",
            level.level.label(),
            st.flow_kg_s,
            st.pressure_bar,
            st.temp_c
        );
    }
    println!("  Stack: {:.1} °C", result.hrsg_block.stack_temp_c);

    println!(
        "\nBalance: closure {:.4} %, {} ({} HRSG passes)",
        balance.closure_error_pct,
        if balance.converged { "converged" } else { "NOT converged" },
        balance.iterations_used
    );
    if !result.meta.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &result.meta.warnings {
            println!("  {}", warning);
        }
    }
}

fn print_steps(case_path: &Path, run_id: &str, result: &PlantResult) -> AppResult<()> {
    let trace = run_service::load_trace(case_path, run_id)?;
    println!("\nSteps:");
    for step in query::stage_steps(result, &trace) {
        println!("  {:<14} {}", step.stage, step.detail);
    }
    for call in &trace.device_calls {
        println!("  {:<14} {} ({}) at {}", "device", call.device_id, call.kind, call.hook.as_str());
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}
