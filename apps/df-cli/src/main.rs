use clap::{Parser, Subcommand};
use df_project::{ProjectError, build_case, load_case};
use df_sim::{SimError, SimProgress, TwoPhaseSystem, run_sim_with_progress};
use df_thermo::{LookupTable1D, TableMod, ThermoError, ThermoPropertyPack};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Thermo(#[from] ThermoError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "df-cli")]
#[command(about = "DetonFlow CLI - reacting two-phase flow solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate case file syntax and structure
    Validate {
        /// Path to the case YAML or JSON file
        case_path: PathBuf,
    },
    /// Print the phase properties of the initial state
    Info {
        /// Path to the case YAML or JSON file
        case_path: PathBuf,
        /// Cell to report
        #[arg(long, default_value_t = 0)]
        cell: usize,
        /// Print the report as YAML
        #[arg(long)]
        yaml: bool,
    },
    /// Run a case
    Run {
        /// Path to the case YAML or JSON file
        case_path: PathBuf,
        /// Override the time step in seconds
        #[arg(long)]
        dt: Option<f64>,
        /// Override the end time in seconds
        #[arg(long)]
        t_end: Option<f64>,
        /// Write final cell fields as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a two-column lookup table
    Lookup {
        /// Path to the table file
        table_path: PathBuf,
        /// Query value (x, or f with --reverse)
        value: f64,
        /// Transform of the f column (none, ln, exp, log10, pow10)
        #[arg(long = "mod", default_value = "none")]
        f_mod: TableMod,
        /// Transform of the x column
        #[arg(long, default_value = "none")]
        x_mod: TableMod,
        /// Solve table(x) = value for x
        #[arg(long)]
        reverse: bool,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Info {
            case_path,
            cell,
            yaml,
        } => cmd_info(&case_path, cell, yaml),
        Commands::Run {
            case_path,
            dt,
            t_end,
            output,
        } => cmd_run(&case_path, dt, t_end, output.as_deref()),
        Commands::Lookup {
            table_path,
            value,
            f_mod,
            x_mod,
            reverse,
        } => cmd_lookup(&table_path, value, f_mod, x_mod, reverse),
    };
    if let Err(e) = &result {
        tracing::error!(error = %e, "command failed");
    }
    result
}

fn cmd_validate(case_path: &Path) -> CliResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = load_case(case_path)?;
    println!("✓ Case '{}' is valid", case.name);
    Ok(())
}

#[derive(Serialize)]
struct CellReport<'a> {
    case: &'a str,
    cell: usize,
    alpha: f64,
    phase1: ThermoPropertyPack,
    phase2: ThermoPropertyPack,
}

fn cell_report<'a>(
    case_name: &'a str,
    system: &TwoPhaseSystem,
    cell: usize,
) -> CliResult<CellReport<'a>> {
    if cell >= system.mesh().n_cells() {
        return Err(SimError::InvalidArg {
            what: "cell index outside the mesh",
        }
        .into());
    }
    let x = system
        .activation()
        .map_or(0.0, |a| a.lambda_pow(cell));
    let [phase1, phase2] = system.phases();
    let e1 = phase_energy(system, 0, cell, x);
    let e2 = phase_energy(system, 1, cell, 0.0);
    Ok(CellReport {
        case: case_name,
        cell,
        alpha: system.alpha()[cell],
        phase1: phase1.property_pack(system.rho1()[cell], e1, x, system.t1()[cell])?,
        phase2: phase2.property_pack(system.rho2()[cell], e2, 0.0, system.t2()[cell])?,
    })
}

fn cmd_info(case_path: &Path, cell: usize, yaml: bool) -> CliResult<()> {
    let case = build_case(&load_case(case_path)?)?;
    let system = &case.system;
    let report = cell_report(&case.name, system, cell)?;
    if yaml {
        print!("{}", serde_yaml::to_string(&report)?);
        return Ok(());
    }
    let [phase1, phase2] = system.phases();
    println!("Case: {} ({} cells)", case.name, system.mesh().n_cells());
    println!(
        "  cell {}: alpha={:.4}  p={:.1} Pa  T={:.1} K  c={:.1} m/s",
        cell,
        report.alpha,
        system.p()[cell],
        system.t()[cell],
        system.c()[cell]
    );
    println!("  phase1 {}: {}", phase1.name(), report.phase1.summary());
    println!("  phase2 {}: {}", phase2.name(), report.phase2.summary());
    Ok(())
}

/// Phase energy consistent with the equilibrium pressure.
fn phase_energy(system: &TwoPhaseSystem, phase: usize, cell: usize, x: f64) -> f64 {
    let thermo = &system.phases()[phase];
    let rho = if phase == 0 {
        system.rho1()[cell]
    } else {
        system.rho2()[cell]
    };
    let e = system.e()[cell];
    let pi = thermo.pi(rho, e, x);
    (system.p()[cell] + pi) / ((thermo.gamma(rho, e, x) - 1.0) * rho)
}

fn cmd_run(
    case_path: &Path,
    dt: Option<f64>,
    t_end: Option<f64>,
    output: Option<&Path>,
) -> CliResult<()> {
    let mut case = build_case(&load_case(case_path)?)?;
    if let Some(dt) = dt {
        case.options.dt = dt;
    }
    if let Some(t_end) = t_end {
        case.options.t_end = t_end;
    }
    tracing::info!(
        case = %case.name,
        cells = case.system.mesh().n_cells(),
        dt = case.options.dt,
        t_end = case.options.t_end,
        "starting run"
    );
    println!("Running case: {}", case.name);
    println!(
        "  scheme = {}, flux = {}, dt = {:.3e} s, t_end = {:.3e} s",
        case.scheme.name(),
        case.system.flux_scheme().name(),
        case.options.dt,
        case.options.t_end
    );

    let started = Instant::now();
    let t_end = case.options.t_end;
    let summary = run_sim_with_progress(
        &mut case.system,
        &case.scheme,
        &case.options,
        |progress, _| render_cli_progress(progress, t_end, &started),
    )?;
    clear_progress_line();

    println!(
        "✓ Simulation completed: {} steps to t = {:.3e} s in {:.2} s",
        summary.steps,
        summary.t_final,
        started.elapsed().as_secs_f64()
    );
    println!(
        "  dt range: {:.3e} - {:.3e} s",
        summary.dt_min, summary.dt_max
    );
    let diag = case.system.diagnostics();
    if diag.alpha_clipped + diag.rho_clipped > 0 {
        tracing::warn!(
            alpha_clipped = diag.alpha_clipped,
            rho_clipped = diag.rho_clipped,
            decode_calls = diag.decode_calls,
            "run clipped out-of-range values"
        );
    }

    if let Some(path) = output {
        let csv = fields_csv(&case.system);
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} cells to {}",
            case.system.mesh().n_cells(),
            path.display()
        );
    }
    Ok(())
}

fn fields_csv(system: &TwoPhaseSystem) -> String {
    let mut csv = String::from("x,y,z,alpha,rho1,rho2,rho,p,T,c,lambda,e_source\n");
    let e_source = system.e_source();
    for (i, cell) in system.mesh().cells().iter().enumerate() {
        let lambda = system.lambda().map_or(0.0, |l| l[i]);
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}\n",
            cell.centroid.x,
            cell.centroid.y,
            cell.centroid.z,
            system.alpha()[i],
            system.rho1()[i],
            system.rho2()[i],
            system.rho()[i],
            system.p()[i],
            system.t()[i],
            system.c()[i],
            lambda,
            e_source[i]
        ));
    }
    csv
}

fn cmd_lookup(
    table_path: &Path,
    value: f64,
    f_mod: TableMod,
    x_mod: TableMod,
    reverse: bool,
) -> CliResult<()> {
    let table = LookupTable1D::from_file(table_path, f_mod, x_mod)?;
    if reverse {
        let x = table.reverse_lookup(value)?;
        println!("x = {}", x);
    } else {
        println!("f = {}", table.lookup(value));
        println!("df/dx = {}", table.dfdx(value));
        println!("d2f/dx2 = {}", table.d2fdx2(value));
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(progress: &SimProgress, t_end: f64, started: &Instant) {
    let fraction = if t_end > 0.0 {
        (progress.t / t_end).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let width = 28usize;
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    print!(
        "\r[{}] {:>6.2}%  t={:.3e}/{:.3e}s  step={}  dt={:.2e}  elapsed={:.1}s",
        bar,
        fraction * 100.0,
        progress.t,
        t_end,
        progress.step,
        progress.dt,
        started.elapsed().as_secs_f64()
    );
    let _ = io::stdout().flush();
}
