//! PUMA arm simulator CLI.
//!
//! Provides four modes of operation:
//! - `run`: Run a paced simulation and poll its snapshot like a renderer would
//! - `solve`: Solve inverse kinematics for a single effector pose
//! - `preview`: Print evenly spaced samples of a path without real-time pacing
//! - `info`: Print crate versions and the default run configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nalgebra::Point3;
use puma_core::{PacingMode, PoseConfig, RunConfig};
use puma_ik::{Frame, IkSolver, PumaChain};
use puma_sim::{MotionPlan, RunParams, Simulation, Snapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// 5-DOF PUMA arm motion simulator.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and print its progress.
    Run {
        /// TOML run configuration. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override speed (percent of path per second).
        #[arg(short, long)]
        speed: Option<f32>,

        /// Override the tick period in milliseconds.
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Override the pacing mode (spin or sleep).
        #[arg(long)]
        pacing: Option<PacingMode>,

        /// How often to poll the published snapshot, in milliseconds.
        #[arg(long, default_value_t = 100)]
        poll_ms: u64,
    },

    /// Solve inverse kinematics for one effector pose.
    Solve {
        /// Effector position.
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], required = true, allow_negative_numbers = true)]
        position: Vec<f32>,

        /// Effector rotation as Euler angles in degrees (roll, pitch, yaw).
        #[arg(long, num_args = 3, value_names = ["RX", "RY", "RZ"], allow_negative_numbers = true)]
        euler: Option<Vec<f32>>,

        /// Link lengths l1, l3, l4.
        #[arg(long, num_args = 3, value_names = ["L1", "L3", "L4"], default_values_t = [3.0, 2.0, 1.0])]
        lengths: Vec<f32>,
    },

    /// Print evenly spaced samples of a run's path.
    Preview {
        /// TOML run configuration. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of samples, including both endpoints.
        #[arg(short = 'n', long, default_value_t = 11)]
        frames: usize,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> anyhow::Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn triple(values: &[f32], what: &str) -> anyhow::Result<[f32; 3]> {
    values
        .try_into()
        .with_context(|| format!("{what} needs exactly three values"))
}

fn point(p: &Point3<f32>) -> String {
    format!("({:8.3}, {:8.3}, {:8.3})", p.x, p.y, p.z)
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "t={:<8} progress={:5.1}%  commanded={}  achieved={}  q2=[{:.3}, {:.3}]",
        snapshot.elapsed.to_string(),
        snapshot.progress * 100.0,
        point(&snapshot.commanded_effector()),
        point(&snapshot.achieved_effector()),
        snapshot.q2[0],
        snapshot.q2[1],
    );
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_simulation(
    config: Option<&Path>,
    speed: Option<f32>,
    tick_ms: Option<u64>,
    pacing: Option<PacingMode>,
    poll_ms: u64,
) -> anyhow::Result<()> {
    let mut run_config = load_config(config)?;
    if let Some(speed) = speed {
        run_config = run_config.with_speed(speed);
    }
    if let Some(tick_ms) = tick_ms {
        run_config = run_config.with_tick_ms(tick_ms);
    }
    if let Some(pacing) = pacing {
        run_config = run_config.with_pacing(pacing);
    }

    let sim = Simulation::start(&run_config)?;
    let poll = Duration::from_millis(poll_ms.max(1));
    while !sim.is_completed() {
        std::thread::sleep(poll);
        print_snapshot(&sim.snapshot());
    }

    let last = sim.snapshot();
    let stats = sim.wait()?;
    println!();
    println!("commanded F5: {}", point(&last.commanded_effector()));
    println!("achieved F5:  {}", point(&last.achieved_effector()));
    println!(
        "ticks={}, mean interval={:?}, max debt={:?}",
        stats.ticks,
        stats.mean_interval().unwrap_or_default(),
        stats.max_debt()
    );
    Ok(())
}

fn run_solve(position: &[f32], euler: Option<&[f32]>, lengths: &[f32]) -> anyhow::Result<()> {
    let mut pose = PoseConfig::at(triple(position, "--position")?);
    if let Some(euler) = euler {
        pose = pose.with_euler_degrees(triple(euler, "--euler")?);
    }
    let lengths = triple(lengths, "--lengths")?;
    RunConfig::default().with_lengths(lengths).validate()?;

    let target = Frame::from_isometry(&pose.to_isometry()?);
    let chain = PumaChain::new(lengths.into());
    let solution = IkSolver::with_defaults().solve(&chain, &target, None);

    println!("joints:");
    for (i, p) in solution.joints.as_array().iter().enumerate() {
        println!("  p{} {}", i + 1, point(p));
    }
    println!("configuration:");
    for (i, angle) in solution.config.angles().iter().enumerate() {
        println!("  alpha{} {:9.3} deg", i + 1, angle.to_degrees());
    }
    println!("  q2     {:9.3}", solution.config.q2);
    println!("effector: {}", point(&solution.effector().origin()));
    Ok(())
}

fn run_preview(config: Option<&Path>, frames: usize) -> anyhow::Result<()> {
    let run_config = load_config(config)?;
    let plan = MotionPlan::new(RunParams::from_config(&run_config)?);
    for snapshot in plan.sample(frames) {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn run_info() -> anyhow::Result<()> {
    println!("puma v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  puma-core {}", env!("CARGO_PKG_VERSION"));
    println!("  puma-ik   {}", env!("CARGO_PKG_VERSION"));
    println!("  puma-sim  {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("default configuration:");
    print!("{}", toml::to_string(&RunConfig::default())?);
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("puma=info".parse()?)
                .add_directive("puma_sim=info".parse()?)
                .add_directive("puma_ik=info".parse()?)
                .add_directive("warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            config,
            speed,
            tick_ms,
            pacing,
            poll_ms,
        }) => run_simulation(config.as_deref(), speed, tick_ms, pacing, poll_ms),
        Some(Commands::Solve {
            position,
            euler,
            lengths,
        }) => run_solve(&position, euler.as_deref(), &lengths),
        Some(Commands::Preview { config, frames }) => run_preview(config.as_deref(), frames),
        Some(Commands::Info) => run_info(),
        None => {
            // Default: the reference run.
            info!("no command given, running the default configuration");
            run_simulation(None, None, None, None, 100)
        }
    }
}
