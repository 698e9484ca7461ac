//! spider-sim - headless surface-adaptive locomotion runner.
//!
//! - `spider-sim run` - tick a scenario and print a summary
//! - `spider-sim check` - validate a scenario without running it
//! - `spider-sim init` - write the default scenario

mod scenario;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use spider_core::glam::Vec3;
use spider_core::{Placement, SpiderLocomotion, TickContext};
use spider_tools::{JsonLinesSink, NullTraceSink, TickTrace, TraceLog, TraceSink};

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "spider-sim")]
#[command(about = "Headless surface-adaptive locomotion runner", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario
    Run {
        /// Scenario file (YAML)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the scenario's tick count
        #[arg(long)]
        ticks: Option<u64>,

        /// Override the scenario's time step, in seconds
        #[arg(long)]
        dt: Option<f32>,

        /// Write one JSON record per tick to this file
        #[arg(long)]
        trace: Option<PathBuf>,
    },

    /// Validate a scenario and print what it contains
    Check {
        /// Scenario file (YAML)
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Write the default scenario
    Init {
        /// Output path
        #[arg(long, default_value = "scenario.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            dt,
            trace,
        } => run_scenario(&scenario, ticks, dt, trace.as_deref()),
        Commands::Check { scenario } => check_scenario(&scenario),
        Commands::Init { path, force } => init_scenario(&path, force),
    }
}

fn run_scenario(
    path: &Path,
    ticks: Option<u64>,
    dt: Option<f32>,
    trace: Option<&Path>,
) -> Result<()> {
    let mut scenario = Scenario::load(path)?;
    if let Some(ticks) = ticks {
        scenario.ticks = ticks;
    }
    if let Some(dt) = dt {
        scenario.dt_seconds = dt;
    }
    scenario.validate()?;

    let mut sink: Box<dyn TraceSink> = match trace {
        Some(out) => {
            let file = File::create(out)
                .with_context(|| format!("Failed to create trace file {}", out.display()))?;
            Box::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Box::new(NullTraceSink),
    };

    let world = Arc::new(scenario.build_world()?);
    let mut body = scenario.spawn_body(Arc::clone(&world));
    let mut spider = SpiderLocomotion::new(scenario.config.clone())?;

    tracing::info!(
        scenario = %path.display(),
        ticks = scenario.ticks,
        dt = scenario.dt_seconds,
        panels = world.panels.len(),
        "Starting run"
    );

    let mut log = TraceLog::default();
    let mut ctx = TickContext::new(0, scenario.dt_seconds);
    for _ in 0..scenario.ticks {
        let report = spider.tick(&ctx, scenario.intent, &world, &mut body);
        let record = TickTrace::from(&report);
        sink.emit(&record).context("Failed to write trace record")?;
        log.push(record);
        ctx = ctx.next();
    }
    sink.flush().context("Failed to flush trace")?;

    print_summary(&log, body.location(), body.orientation() * Vec3::Z);
    if let Some(out) = trace {
        println!();
        println!("Trace written to {}", out.display());
    }
    Ok(())
}

fn print_summary(log: &TraceLog, location: Vec3, up: Vec3) {
    println!("Run summary");
    println!("===========");
    println!();
    println!("Ticks: {}", log.len());
    for (mode, count) in log.mode_counts() {
        println!("  {mode:<9} {count}");
    }
    println!();

    let transitions = log.transitions();
    println!("Mode transitions: {}", transitions.len());
    for transition in transitions.iter().take(10) {
        println!(
            "  tick {:>5}: {} -> {}",
            transition.tick, transition.from, transition.to
        );
    }
    if transitions.len() > 10 {
        println!("  ... and {} more", transitions.len() - 10);
    }
    println!();

    if let Some(last) = log.last() {
        println!("Final mode: {}", last.mode);
    }
    println!(
        "Final location: ({:.1}, {:.1}, {:.1})",
        location.x, location.y, location.z
    );
    println!("Final up: ({:.3}, {:.3}, {:.3})", up.x, up.y, up.z);
}

fn check_scenario(path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    scenario.validate()?;

    let config = &scenario.config;
    println!("Scenario: {}", path.display());
    println!();
    println!("Ticks: {} at {:.4}s", scenario.ticks, scenario.dt_seconds);
    println!(
        "Probe: capsule r={} h={} offset={}, ray offset={} span={}",
        config.probe_radius,
        config.probe_half_height,
        config.wall_trace_start_offset,
        config.ground_trace_forward_offset,
        config.ground_trace_distance
    );
    println!(
        "Motion: gravity={} climb_pull={} turn_rate={} max_speed={}",
        config.gravity_factor, config.climb_pull, config.turn_rate, config.max_speed
    );
    println!(
        "Intent: forward={} right={}",
        scenario.intent.forward, scenario.intent.right
    );
    println!("Panels: {}", scenario.panels.len());
    for panel in &scenario.panels {
        println!(
            "  #{} center=({}, {}, {}) normal=({}, {}, {})",
            panel.id,
            panel.center.x,
            panel.center.y,
            panel.center.z,
            panel.normal.x,
            panel.normal.y,
            panel.normal.z
        );
    }
    println!();
    println!("OK");
    Ok(())
}

fn init_scenario(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let body = Scenario::default().to_yaml()?;
    let content = format!(
        "# spider-sim scenario\n#\n\
         # Units are arbitrary but consistent (defaults assume centimetres).\n\n{body}"
    );
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write scenario to {}", path.display()))?;

    println!("Wrote default scenario to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit panels, spawn and intent");
    println!("  2. Run: spider-sim run --scenario {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_check_and_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        let trace = dir.path().join("trace.jsonl");

        init_scenario(&path, false).unwrap();
        assert!(init_scenario(&path, false).is_err());
        init_scenario(&path, true).unwrap();

        check_scenario(&path).unwrap();
        run_scenario(&path, Some(30), None, Some(&trace)).unwrap();

        let file = std::io::BufReader::new(File::open(&trace).unwrap());
        let log = TraceLog::read_json_lines(file).unwrap();
        assert_eq!(log.len(), 30);
        assert_eq!(log.traces[29].tick, 29);
    }

    #[test]
    fn negative_dt_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        init_scenario(&path, false).unwrap();
        assert!(run_scenario(&path, Some(1), Some(-1.0), None).is_err());
    }
}
