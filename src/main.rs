//! CLI for gpu-inst-count: replay, demo.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gpu_inst_count::{
    create_demo_capture, create_demo_capture_seeded, replay, Capture, InstCountConfig,
    InstCountControl, InstCountWriter, InstrumentationToggle, Profiler,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gpu-inst-count")]
#[command(about = "GPU instruction and SIMD active lane counts per basic block")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct CollectionArgs {
    /// Disable SIMD active lanes collection
    #[arg(long)]
    disable_simd: bool,
    /// Collect data with tile granularity
    #[arg(long)]
    per_tile_collection: bool,
    /// Kernel run to profile (repeatable; default: every run)
    #[arg(long = "kernel-run")]
    kernel_run: Vec<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report on a recorded counter capture (JSON)
    Replay {
        #[command(flatten)]
        collection: CollectionArgs,
        capture: PathBuf,
    },

    /// Report on a synthetic capture
    Demo {
        #[command(flatten)]
        collection: CollectionArgs,
        #[arg(long)]
        seed: Option<u64>,
        /// Also save the synthetic capture to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay {
            collection,
            capture,
        } => run_replay(&collection, &capture)?,
        Commands::Demo {
            collection,
            seed,
            save,
        } => run_demo(&collection, seed, save.as_deref())?,
    }
    Ok(())
}

/// Environment config with command-line flags on top.
fn load_config(args: &CollectionArgs) -> Result<InstCountConfig> {
    let mut config = InstCountConfig::from_env().context("reading GIC_* configuration")?;
    if args.disable_simd {
        config.disable_simd = true;
    }
    if args.per_tile_collection {
        config.per_tile_collection = true;
    }
    if !args.kernel_run.is_empty() {
        config.kernel_runs = args.kernel_run.clone();
    }
    Ok(config)
}

fn run_replay(args: &CollectionArgs, path: &Path) -> Result<()> {
    info!("Loading capture from {:?}...", path);
    let capture = Capture::from_file(path)
        .with_context(|| format!("failed to load capture {}", path.display()))?;
    report_capture(load_config(args)?, &capture)
}

fn run_demo(args: &CollectionArgs, seed: Option<u64>, save: Option<&Path>) -> Result<()> {
    info!("Creating demo capture...");
    let capture = match seed {
        Some(seed) => create_demo_capture_seeded(seed),
        None => create_demo_capture(),
    };
    if let Some(path) = save {
        capture.save(path)?;
        info!("Saved demo capture to {:?}", path);
    }
    report_capture(load_config(args)?, &capture)
}

fn report_capture(config: InstCountConfig, capture: &Capture) -> Result<()> {
    let profiler = Profiler::new(
        Box::new(InstCountWriter::new()),
        Box::new(InstCountControl::new(config)),
        InstrumentationToggle::in_process(),
    );
    if let Err(e) = profiler.start() {
        warn!("continuing without instrumentation: {}", e);
    }
    let summary = replay(capture, &profiler)?;
    info!(
        "Replayed {} kernel(s): {} invocation(s) profiled, {} skipped",
        summary.kernels_instrumented, summary.invocations_profiled, summary.invocations_skipped
    );
    if let Err(e) = profiler.stop() {
        warn!("{}", e);
    }
    Ok(())
}
