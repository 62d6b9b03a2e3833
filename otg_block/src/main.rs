//! # OTG Block
//!
//! Standalone runner for the trajectory generator block. Loads a block TOML,
//! starts the generator, and drives it once per sample period against an
//! ideal plant (feedback equals the previous command) toward the `[plant]`
//! target.
//!
//! `--export` prints the code-generation descriptor as JSON and exits.

use clap::Parser;
use otg_block::config::{LoadedConfig, load_config};
use otg_block::cycle::rt_setup;
use otg_block::export::ExportDescriptor;
use otg_block::plant::standalone_runner;
use otg_common::config::LogLevel;
use otg_common::consts::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// OTG Block: fixed-period jerk-limited trajectory generation
#[derive(Parser, Debug)]
#[command(name = "otg_block")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fixed-period online trajectory generator block")]
struct Args {
    /// Path to the block configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of cycles to run (0 = until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// Stop as soon as the generator reports the target reached.
    #[arg(long)]
    stop_on_finish: bool,

    /// Print the export descriptor as JSON and exit.
    #[arg(long)]
    export: bool,

    /// CPU core to pin the cycle thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = load_config(&args.config);
    let log_level = loaded
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("OTG Block v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("OTG Block shutdown complete");
}

fn run(args: &Args, loaded: LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let generator = loaded.generator;
    info!(
        "Config OK: service={}, dofs={}, sample_period={}s, check_mode={:?}",
        loaded.shared.service_name, generator.dofs, generator.sample_period, loaded.check_mode,
    );

    if args.export {
        let descriptor = ExportDescriptor::describe(&generator, &loaded.limits);
        println!("{}", descriptor.to_json()?);
        return Ok(());
    }

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut runner = standalone_runner(&loaded)?.stop_when_finished(args.stop_on_finish);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let max_cycles = (args.cycles > 0).then_some(args.cycles);
    let stats = runner.run(max_cycles, &running)?;

    let plant = runner.io();
    match plant.finished_at() {
        Some(cycle) => info!(
            "Target reached at cycle {cycle} ({:.3}s)",
            cycle as f64 * generator.sample_period
        ),
        None => info!("Target not reached after {} cycles", stats.cycle_count),
    }
    info!("Final position: {:?}", plant.state().position.as_slice());
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the config log level.
///
/// `RUST_LOG` wins over both when set.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
