//! coreplugd — adaptive CPU core-count control for Linux.
//!
//! Assembles the controller from its parts: sysfs actuator and
//! frequency capper, /proc/stat load source, threshold policy, and
//! the periodic control loop. Suspend/resume lifecycle transitions
//! arrive as signals from whatever watches display power state:
//! SIGUSR1 suspends (all cores offline but one, frequency capped),
//! SIGUSR2 resumes (all cores online, caps lifted).
//!
//! # Usage
//!
//! ```text
//! coreplugd run --config /etc/coreplug.toml
//! ```

mod config;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU32;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use coreplug_control::{
    ConfigSurface, Controller, ControllerConfig, Governor, DEFAULT_SUSPEND_FREQ_KHZ,
};
use coreplug_policy::ThresholdPolicy;
use coreplug_sysfs::{present_cores, CpufreqCapper, ProcStatLoadSource, SysfsCoreActuator};

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "coreplugd", about = "Adaptive CPU core-count controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the control loop.
    Run {
        /// Path to the TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coreplugd=debug,coreplug_control=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { config } => {
            let config = match config {
                Some(path) => DaemonConfig::load(&path)?,
                None => DaemonConfig::default(),
            };
            run(config).await
        }
    }
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    // Initialization is fail-closed: any error here aborts before a
    // control loop exists, never leaving one half-wired.
    let cpu_root = Path::new(&config.cpu_root);
    let cores = present_cores(cpu_root).context("failed to discover CPU topology")?;
    info!(cores = cores.len(), "CPU topology discovered");

    let actuator = Arc::new(SysfsCoreActuator::with_root(cpu_root));
    let capper = Arc::new(CpufreqCapper::with_root(cpu_root));
    let load = Arc::new(ProcStatLoadSource::with_path(&config.proc_stat));

    let thresholds = Arc::new(RwLock::new(ThresholdPolicy::default()));
    let suspend_freq = Arc::new(AtomicU32::new(DEFAULT_SUSPEND_FREQ_KHZ));

    let surface = ConfigSurface::new(
        thresholds.clone(),
        suspend_freq.clone(),
        capper.clone(),
        cores[0],
    );
    if let Some(ref levels) = config.levels {
        surface
            .set_levels(levels)
            .context("invalid threshold levels in config")?;
    }
    if let Some(khz) = config.suspend_frequency_khz {
        surface
            .set_suspend_frequency(khz)
            .context("invalid suspend frequency in config")?;
    }
    info!(
        version = surface.version(),
        levels = ?surface.levels(),
        suspend_frequency_khz = surface.suspend_frequency(),
        "configuration applied"
    );

    let governor = Governor::new(
        cores,
        thresholds,
        suspend_freq,
        actuator,
        capper,
        load,
    )?;

    let mut controller = Controller::new(
        governor,
        ControllerConfig {
            tick_period: Duration::from_millis(config.tick_period_ms),
            startup_delay: Duration::from_millis(config.startup_delay_ms),
        },
    );
    controller.start();

    let mut suspend_signal =
        signal(SignalKind::user_defined1()).context("failed to install SIGUSR1 handler")?;
    let mut resume_signal =
        signal(SignalKind::user_defined2()).context("failed to install SIGUSR2 handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    loop {
        tokio::select! {
            _ = suspend_signal.recv() => {
                info!("suspend requested");
                controller.suspend().await;
            }
            _ = resume_signal.recv() => {
                info!("resume requested");
                controller.resume().await;
            }
            _ = terminate.recv() => {
                info!("SIGTERM received, shutting down");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}
