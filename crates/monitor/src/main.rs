//! Container Monitor - threshold alerting for running Docker containers
//!
//! Polls the Docker daemon, prints per-container CPU and memory usage and
//! sends webhook alerts when thresholds are exceeded.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use monitor_lib::alert::build_sinks;
use monitor_lib::{
    supervise, AlertDispatcher, ContainerRuntime, DockerRuntime, SamplingLoop, StructuredLogger,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "container-monitor",
    version,
    about = "Threshold alerting for running Docker containers"
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); optional
    #[arg(short, long, env = "MONITOR_CONFIG_FILE", default_value = "monitor.toml")]
    config: PathBuf,

    /// Run a single sampling cycle and exit
    #[arg(long)]
    once: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Do not print per-container lines to stdout
    #[arg(long)]
    no_console: bool,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!("Starting container-monitor");

    // Load configuration
    let config = config::MonitorConfig::load(&cli.config)?;

    let runtime = DockerRuntime::connect(config.docker_url.as_deref(), config.request_timeout())
        .context("Failed to create Docker client")?;
    info!(docker = %runtime.endpoint(), sinks = config.sinks.len(), "Monitor configured");

    let sinks = build_sinks(&config.sinks, config.request_timeout())
        .context("Failed to configure notification sinks")?;

    let logger = StructuredLogger::new(runtime.endpoint());
    let dispatcher = AlertDispatcher::new(sinks).with_logger(logger.clone());

    let mut sampler = SamplingLoop::new(
        Arc::new(runtime) as Arc<dyn ContainerRuntime>,
        dispatcher.clone(),
        config.sampler_config(!cli.no_console),
        logger.clone(),
    );

    sampler.announce_startup(MONITOR_VERSION).await;

    if cli.once {
        let report = sampler.run_cycle().await;
        info!(
            containers = report.containers_seen,
            errors = report.failed,
            alerts_sent = report.alerts_sent,
            "Single cycle complete"
        );
        return Ok(());
    }

    let handle = tokio::spawn(sampler.run());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    let code = supervise(handle, shutdown, &dispatcher, &logger).await;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
