//! Incubator monitor - environmental alerting for a smart egg incubator
//!
//! Runs the simulated sensor feed and the alert monitor loop, and serves
//! alerts, health and metrics over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use incubator_monitor::{api, config::AppConfig};
use monitor_lib::{
    health::HealthRegistry,
    observability::{LoggingHook, MonitorMetrics, StructuredLogger},
    AlertMonitor, MonitorHandle, MonitorLoopBuilder, SimulatedSource,
};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = AppConfig::load()?;
    info!(
        device = %config.device_name,
        evaluation_interval_secs = config.evaluation_interval_secs,
        "Monitor configured"
    );

    let health_registry = HealthRegistry::for_monitor().await;
    let metrics = MonitorMetrics::new(&config.device_name).context("Failed to register metrics")?;
    let logger = StructuredLogger::new(&config.device_name);

    let hook = Arc::new(LoggingHook::new(logger.clone(), metrics.clone()));
    let monitor = AlertMonitor::new(config.monitor_config(), hook)
        .context("Invalid alert thresholds")?;
    let handle = MonitorHandle::new(monitor);

    let source = SimulatedSource::new(config.simulation.seed)
        .with_critical_probability(config.simulation.critical_probability);

    let monitor_loop = MonitorLoopBuilder::new()
        .source(Arc::new(source))
        .handle(handle.clone())
        .interval(config.evaluation_interval())
        .readings_per_tick(config.readings_per_tick)
        .failure_threshold(config.failure_threshold)
        .metrics(metrics.clone())
        .logger(logger.clone())
        .health(health_registry.clone())
        .build()?;

    logger.log_startup(MONITOR_VERSION);

    let (shutdown_tx, _) = broadcast::channel(1);
    let app_state = Arc::new(api::AppState::new(handle, health_registry, metrics));

    let loop_handle = tokio::spawn(monitor_loop.run(shutdown_tx.subscribe()));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state, shutdown_tx.subscribe()));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    let _ = shutdown_tx.send(());

    loop_handle.await?;
    if let Err(e) = api_handle.await? {
        error!(error = %e, "API server exited with error");
    }

    info!("Shutdown complete");
    Ok(())
}
