//! Daemon wiring: config → monitors → supervisor → ctrl-c → drain.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::{error, info, warn};

use cachet_api::{CachetClient, HttpTransport, StatusPage};
use cachet_core::{CachetConfig, MonitorConfig};
use cachet_health::{Monitor, Supervisor};

/// Run until ctrl-c, then stop every monitor and wait for them to drain.
pub async fn run(config_path: &Path, immediate: bool) -> anyhow::Result<()> {
    info!(path = %config_path.display(), "cachetd starting");

    let config = CachetConfig::from_file(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let api_errs = config.api.validate();
    if !api_errs.is_empty() {
        for e in &api_errs {
            error!(error = %e, "invalid api configuration");
        }
        bail!("invalid api configuration ({} errors)", api_errs.len());
    }

    let transport = HttpTransport::new().context("failed to build http transport")?;
    let client = CachetClient::new(&config.api, transport.clone());
    if let Err(e) = client.ping().await {
        warn!(url = %config.api.url, error = %e, "status page did not answer ping");
    }
    let api: Arc<dyn StatusPage> = Arc::new(client);

    let mut supervisor = Supervisor::new(immediate || config.immediate);
    for mut monitor in build_monitors(config.monitors, &api, &transport) {
        if let Err(e) = monitor.init().await {
            error!(monitor = %monitor.name(), error = %e, "failed to initialize monitor, skipping");
            continue;
        }
        for line in monitor.describe() {
            info!(monitor = %monitor.name(), "{line}");
        }
        supervisor.start(monitor);
    }

    if supervisor.is_empty() {
        bail!("no valid monitors to run");
    }
    info!(count = supervisor.len(), "monitors started");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown signal received");

    supervisor.stop();
    supervisor.join().await;

    info!("cachetd stopped");
    Ok(())
}

/// Validate every configured monitor, logging and dropping invalid ones.
pub fn build_monitors(
    configs: Vec<MonitorConfig>,
    api: &Arc<dyn StatusPage>,
    transport: &HttpTransport,
) -> Vec<Monitor> {
    let mut monitors = Vec::with_capacity(configs.len());
    for (index, config) in configs.into_iter().enumerate() {
        let name = config.name.clone();
        match Monitor::new(config, Arc::clone(api), transport) {
            Ok(monitor) => monitors.push(monitor),
            Err(errs) => {
                for e in errs {
                    error!(monitor = %name, index, error = %e, "invalid monitor configuration");
                }
            }
        }
    }
    monitors
}
