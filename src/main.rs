//! Vessel Watch - Main Entry Point

use anyhow::Context;
use tokio::sync::watch;

use vessel_watch::constants::{APP_NAME, APP_VERSION};
use vessel_watch::{MarineTrafficClient, MonitorConfig, MonitorLoop, SentinelHubClient};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let config = MonitorConfig::from_env().context("failed to load configuration")?;

    log::info!("   Telemetry: {}", config.telemetry.base_url);
    log::info!("   Imagery: {}", config.imagery.base_url);
    log::info!("   Poll interval: {}s", config.poll_interval.as_secs());
    log::info!(
        "   Contamination: {} ({} trees)",
        config.detector.contamination,
        config.detector.n_trees
    );

    let telemetry = MarineTrafficClient::new(config.telemetry.clone())
        .context("failed to create telemetry client")?;
    let imagery = SentinelHubClient::new(config.imagery.clone())
        .context("failed to create imagery client")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Shutdown requested, stopping at the next cycle boundary");
                let _ = shutdown_tx.send(true);
            }
        });

        let mut monitor = MonitorLoop::new(&config, telemetry, imagery);
        monitor.run(shutdown_rx).await;
    });

    Ok(())
}
