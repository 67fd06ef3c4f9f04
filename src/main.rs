// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use grafana_config_controller::bootstrap::create_monitoring_user;
use grafana_config_controller::config::Config;
use grafana_config_controller::grafana::{GrafanaClient, ReqwestTransport};
use grafana_config_controller::kubernetes::ConfigMapWatcher;
use grafana_config_controller::reconcilers::BundleReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing, RUST_LOG takes precedence over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Grafana config controller");
    info!("Configuration loaded: {:?}", config);

    let transport = ReqwestTransport::new(config.request_timeout)
        .context("Failed to build HTTP client for Grafana")?;
    let grafana = GrafanaClient::new(config.grafana_url.clone(), transport)
        .with_credentials(config.credentials.clone())
        .with_retry_policy(config.retry);
    info!("Using Grafana API at {}", grafana.base_url());

    if let Some(password) = &config.monitoring_password {
        create_monitoring_user(&grafana, password, config.retry).await;
    }

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let reconciler = BundleReconciler::new(grafana, config.instance_id);
    let watcher = ConfigMapWatcher::new(client, config.namespace.clone(), reconciler);

    tokio::select! {
        result = watcher.run() => {
            // This should never be reached as the watcher runs forever
            warn!("ConfigMap watcher stopped unexpectedly");
            result?;
        }
        _ = shutdown_signal() => {
            info!("Shutting down...");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
