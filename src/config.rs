// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::grafana::{Credentials, RetryPolicy};
use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Command line flags, each with an environment fallback
#[derive(Parser, Debug, Clone)]
#[command(name = "grafana-config-controller", version, about = "Syncs annotated ConfigMaps to Grafana")]
pub struct Args {
    /// Grafana base URL, e.g. http://grafana.monitoring:3000
    #[arg(long, env = "GRAFANA_URL")]
    pub grafana_url: String,

    /// Grafana instance id this controller owns
    #[arg(long, env = "GRAFANA_ID", default_value_t = 0)]
    pub id: i64,

    /// Namespace to watch (default: all namespaces)
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Seconds to wait before retrying a refused connection
    #[arg(long, env = "GRAFANA_RETRY_INTERVAL_SECS", default_value_t = crate::constants::retry::INTERVAL_SECS)]
    pub retry_interval_secs: u64,

    /// Give up after this many attempts (default: retry forever)
    #[arg(long, env = "GRAFANA_RETRY_MAX_ATTEMPTS")]
    pub retry_max_attempts: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, env = "GRAFANA_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Controller configuration resolved from flags and environment
#[derive(Clone)]
pub struct Config {
    pub grafana_url: Url,
    pub instance_id: i64,
    pub namespace: Option<String>,
    pub credentials: Credentials,
    /// Password for the monitoring user; `None` skips provisioning it
    pub monitoring_password: Option<String>,
    pub retry: RetryPolicy,
    pub request_timeout: Option<Duration>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the command line and environment variables
    pub fn load() -> Result<Self> {
        Self::from_parts(Args::parse(), |key| env::var(key).ok())
    }

    /// Resolve parsed flags, reading secrets through `lookup`
    pub fn from_parts(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let grafana_url = Url::parse(&args.grafana_url)
            .with_context(|| format!("Invalid Grafana URL: {}", args.grafana_url))?;
        if grafana_url.cannot_be_a_base() {
            anyhow::bail!("Grafana URL cannot be used as a base URL: {}", grafana_url);
        }

        let secret = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let credentials = match (secret("GRAFANA_BEARER_TOKEN"), secret("GRAFANA_USER")) {
            (Some(token), _) => Credentials::Bearer(token),
            (None, Some(user)) => Credentials::Basic {
                user,
                password: lookup("GRAFANA_PASSWORD").unwrap_or_default(),
            },
            (None, None) => Credentials::None,
        };

        let mut retry = RetryPolicy::fixed(Duration::from_secs(args.retry_interval_secs));
        if let Some(max) = args.retry_max_attempts {
            retry = retry.with_max_attempts(max);
        }

        Ok(Config {
            grafana_url,
            instance_id: args.id,
            namespace: args.namespace.filter(|ns| !ns.is_empty()),
            credentials,
            monitoring_password: secret("MONITORING_PASSWORD"),
            retry,
            request_timeout: args.request_timeout_secs.map(Duration::from_secs),
            log_level: args.log_level,
        })
    }
}

// Keeps secrets out of the startup log
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match &self.credentials {
            Credentials::None => "none",
            Credentials::Bearer(_) => "bearer",
            Credentials::Basic { .. } => "basic",
        };
        f.debug_struct("Config")
            .field("grafana_url", &self.grafana_url.as_str())
            .field("instance_id", &self.instance_id)
            .field("namespace", &self.namespace)
            .field("auth", &auth)
            .field("monitoring_user", &self.monitoring_password.is_some())
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}
