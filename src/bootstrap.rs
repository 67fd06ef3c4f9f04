// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One-shot provisioning of the read-only monitoring user

use crate::constants::monitoring_user::{LOGIN, NAME, ROLE};
use crate::error::Result;
use crate::grafana::{GrafanaClient, RetryPolicy};
use serde_json::json;
use tokio::time::sleep;
use tracing::{error, info};

/// Create the monitoring user with the given password.
///
/// Timeouts are retried according to `retry`. Any other failure is logged and
/// the controller carries on without the user.
pub async fn create_monitoring_user(client: &GrafanaClient, password: &str, retry: RetryPolicy) {
    info!("Creating monitoring user...");

    match create_with_retry(client, password, retry).await {
        Ok(()) => info!("Succeeded: Created monitoring user"),
        Err(e) => error!(error = %e, "Failed to create monitoring user"),
    }
}

async fn create_with_retry(client: &GrafanaClient, password: &str, retry: RetryPolicy) -> Result<()> {
    let user = json!({
        "name": NAME,
        "login": LOGIN,
        "password": password,
        "role": ROLE,
    })
    .to_string();

    let mut attempt = 1;
    loop {
        match client.create_user(&user).await {
            Err(e) if e.is_timeout() => {
                let Some(delay) = retry.next_delay(attempt) else {
                    return Err(e);
                };
                error!("{}", e);
                info!(
                    "Perhaps Grafana is not ready. Waiting for {} seconds and retry again...",
                    delay.as_secs()
                );
                sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
