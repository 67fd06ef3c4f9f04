// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bundle reconciler - converges Grafana on ConfigMap create/update/delete events.
//!
//! Every event is handled on its own, using only the event payload and a fresh
//! read of Grafana. Failures are logged per data key and never propagated, so
//! one bad entry does not stop the others.

use crate::classify::classify;
use crate::constants::{annotations, ROOT_FOLDER_ID};
use crate::error::{ControllerError, Result};
use crate::grafana::GrafanaClient;
use crate::resolve::{lookup_uid, resolve_id, FolderResolver};
use crate::types::{ConfigBundle, DashboardPayload, Record, ResourceKind};
use tracing::{debug, error, info, instrument, warn};

/// Whether dashboard folder resolution may create a missing folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolderMode {
    Create,
    Lookup,
}

#[derive(Clone)]
pub struct BundleReconciler {
    client: GrafanaClient,
    instance_id: i64,
}

impl BundleReconciler {
    pub fn new(client: GrafanaClient, instance_id: i64) -> Self {
        Self {
            client,
            instance_id,
        }
    }

    #[instrument(skip_all, fields(configmap = %bundle.name, namespace = %bundle.namespace))]
    pub async fn on_create(&self, bundle: &ConfigBundle) {
        let Some(kind) = self.actionable_kind(bundle) else {
            return;
        };

        for (key, content) in &bundle.data {
            info!(key = %key, "Creating {}: {}", kind, key);
            let result = self.create_entry(kind, bundle, content).await;
            report("create", "Created", kind, key, &result);
        }
    }

    #[instrument(skip_all, fields(configmap = %new.name, namespace = %new.namespace))]
    pub async fn on_update(&self, old: &ConfigBundle, new: &ConfigBundle) {
        if old.is_equivalent(new) {
            debug!("Skipping automatically updated configmap: {}", new.name);
            return;
        }

        let classification = classify(new, self.instance_id);
        if !new.is_annotated() || !classification.owned {
            debug!("Skipping configmap: {}", new.name);
            return;
        }
        let kind = match classification.actionable_kind() {
            Ok(kind) => kind,
            Err(e) => {
                warn!("Skipping configmap {}: {}", new.name, e);
                return;
            }
        };

        match kind {
            Some(kind @ (ResourceKind::Datasource | ResourceKind::NotificationChannel)) => {
                for (key, content) in &new.data {
                    info!(key = %key, "Updating {}: {}", kind, key);
                    match self.update_entry(kind, content).await {
                        Err(e) if e.is_not_found() => {
                            info!(key = %key, "{}, trying to create {}: {}", e, kind, key);
                            let result = self.create_entry(kind, new, content).await;
                            report("create", "Created", kind, key, &result);
                        }
                        result => report("update", "Updated", kind, key, &result),
                    }
                }
            }
            // Dashboard ids are not stable across edits, so replace the whole set.
            // A cleared kind flag only removes what the old version created.
            _ => {
                self.on_delete(old).await;
                self.on_create(new).await;
            }
        }
    }

    #[instrument(skip_all, fields(configmap = %bundle.name, namespace = %bundle.namespace))]
    pub async fn on_delete(&self, bundle: &ConfigBundle) {
        let Some(kind) = self.actionable_kind(bundle) else {
            return;
        };

        for (key, content) in &bundle.data {
            info!(key = %key, "Deleting {}: {}", kind, key);
            let result = self.delete_entry(kind, bundle, content).await;
            report("delete", "Deleted", kind, key, &result);
        }
    }

    /// The resource kind to act on, or `None` when the bundle is not ours
    fn actionable_kind(&self, bundle: &ConfigBundle) -> Option<ResourceKind> {
        match classify(bundle, self.instance_id).actionable_kind() {
            Ok(Some(kind)) => Some(kind),
            Ok(None) => {
                debug!("Skipping configmap: {}", bundle.name);
                None
            }
            Err(e) => {
                warn!("Skipping configmap {}: {}", bundle.name, e);
                None
            }
        }
    }

    async fn create_entry(
        &self,
        kind: ResourceKind,
        bundle: &ConfigBundle,
        content: &str,
    ) -> Result<()> {
        match kind {
            ResourceKind::Dashboard => {
                let dashboard = self
                    .dashboard_payload(bundle, content, FolderMode::Create)
                    .await?;
                self.client.create_dashboard(&dashboard).await
            }
            ResourceKind::Datasource => {
                Record::from_json(content)?;
                self.client.create_datasource(content).await
            }
            ResourceKind::NotificationChannel => {
                Record::from_json(content)?;
                self.client.create_notification_channel(content).await
            }
            ResourceKind::Folder => Err(unmanaged_folder()),
        }
    }

    /// Update in place. Returns a not-found error when there is nothing to update.
    async fn update_entry(&self, kind: ResourceKind, content: &str) -> Result<()> {
        let candidate = Record::from_json(content)?;
        let existing = match kind {
            ResourceKind::Datasource => self.client.search_datasources().await?,
            ResourceKind::NotificationChannel => {
                self.client.search_notification_channels().await?
            }
            ResourceKind::Dashboard | ResourceKind::Folder => {
                return Err(ControllerError::InvalidPayload(format!(
                    "{} cannot be updated in place",
                    kind
                )))
            }
        };

        let resolved = resolve_id(candidate, &existing);
        let Some(id) = resolved.resolved_id() else {
            return Err(ControllerError::not_found(kind, resolved.identity()));
        };

        match kind {
            ResourceKind::Datasource => self.client.update_datasource(id, &resolved).await,
            _ => self.client.update_notification_channel(id, &resolved).await,
        }
    }

    async fn delete_entry(
        &self,
        kind: ResourceKind,
        bundle: &ConfigBundle,
        content: &str,
    ) -> Result<()> {
        match kind {
            ResourceKind::Dashboard => {
                let dashboard = self
                    .dashboard_payload(bundle, content, FolderMode::Lookup)
                    .await?;
                let dashboards = self.client.search_dashboards().await?;
                let uid = lookup_uid(&dashboards, &dashboard).ok_or_else(|| {
                    ControllerError::not_found(
                        ResourceKind::Dashboard,
                        dashboard.title().unwrap_or("<untitled>"),
                    )
                })?;
                debug!(uid = %uid, "Resolved dashboard uid");
                self.client.delete_dashboard(&uid).await
            }
            ResourceKind::Datasource => {
                let datasource = Record::from_json(content)?;
                let name = datasource.name.ok_or_else(|| {
                    ControllerError::InvalidPayload("datasource has no name".to_string())
                })?;
                self.client.delete_datasource(&name).await
            }
            ResourceKind::NotificationChannel => {
                let candidate = Record::from_json(content)?;
                let existing = self.client.search_notification_channels().await?;
                let resolved = resolve_id(candidate, &existing);
                let id = resolved.resolved_id().ok_or_else(|| {
                    ControllerError::not_found(kind, resolved.identity())
                })?;
                self.client.delete_notification_channel(id).await
            }
            ResourceKind::Folder => Err(unmanaged_folder()),
        }
    }

    /// Wrap the dashboard content and inject the folder id from the folder annotation
    async fn dashboard_payload(
        &self,
        bundle: &ConfigBundle,
        content: &str,
        mode: FolderMode,
    ) -> Result<DashboardPayload> {
        let dashboard = DashboardPayload::parse(content)?;
        let annotation = bundle.annotation(annotations::FOLDER).unwrap_or_default();
        let folders = FolderResolver::new(&self.client);

        let folder_id = match mode {
            FolderMode::Create => folders.resolve(annotation, &bundle.namespace).await?,
            FolderMode::Lookup => folders.find(annotation, &bundle.namespace).await?,
        };

        if folder_id == ROOT_FOLDER_ID {
            return Ok(dashboard);
        }
        Ok(dashboard.with_folder_id(folder_id))
    }
}

fn unmanaged_folder() -> ControllerError {
    ControllerError::InvalidPayload(
        "folders are managed through the dashboard folder annotation".to_string(),
    )
}

fn report(action: &str, done: &str, kind: ResourceKind, key: &str, result: &Result<()>) {
    match result {
        Ok(()) => info!(key = %key, "Succeeded: {} {}: {}", done, kind, key),
        Err(e) => error!(key = %key, error = %e, "Failed to {} {}: {}", action, kind, key),
    }
}
