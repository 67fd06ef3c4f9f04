// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Folder resolution for dashboards carrying the folder annotation

use crate::classify::parse_bool;
use crate::constants::ROOT_FOLDER_ID;
use crate::error::{ControllerError, Result};
use crate::grafana::GrafanaClient;
use crate::resolve::identity::resolve_id;
use crate::types::{Record, ResourceKind};
use tracing::{error, info, instrument};

/// Effective folder title for a folder annotation value.
///
/// Empty or `false` means no folder. `true` means the ConfigMap namespace.
/// Anything that is not a boolean is taken literally as the folder title.
pub fn folder_title(annotation: &str, namespace: &str) -> Option<String> {
    if annotation.is_empty() {
        return None;
    }
    match parse_bool(annotation) {
        Some(true) => Some(namespace.to_string()),
        Some(false) => None,
        None => Some(annotation.to_string()),
    }
}

pub struct FolderResolver<'a> {
    client: &'a GrafanaClient,
}

impl<'a> FolderResolver<'a> {
    pub fn new(client: &'a GrafanaClient) -> Self {
        Self { client }
    }

    /// Folder id for the annotation value, creating the folder when missing.
    /// Returns [`ROOT_FOLDER_ID`] without calling Grafana when no folder applies.
    #[instrument(skip(self))]
    pub async fn resolve(&self, annotation: &str, namespace: &str) -> Result<i64> {
        let Some(title) = folder_title(annotation, namespace) else {
            return Ok(ROOT_FOLDER_ID);
        };

        if let Some(id) = self.find_by_title(&title).await? {
            return Ok(id);
        }

        info!("Creating folder: {}", title);
        match self.client.create_folder(&Record::titled(title.as_str())).await {
            Ok(()) => info!("Created folder: {}", title),
            // Someone else may have created it meanwhile; the search below decides
            Err(e) => error!("Failed to create folder {}: {}", title, e),
        }

        self.find_by_title(&title)
            .await?
            .ok_or_else(|| ControllerError::not_found(ResourceKind::Folder, title))
    }

    /// Like [`FolderResolver::resolve`] but never creates a folder
    #[instrument(skip(self))]
    pub async fn find(&self, annotation: &str, namespace: &str) -> Result<i64> {
        let Some(title) = folder_title(annotation, namespace) else {
            return Ok(ROOT_FOLDER_ID);
        };

        self.find_by_title(&title)
            .await?
            .ok_or_else(|| ControllerError::not_found(ResourceKind::Folder, title))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<i64>> {
        let folders = self.client.search_folders().await?;
        Ok(resolve_id(Record::titled(title), &folders).resolved_id())
    }
}
