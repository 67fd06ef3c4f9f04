// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Grafana resource records, typed on the fields used for identity matching

use crate::constants::NOT_FOUND_ID;
use crate::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kinds of Grafana objects the controller manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Dashboard,
    Datasource,
    NotificationChannel,
    Folder,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Dashboard => "dashboard",
            ResourceKind::Datasource => "datasource",
            ResourceKind::NotificationChannel => "notification channel",
            ResourceKind::Folder => "folder",
        };
        f.write_str(name)
    }
}

/// A datasource, notification channel or folder.
///
/// Only the identity fields are typed; everything else is carried through
/// untouched in `extra` so unknown Grafana fields survive an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// The remote id, or `None` when resolution ended on the sentinel
    pub fn resolved_id(&self) -> Option<i64> {
        self.id.filter(|id| *id != NOT_FOUND_ID)
    }

    /// Human readable identity used in logs and errors
    pub fn identity(&self) -> String {
        match (&self.title, &self.name, &self.type_) {
            (Some(title), _, _) => title.clone(),
            (None, Some(name), Some(type_)) => format!("{} ({})", name, type_),
            (None, Some(name), None) => name.clone(),
            _ => "<unnamed>".to_string(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// One entry of the `/api/search` result
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardHit {
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub uri: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub folder_id: i64,
}

/// A dashboard in the `{"dashboard": {...}, "overwrite": true}` envelope
/// expected by `POST /api/dashboards/db`.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardPayload(Map<String, Value>);

impl DashboardPayload {
    pub const FOLDER_ID_FIELD: &'static str = "folderID";

    /// Parse dashboard content, wrapping a bare dashboard model in the envelope.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(object) = value else {
            return Err(ControllerError::InvalidPayload(
                "dashboard must be a JSON object".to_string(),
            ));
        };

        if object.get("dashboard").is_some_and(Value::is_object) {
            return Ok(Self(object));
        }

        let mut envelope = Map::new();
        envelope.insert("dashboard".to_string(), Value::Object(object));
        envelope.insert("overwrite".to_string(), Value::Bool(true));
        Ok(Self(envelope))
    }

    pub fn with_folder_id(mut self, folder_id: i64) -> Self {
        self.0.retain(|k, _| !k.eq_ignore_ascii_case(Self::FOLDER_ID_FIELD));
        self.0
            .insert(Self::FOLDER_ID_FIELD.to_string(), Value::from(folder_id));
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.0
            .get("dashboard")
            .and_then(|d| d.get("title"))
            .and_then(Value::as_str)
    }

    /// Folder id from the envelope; a missing field means the root folder
    pub fn folder_id(&self) -> i64 {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(Self::FOLDER_ID_FIELD))
            .and_then(|(_, v)| v.as_i64())
            .unwrap_or_default()
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}
