// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decides which Grafana resource kind a ConfigMap carries and whether it
//! targets the Grafana instance this controller owns.

use crate::constants::annotations;
use crate::error::ControllerError;
use crate::types::{ConfigBundle, ResourceKind};

/// Resource kinds in the order their annotations are checked
const KIND_ANNOTATIONS: [(&str, ResourceKind); 3] = [
    (annotations::DASHBOARD, ResourceKind::Dashboard),
    (annotations::DATASOURCE, ResourceKind::Datasource),
    (annotations::NOTIFICATION_CHANNEL, ResourceKind::NotificationChannel),
];

/// What a bundle's annotations declare
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declared {
    Nothing,
    Single(ResourceKind),
    Ambiguous(Vec<ResourceKind>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub declared: Declared,
    /// The bundle's target instance id equals the configured one
    pub owned: bool,
}

impl Classification {
    /// The single kind to reconcile, if the bundle is ours and unambiguous.
    ///
    /// `Ok(None)` means the bundle is simply not for us.
    pub fn actionable_kind(&self) -> Result<Option<ResourceKind>, ControllerError> {
        if !self.owned {
            return Ok(None);
        }
        match &self.declared {
            Declared::Nothing => Ok(None),
            Declared::Single(kind) => Ok(Some(*kind)),
            Declared::Ambiguous(kinds) => Err(ControllerError::AmbiguousKind(
                kinds
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }
}

/// Classify a bundle against the configured instance id. Malformed
/// annotation values count as `false` / `0`.
pub fn classify(bundle: &ConfigBundle, instance_id: i64) -> Classification {
    let target_id = bundle
        .annotation(annotations::ID)
        .map(parse_id)
        .unwrap_or_default();

    let kinds: Vec<ResourceKind> = KIND_ANNOTATIONS
        .iter()
        .filter(|(key, _)| {
            bundle
                .annotation(key)
                .and_then(parse_bool)
                .unwrap_or(false)
        })
        .map(|(_, kind)| *kind)
        .collect();

    let declared = match kinds.as_slice() {
        [] => Declared::Nothing,
        [kind] => Declared::Single(*kind),
        _ => Declared::Ambiguous(kinds),
    };

    Classification {
        declared,
        owned: target_id == instance_id,
    }
}

/// Boolean annotation parsing. Accepts the spellings `1, t, T, TRUE, true, True`
/// and `0, f, F, FALSE, false, False`; anything else is not a boolean.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_id(value: &str) -> i64 {
    value.parse().unwrap_or_default()
}
