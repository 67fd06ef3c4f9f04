// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identity resolution for datasources, notification channels, folders and dashboards

use crate::constants::{DASHBOARD_TYPE_DB, NOT_FOUND_ID};
use crate::types::{DashboardHit, DashboardPayload, Record};

/// Copy the id of the matching existing record onto `candidate`.
///
/// A candidate with a `title` matches on the title, ignoring case. Otherwise a
/// candidate with both `name` and `type` matches on both exactly. The first
/// match in `existing` wins; without one the id is set to [`NOT_FOUND_ID`].
pub fn resolve_id(mut candidate: Record, existing: &[Record]) -> Record {
    let matched = if let Some(title) = &candidate.title {
        let wanted = title.to_uppercase();
        existing.iter().find(|r| {
            r.title
                .as_deref()
                .is_some_and(|t| t.to_uppercase() == wanted)
        })
    } else if let (Some(name), Some(type_)) = (&candidate.name, &candidate.type_) {
        existing
            .iter()
            .find(|r| r.name.as_ref() == Some(name) && r.type_.as_ref() == Some(type_))
    } else {
        None
    };

    candidate.id = Some(matched.and_then(|r| r.id).unwrap_or(NOT_FOUND_ID));
    candidate
}

/// Uid of the regular dashboard with the same title in the same folder
pub fn lookup_uid(dashboards: &[DashboardHit], candidate: &DashboardPayload) -> Option<String> {
    let title = candidate.title()?;
    let folder_id = candidate.folder_id();

    dashboards
        .iter()
        .find(|d| d.type_ == DASHBOARD_TYPE_DB && d.title == title && d.folder_id == folder_id)
        .map(|d| d.uid.clone())
}
