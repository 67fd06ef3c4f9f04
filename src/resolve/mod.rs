// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Matching local resource definitions to existing Grafana objects.

pub mod folder;
pub mod identity;

pub use folder::{folder_title, FolderResolver};
pub use identity::{lookup_uid, resolve_id};
