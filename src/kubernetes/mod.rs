// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for watching ConfigMaps and deriving bundle events.

pub mod watcher;

pub use watcher::{BundleCache, BundleEvent, ConfigMapWatcher};
