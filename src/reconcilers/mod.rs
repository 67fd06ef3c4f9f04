// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcilers that turn ConfigMap events into Grafana API calls.

pub mod bundle;

pub use bundle::BundleReconciler;
