// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Data model shared by the classifier, resolvers, gateway and reconciler.

pub mod bundle;
pub mod resource;

pub use bundle::ConfigBundle;
pub use resource::{DashboardHit, DashboardPayload, Record, ResourceKind};
