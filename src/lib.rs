// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod bootstrap;
pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod grafana;
pub mod kubernetes;
pub mod reconcilers;
pub mod resolve;
pub mod types;

#[cfg(test)]
pub mod test_utils;
