// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Grafana HTTP API gateway: client, transport and retry policy.

pub mod client;
pub mod retry;
pub mod transport;

pub use client::{Credentials, GrafanaClient};
pub use retry::RetryPolicy;
pub use transport::{classify_failure, ReqwestTransport, TransportFailure};
