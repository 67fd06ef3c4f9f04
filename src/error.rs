// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::grafana::transport::{classify_failure, TransportFailure};
use crate::types::ResourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Grafana request failed: {0}")]
    Transport(#[source] tower::BoxError),

    #[error("Unexpected status code returned from Grafana API (got: {status}, expected: 200, msg: {body})")]
    UnexpectedStatus { status: u16, body: String },

    #[error("{kind} not found: {identity}")]
    NotFound { kind: ResourceKind, identity: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ConfigMap declares more than one resource kind: {0}")]
    AmbiguousKind(String),

    #[error("Invalid Grafana URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] http::Error),
}

impl ControllerError {
    pub fn not_found(kind: ResourceKind, identity: impl Into<String>) -> Self {
        ControllerError::NotFound {
            kind,
            identity: identity.into(),
        }
    }

    /// True when identity resolution found no remote record
    pub fn is_not_found(&self) -> bool {
        matches!(self, ControllerError::NotFound { .. })
    }

    /// True when the request never got an answer because the transport timed out
    pub fn is_timeout(&self) -> bool {
        match self {
            ControllerError::Transport(err) => {
                classify_failure(&**err) == TransportFailure::TimedOut
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
