// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Grafana API responses.

use crate::grafana::{GrafanaClient, RetryPolicy};
use bytes::Bytes;
use http::{Request, Response};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;
use url::Url;

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: http::HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Default)]
struct State {
    /// Queued responses per (method, path); the last one is repeated
    responses: HashMap<(String, String), VecDeque<(u16, String)>>,
    requests: Vec<RecordedRequest>,
    failures: VecDeque<io::ErrorKind>,
    attempts: usize,
}

/// A mock HTTP service that returns predefined responses based on request paths
/// and records every request it answers.
#[derive(Clone, Default)]
pub struct MockService {
    state: Arc<Mutex<State>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for requests matching the method and exact path
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Fail the next `count` calls with a transport error of the given kind
    pub fn fail_next(self, count: usize, kind: io::ErrorKind) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .extend(std::iter::repeat(kind).take(count));
        self
    }

    /// A Grafana client talking to this mock without retry delays
    pub fn client(&self) -> GrafanaClient {
        GrafanaClient::new(Url::parse("http://grafana.test").unwrap(), self.clone())
            .with_retry_policy(RetryPolicy::immediate())
    }

    /// Requests that got an HTTP response, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// All calls including the ones failed at the transport level
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    fn respond(&self, req: Request<Bytes>) -> Result<Response<Bytes>, io::Error> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;

        if let Some(kind) = state.failures.pop_front() {
            return Err(io::Error::new(kind, "mock transport failure"));
        }

        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            headers: req.headers().clone(),
            body: String::from_utf8_lossy(req.body()).into_owned(),
        });

        let (status, body) = match state.responses.get_mut(&(method, path)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue.front().cloned().unwrap(),
            // Default 404 for unmatched requests
            _ => (404, r#"{"message":"Not found"}"#.to_string()),
        };

        Ok(Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Bytes::from(body))
            .unwrap())
    }
}

impl Service<Request<Bytes>> for MockService {
    type Response = Response<Bytes>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let response = self.respond(req).map_err(tower::BoxError::from);
        Box::pin(async move { response })
    }
}

/// JSON list of folders with the given (id, title) pairs
pub fn folders_json(folders: &[(i64, &str)]) -> String {
    serde_json::Value::Array(
        folders
            .iter()
            .map(|(id, title)| serde_json::json!({"id": id, "uid": format!("f{}", id), "title": title}))
            .collect(),
    )
    .to_string()
}

/// JSON list of dashboard search hits with the given (uid, title, folder id)
pub fn dashboards_json(dashboards: &[(&str, &str, i64)]) -> String {
    serde_json::Value::Array(
        dashboards
            .iter()
            .enumerate()
            .map(|(i, (uid, title, folder_id))| {
                serde_json::json!({
                    "id": i + 1,
                    "uid": uid,
                    "title": title,
                    "uri": format!("db/{}", title.to_lowercase()),
                    "type": "dash-db",
                    "folderId": folder_id,
                })
            })
            .collect(),
    )
    .to_string()
}
