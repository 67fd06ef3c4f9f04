// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Grafana HTTP API client

use crate::constants::api;
use crate::error::{ControllerError, Result};
use crate::grafana::retry::RetryPolicy;
use crate::grafana::transport::{classify_failure, HttpRequest, HttpResponse, TransportFailure};
use crate::types::{DashboardHit, DashboardPayload, Record};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use http::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service, ServiceExt};
use tracing::{debug, error, info, instrument};
use url::Url;

pub type BoxTransport = BoxCloneSyncService<HttpRequest, HttpResponse, BoxError>;

/// Authentication attached to every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    None,
    Bearer(String),
    Basic { user: String, password: String },
}

impl Credentials {
    fn header_value(&self) -> Option<String> {
        match self {
            Credentials::None => None,
            Credentials::Bearer(token) => Some(format!("Bearer {}", token)),
            Credentials::Basic { user, password } => Some(format!(
                "Basic {}",
                general_purpose::STANDARD.encode(format!("{}:{}", user, password))
            )),
        }
    }
}

/// Stateless client for the Grafana endpoints the controller uses.
///
/// Requests that fail with a refused connection are retried according to the
/// configured [`RetryPolicy`]; every other failure is returned to the caller.
#[derive(Clone)]
pub struct GrafanaClient {
    base_url: Url,
    credentials: Credentials,
    retry: RetryPolicy,
    transport: BoxTransport,
}

impl GrafanaClient {
    pub fn new<S>(base_url: Url, transport: S) -> Self
    where
        S: Service<HttpRequest, Response = HttpResponse, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self {
            base_url,
            credentials: Credentials::None,
            retry: RetryPolicy::default(),
            transport: BoxCloneSyncService::new(transport),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn search_dashboards(&self) -> Result<Vec<DashboardHit>> {
        self.get_json(self.endpoint(api::SEARCH, &[])?).await
    }

    pub async fn search_datasources(&self) -> Result<Vec<Record>> {
        self.get_json(self.endpoint(api::DATASOURCES, &[])?).await
    }

    pub async fn search_notification_channels(&self) -> Result<Vec<Record>> {
        self.get_json(self.endpoint(api::ALERT_NOTIFICATIONS, &[])?)
            .await
    }

    pub async fn search_folders(&self) -> Result<Vec<Record>> {
        self.get_json(self.endpoint(api::FOLDERS, &[])?).await
    }

    pub async fn create_dashboard(&self, dashboard: &DashboardPayload) -> Result<()> {
        let url = self.endpoint(api::DASHBOARDS_DB, &[])?;
        self.send(Method::POST, url, Some(dashboard.to_json()?.into()))
            .await
            .map(drop)
    }

    /// The datasource definition is sent exactly as given
    pub async fn create_datasource(&self, datasource: &str) -> Result<()> {
        let url = self.endpoint(api::DATASOURCES, &[])?;
        self.send(Method::POST, url, Some(Bytes::copy_from_slice(datasource.as_bytes())))
            .await
            .map(drop)
    }

    /// The channel definition is sent exactly as given
    pub async fn create_notification_channel(&self, channel: &str) -> Result<()> {
        let url = self.endpoint(api::ALERT_NOTIFICATIONS, &[])?;
        self.send(Method::POST, url, Some(Bytes::copy_from_slice(channel.as_bytes())))
            .await
            .map(drop)
    }

    pub async fn create_folder(&self, folder: &Record) -> Result<()> {
        let url = self.endpoint(api::FOLDERS, &[])?;
        self.send(Method::POST, url, Some(folder.to_json()?.into()))
            .await
            .map(drop)
    }

    pub async fn create_user(&self, user: &str) -> Result<()> {
        let url = self.endpoint(api::ADMIN_USERS, &[])?;
        self.send(Method::POST, url, Some(Bytes::copy_from_slice(user.as_bytes())))
            .await
            .map(drop)
    }

    pub async fn update_datasource(&self, id: i64, datasource: &Record) -> Result<()> {
        let url = self.endpoint(api::DATASOURCES, &[id.to_string().as_str()])?;
        self.send(Method::PUT, url, Some(datasource.to_json()?.into()))
            .await
            .map(drop)
    }

    pub async fn update_notification_channel(&self, id: i64, channel: &Record) -> Result<()> {
        let url = self.endpoint(api::ALERT_NOTIFICATIONS, &[id.to_string().as_str()])?;
        self.send(Method::PUT, url, Some(channel.to_json()?.into()))
            .await
            .map(drop)
    }

    pub async fn delete_dashboard(&self, uid: &str) -> Result<()> {
        let url = self.endpoint(api::DASHBOARDS_UID, &[uid])?;
        self.send(Method::DELETE, url, None).await.map(drop)
    }

    pub async fn delete_datasource(&self, name: &str) -> Result<()> {
        let url = self.endpoint(api::DATASOURCES_NAME, &[name])?;
        self.send(Method::DELETE, url, None).await.map(drop)
    }

    pub async fn delete_notification_channel(&self, id: i64) -> Result<()> {
        let url = self.endpoint(api::ALERT_NOTIFICATIONS, &[id.to_string().as_str()])?;
        self.send(Method::DELETE, url, None).await.map(drop)
    }

    /// Join an API path and percent-encoded segments onto the base URL,
    /// keeping any path prefix the base URL has.
    fn endpoint(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ControllerError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()))
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let body = self.send(Method::GET, url, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    #[instrument(skip_all, fields(method = %method, url = %url))]
    async fn send(&self, method: Method, url: Url, body: Option<Bytes>) -> Result<Bytes> {
        let mut attempt = 1;
        loop {
            let request = self.build_request(&method, &url, body.clone())?;

            match self.transport.clone().oneshot(request).await {
                Ok(response) => return check_status(response),
                Err(err) if classify_failure(&*err) == TransportFailure::ConnectionRefused => {
                    let Some(delay) = self.retry.next_delay(attempt) else {
                        return Err(ControllerError::Transport(err));
                    };
                    error!("{}", err);
                    info!(
                        "Perhaps Grafana is not ready. Waiting for {} seconds and retry again...",
                        delay.as_secs()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(ControllerError::Transport(err)),
            }
        }
    }

    fn build_request(&self, method: &Method, url: &Url, body: Option<Bytes>) -> Result<HttpRequest> {
        let mut builder = http::Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(header::ACCEPT, "application/json");

        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(auth) = self.credentials.header_value() {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        Ok(builder.body(body.unwrap_or_default())?)
    }
}

/// Anything but 200 is an error carrying the status and the response body
fn check_status(response: HttpResponse) -> Result<Bytes> {
    let status = response.status();
    let body = response.into_body();

    if status != StatusCode::OK {
        return Err(ControllerError::UnexpectedStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    debug!("Grafana responded with {}", status);
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;
    use serde_json::{json, Value};
    use std::io;

    #[tokio::test]
    async fn test_non_ok_status_carries_status_and_body() {
        let mock = MockService::new().on_post(api::DATASOURCES, 500, "boom");

        let err = mock
            .client()
            .create_datasource(r#"{"name":"x","type":"y"}"#)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("500"), "{message}");
        assert!(message.contains("boom"), "{message}");
    }

    #[tokio::test]
    async fn test_created_status_is_not_ok() {
        let mock = MockService::new().on_post(api::FOLDERS, 201, "{}");

        let err = mock
            .client()
            .create_folder(&Record::titled("team-a"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ControllerError::UnexpectedStatus { status: 201, .. }
        ));
    }

    #[tokio::test]
    async fn test_search_dashboards_decodes_hits() {
        let mock = MockService::new().on_get(
            api::SEARCH,
            200,
            r#"[{"id":3,"uid":"home","title":"Home","type":"dash-db","folderId":0}]"#,
        );

        let hits = mock.client().search_dashboards().await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uid, "home");
    }

    #[tokio::test]
    async fn test_search_with_malformed_body_fails() {
        let mock = MockService::new().on_get(api::DATASOURCES, 200, "<html>");

        let err = mock.client().search_datasources().await.unwrap_err();

        assert!(matches!(err, ControllerError::Json(_)));
    }

    #[tokio::test]
    async fn test_retries_while_connection_refused() {
        let mock = MockService::new()
            .on_get(api::FOLDERS, 200, "[]")
            .fail_next(2, io::ErrorKind::ConnectionRefused);

        let folders = mock.client().search_folders().await.unwrap();

        assert!(folders.is_empty());
        assert_eq!(mock.attempts(), 3);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let mock = MockService::new()
            .on_get(api::FOLDERS, 200, "[]")
            .fail_next(5, io::ErrorKind::ConnectionRefused);
        let client = mock
            .client()
            .with_retry_policy(RetryPolicy::immediate().with_max_attempts(3));

        let err = client.search_folders().await.unwrap_err();

        assert!(matches!(err, ControllerError::Transport(_)));
        assert_eq!(mock.attempts(), 3);
    }

    #[tokio::test]
    async fn test_other_transport_errors_are_not_retried() {
        let mock = MockService::new()
            .on_get(api::FOLDERS, 200, "[]")
            .fail_next(1, io::ErrorKind::ConnectionReset);

        let err = mock.client().search_folders().await.unwrap_err();

        assert!(matches!(err, ControllerError::Transport(_)));
        assert_eq!(mock.attempts(), 1);
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let mock = MockService::new().on_get(api::DATASOURCES, 200, "[]");
        let client = mock
            .client()
            .with_credentials(Credentials::Bearer("secret-token".to_string()));

        client.search_datasources().await.unwrap();

        let requests = mock.requests();
        assert_eq!(
            requests[0].header(header::AUTHORIZATION.as_str()),
            Some("Bearer secret-token")
        );
    }

    #[tokio::test]
    async fn test_basic_auth_is_attached() {
        let mock = MockService::new().on_get(api::FOLDERS, 200, "[]");
        let client = mock.client().with_credentials(Credentials::Basic {
            user: "admin".to_string(),
            password: "admin".to_string(),
        });

        client.search_folders().await.unwrap();

        assert_eq!(
            mock.requests()[0].header(header::AUTHORIZATION.as_str()),
            Some("Basic YWRtaW46YWRtaW4=")
        );
    }

    #[tokio::test]
    async fn test_no_auth_header_without_credentials() {
        let mock = MockService::new().on_get(api::FOLDERS, 200, "[]");

        mock.client().search_folders().await.unwrap();

        assert_eq!(mock.requests()[0].header(header::AUTHORIZATION.as_str()), None);
    }

    #[tokio::test]
    async fn test_delete_datasource_encodes_name() {
        let mock = MockService::new().on_delete("/api/datasources/name/My%20Prometheus", 200, "{}");

        mock.client().delete_datasource("My Prometheus").await.unwrap();

        assert_eq!(mock.requests()[0].path, "/api/datasources/name/My%20Prometheus");
    }

    #[tokio::test]
    async fn test_update_notification_channel_puts_record() {
        let mock = MockService::new().on_put("/api/alert-notifications/4", 200, "{}");
        let mut channel = Record::from_json(r#"{"name":"Slack","type":"slack"}"#).unwrap();
        channel.id = Some(4);

        mock.client()
            .update_notification_channel(4, &channel)
            .await
            .unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.method, "PUT");
        assert_eq!(
            request.header(header::CONTENT_TYPE.as_str()),
            Some("application/json")
        );
        assert_eq!(
            request.json(),
            json!({"id": 4, "name": "Slack", "type": "slack"})
        );
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let mock = MockService::new().on_get("/grafana/api/folders", 200, "[]");
        let client = GrafanaClient::new(
            Url::parse("http://grafana.test/grafana/").unwrap(),
            mock.clone(),
        )
        .with_retry_policy(RetryPolicy::immediate());

        client.search_folders().await.unwrap();

        assert_eq!(mock.requests()[0].path, "/grafana/api/folders");
    }

    #[tokio::test]
    async fn test_create_dashboard_sends_envelope() {
        let mock = MockService::new().on_post(api::DASHBOARDS_DB, 200, "{}");
        let payload = DashboardPayload::parse(r#"{"title":"Home"}"#).unwrap();

        mock.client().create_dashboard(&payload).await.unwrap();

        let body: Value = mock.requests()[0].json();
        assert_eq!(body, json!({"dashboard": {"title": "Home"}, "overwrite": true}));
    }
}
