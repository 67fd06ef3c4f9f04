// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport for the Grafana client and classification of its failures

use bytes::Bytes;
use futures::future::BoxFuture;
use std::error::Error as StdError;
use std::io;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{BoxError, Service};

pub type HttpRequest = http::Request<Bytes>;
pub type HttpResponse = http::Response<Bytes>;

/// How a transport error should be treated by the callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// Nothing is listening yet; worth retrying
    ConnectionRefused,
    TimedOut,
    Other,
}

/// Walk the error source chain looking for a refused connection or a timeout.
pub fn classify_failure(err: &(dyn StdError + 'static)) -> TransportFailure {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return TransportFailure::ConnectionRefused,
                io::ErrorKind::TimedOut => return TransportFailure::TimedOut,
                _ => {}
            }
        }
        if e
            .downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout)
        {
            return TransportFailure::TimedOut;
        }
        if e.to_string().to_lowercase().contains("connection refused") {
            return TransportFailure::ConnectionRefused;
        }
        current = e.source();
    }
    TransportFailure::Other
}

/// `tower::Service` adapter over a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Service<HttpRequest> for ReqwestTransport {
    type Response = HttpResponse;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let request = reqwest::Request::try_from(req)?;
            let response = client.execute(request).await?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            let mut out = http::Response::new(body);
            *out.status_mut() = status;
            *out.headers_mut() = headers;
            Ok(out)
        })
    }
}
