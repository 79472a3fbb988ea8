//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Issue the GET to the origin URL
//! - Enforce connect and response-header deadlines
//! - Turn non-success statuses into errors before any byte is forwarded
//!
//! # Design Decisions
//! - The response body is returned unread; the caller owns streaming it
//! - No deadline applies once headers arrived, so large files are not cut off
//! - No retries

use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, Response, Uri},
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::http::X_REQUEST_ID;
use crate::relay::error::RelayError;

/// Client bound to the single origin URL.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    uri: Uri,
    response_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(url: &str, timeouts: &TimeoutConfig) -> Result<Self, RelayError> {
        let uri: Uri = url.parse().map_err(|source| RelayError::InvalidUpstream {
            url: url.to_string(),
            source,
        })?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            uri,
            response_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// GET the origin resource, forwarding the caller's request ID.
    pub async fn fetch(
        &self,
        request_id: Option<HeaderValue>,
    ) -> Result<Response<Incoming>, RelayError> {
        let mut builder = Request::builder().method(Method::GET).uri(self.uri.clone());
        if let Some(id) = request_id {
            builder = builder.header(X_REQUEST_ID, id);
        }
        let request = builder.body(Body::empty())?;

        let response = tokio::time::timeout(self.response_timeout, self.client.request(request))
            .await
            .map_err(|_| RelayError::Timeout(self.response_timeout))??;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status));
        }

        Ok(response)
    }
}
