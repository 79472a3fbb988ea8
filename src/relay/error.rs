//! Relay error types and their HTTP mapping.
//!
//! Every variant is an upstream-unavailable condition and maps to
//! 502 Bad Gateway with the error text in a plain-text body.

use std::error::Error as StdError;
use std::time::Duration;

use axum::{
    http::{uri::InvalidUri, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The configured upstream URL is not a valid URI.
    #[error("invalid upstream URL '{url}': {source}")]
    InvalidUpstream {
        url: String,
        #[source]
        source: InvalidUri,
    },

    /// The upstream request could not be assembled.
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    /// Connecting to or talking with the upstream failed.
    #[error("{}", error_chain(.0))]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The upstream did not send response headers in time.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {0}")]
    Status(StatusCode),
}

impl RelayError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidUpstream { .. } | RelayError::Request(_) => "request",
            RelayError::Upstream(_) => "connect",
            RelayError::Timeout(_) => "timeout",
            RelayError::Status(_) => "status",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_GATEWAY,
            format!("Error fetching data from upstream: {}", self),
        )
            .into_response()
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
///
/// Client errors display only their outermost layer ("client error
/// (Connect)"); the cause is what a caller needs to see.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
