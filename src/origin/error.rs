//! Origin error types and their HTTP mapping.

use std::path::PathBuf;

use axum::{
    http::{header::InvalidHeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Body returned when the served file cannot be opened.
pub const NOT_FOUND_BODY: &str = "File not found.";

#[derive(Debug, Error)]
pub enum OriginError {
    /// The configured file is absent or could not be opened.
    #[error("resource missing at {}: {source}", .path.display())]
    ResourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured value cannot be carried in a response header.
    #[error("invalid header value for {field}: {source}")]
    InvalidHeader {
        field: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },
}

impl IntoResponse for OriginError {
    fn into_response(self) -> Response {
        match self {
            OriginError::ResourceMissing { .. } => {
                (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
            }
            OriginError::InvalidHeader { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}
