//! Relay service.
//!
//! # Responsibilities
//! - Accept `GET /mcp/meter_data/{meter_id}`
//! - Fetch the origin file through [`UpstreamClient`]
//! - Stream the body back with the origin's `Content-Type`
//! - Convert every upstream failure into 502 Bad Gateway
//!
//! The meter ID is logged but does not select anything: there is exactly
//! one backing resource.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use hyper::body::Incoming;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{RelayServiceConfig, TimeoutConfig};
use crate::http::{request_id, request_id_value, serve, with_common_layers};
use crate::observability::metrics;
use crate::relay::error::RelayError;
use crate::relay::stream::{ChunkedStream, MeteredStream};
use crate::relay::upstream::UpstreamClient;

/// Route of the relay endpoint.
pub const METER_DATA_ROUTE: &str = "/mcp/meter_data/{meter_id}";

/// Application state injected into the handler.
struct RelayState {
    upstream: UpstreamClient,
    chunk_size: usize,
}

/// HTTP server forwarding the origin file to its callers.
pub struct RelayServer {
    router: Router,
}

impl RelayServer {
    pub fn new(config: &RelayServiceConfig, timeouts: &TimeoutConfig) -> Result<Self, RelayError> {
        let upstream = UpstreamClient::new(&config.upstream_url, timeouts)?;

        tracing::info!(
            upstream = %upstream.uri(),
            chunk_size = config.chunk_size,
            connect_timeout_secs = timeouts.connect_secs,
            upstream_timeout_secs = timeouts.upstream_secs,
            "Relay configured"
        );

        let state = Arc::new(RelayState {
            upstream,
            chunk_size: config.chunk_size,
        });

        let router = Router::new()
            .route(METER_DATA_ROUTE, get(meter_data_handler))
            .with_state(state);

        // The upstream deadlines bound this handler; a handler timeout on top
        // would answer 408 before a stalled upstream could be reported as 502.
        Ok(Self {
            router: with_common_layers(router, None),
        })
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        serve("relay", listener, self.router, shutdown).await
    }
}

async fn meter_data_handler(
    State(state): State<Arc<RelayState>>,
    Path(meter_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers).to_string();

    tracing::debug!(
        request_id = %request_id,
        meter_id = %meter_id,
        upstream = %state.upstream.uri(),
        "Relaying meter data"
    );

    let response = match state.upstream.fetch(request_id_value(&headers)).await {
        Ok(upstream) => forward(upstream, state.chunk_size, request_id),
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Upstream request failed");
            metrics::record_upstream_error(e.kind());
            e.into_response()
        }
    };

    metrics::record_request("relay", response.status().as_u16(), start);
    response
}

/// Build the downstream response around the still-unread upstream body.
fn forward(
    upstream: axum::http::Response<Incoming>,
    chunk_size: usize,
    request_id: String,
) -> Response {
    let (parts, body) = upstream.into_parts();

    let chunks = ChunkedStream::new(Body::new(body).into_data_stream(), chunk_size);
    let mut response = Response::new(Body::from_stream(MeteredStream::new(chunks, request_id)));
    *response.status_mut() = StatusCode::OK;

    if let Some(content_type) = parts.headers.get(header::CONTENT_TYPE) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    }

    response
}
