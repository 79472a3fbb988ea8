//! HTTP server plumbing shared by the origin and relay services.
//!
//! # Responsibilities
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve a router on a bound listener
//! - Stop accepting and drain on the shutdown signal

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// Wrap a router with the middleware stack every service carries.
///
/// Outermost first: request ID assignment, tracing, request ID echo, and the
/// handler timeout when one is given. A service whose handler already bounds
/// its own waits passes `None`, so its error mapping is not preempted by a 408.
#[allow(deprecated)]
pub fn with_common_layers(router: Router, request_timeout: Option<Duration>) -> Router {
    let router = match request_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer()),
    )
}

/// Serve `router` on `listener` until `shutdown` fires, then drain.
pub async fn serve(
    service: &'static str,
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(service, address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!(service, "Shutdown signal received");
        })
        .await?;

    tracing::info!(service, "HTTP server stopped");
    Ok(())
}
