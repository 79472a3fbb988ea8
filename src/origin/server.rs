//! Origin file server.
//!
//! Serves the single configured file at `/api/get_smart_meter_data` as a
//! download. The file is streamed from disk; nothing is cached and nothing
//! is written.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::fs::File;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::io::ReaderStream;

use crate::config::OriginConfig;
use crate::http::{request_id, serve, with_common_layers};
use crate::observability::metrics;
use crate::origin::error::OriginError;

/// Route of the file download endpoint.
pub const DATA_ROUTE: &str = "/api/get_smart_meter_data";

/// Response headers and file location, resolved once at startup.
#[derive(Debug)]
struct OriginState {
    file_path: PathBuf,
    content_type: HeaderValue,
    content_disposition: HeaderValue,
}

/// HTTP server owning the single file resource.
pub struct OriginServer {
    router: Router,
}

impl OriginServer {
    /// Build the server from its configuration section.
    pub fn new(config: &OriginConfig, request_timeout: Duration) -> Result<Self, OriginError> {
        let state = Arc::new(OriginState {
            file_path: PathBuf::from(&config.file_path),
            content_type: HeaderValue::from_str(&config.content_type).map_err(|source| {
                OriginError::InvalidHeader {
                    field: "content_type",
                    source,
                }
            })?,
            content_disposition: attachment_disposition(&config.download_name)?,
        });

        tracing::info!(
            file_path = %state.file_path.display(),
            download_name = %config.download_name,
            "Origin configured"
        );

        let router = Router::new()
            .route(DATA_ROUTE, get(download_handler))
            .with_state(state);

        Ok(Self {
            router: with_common_layers(router, Some(request_timeout)),
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
        serve("origin", listener, self.router, shutdown).await
    }
}

fn attachment_disposition(download_name: &str) -> Result<HeaderValue, OriginError> {
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download_name)).map_err(
        |source| OriginError::InvalidHeader {
            field: "download_name",
            source,
        },
    )
}

async fn download_handler(State(state): State<Arc<OriginState>>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let response = match open_resource(&state).await {
        Ok((file, len)) => {
            tracing::debug!(request_id, bytes = len, "Serving file");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, state.content_type.clone()),
                    (header::CONTENT_DISPOSITION, state.content_disposition.clone()),
                    (header::CONTENT_LENGTH, HeaderValue::from(len)),
                ],
                Body::from_stream(ReaderStream::new(file)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(request_id, error = %e, "File unavailable");
            e.into_response()
        }
    };

    metrics::record_request("origin", response.status().as_u16(), start);
    response
}

/// Open the file and read its length. Any failure counts as a missing resource.
async fn open_resource(state: &OriginState) -> Result<(File, u64), OriginError> {
    let missing = |source| OriginError::ResourceMissing {
        path: state.file_path.clone(),
        source,
    };

    let file = File::open(&state.file_path).await.map_err(missing)?;
    let metadata = file.metadata().await.map_err(missing)?;
    if !metadata.is_file() {
        return Err(missing(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    Ok((file, metadata.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use tower::ServiceExt;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("meter-relay-origin-{}-{}", std::process::id(), name))
    }

    fn server_for(path: &std::path::Path) -> OriginServer {
        let config = OriginConfig {
            file_path: path.to_string_lossy().into_owned(),
            ..OriginConfig::default()
        };
        OriginServer::new(&config, Duration::from_secs(5)).unwrap()
    }

    async fn get(server: &OriginServer) -> Response {
        server
            .router()
            .oneshot(Request::get(DATA_ROUTE).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_serves_file_as_csv_attachment() {
        let path = temp_path("present.csv");
        let contents = b"timestamp,kwh\n2024-11-01T00:00,0.42\n2024-11-01T00:30,0.37\n";
        std::fs::write(&path, contents).unwrap();

        let response = get(&server_for(&path)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"smart_meter_data.csv\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], contents.len().to_string().as_str());
        assert!(headers.contains_key("x-request-id"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], &contents[..]);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let response = get(&server_for(&temp_path("absent.csv"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"File not found.");
    }

    #[tokio::test]
    async fn test_directory_is_treated_as_missing() {
        let response = get(&server_for(&std::env::temp_dir())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_routes_not_served() {
        let server = server_for(&temp_path("unused.csv"));
        let response = server
            .router()
            .oneshot(Request::get("/api/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_download_name_rejected() {
        let config = OriginConfig {
            download_name: "bad\nname.csv".into(),
            ..OriginConfig::default()
        };
        let err = OriginServer::new(&config, Duration::from_secs(5)).err().unwrap();
        assert!(matches!(
            err,
            OriginError::InvalidHeader {
                field: "download_name",
                ..
            }
        ));
    }
}
