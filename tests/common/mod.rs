//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use meter_relay::config::{OriginConfig, RelayServiceConfig, TimeoutConfig};
use meter_relay::{OriginServer, RelayServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Write `contents` to a fresh file in the temp directory.
pub fn write_data_file(contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("meter-relay-{}.csv", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

/// A path in the temp directory that does not exist.
#[allow(dead_code)]
pub fn missing_data_file() -> PathBuf {
    std::env::temp_dir().join(format!("meter-relay-missing-{}.csv", uuid::Uuid::new_v4()))
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Start an origin server on an ephemeral port.
pub async fn spawn_origin(file: &Path, shutdown: &Shutdown) -> SocketAddr {
    let config = OriginConfig {
        file_path: file.to_string_lossy().into_owned(),
        ..OriginConfig::default()
    };
    let server = OriginServer::new(&config, Duration::from_secs(10)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe("origin");

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    addr
}

/// Start a relay pointed at `upstream_url` on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_relay(upstream_url: String, chunk_size: usize, shutdown: &Shutdown) -> SocketAddr {
    let timeouts = TimeoutConfig {
        connect_secs: 2,
        upstream_secs: 5,
        request_secs: 10,
    };
    spawn_relay_with_timeouts(upstream_url, chunk_size, timeouts, shutdown).await
}

/// Start a relay with explicit timeouts on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_relay_with_timeouts(
    upstream_url: String,
    chunk_size: usize,
    timeouts: TimeoutConfig,
    shutdown: &Shutdown,
) -> SocketAddr {
    let config = RelayServiceConfig {
        upstream_url,
        chunk_size,
        ..RelayServiceConfig::default()
    };
    let server = RelayServer::new(&config, &timeouts).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe("relay");

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    addr
}

/// URL of the origin endpoint on `addr`.
#[allow(dead_code)]
pub fn origin_url(addr: SocketAddr) -> String {
    format!("http://{}/api/get_smart_meter_data", addr)
}

/// Start a raw backend that writes `response` verbatim to every connection
/// and closes it. Received request heads are recorded.
#[allow(dead_code)]
pub async fn start_raw_backend(response: Vec<u8>) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();
    let response = Arc::new(response);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let response = response.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await;
                        recorded.lock().unwrap().push(head);
                        let _ = socket.write_all(&response).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, requests)
}

/// Start a backend that accepts connections, reads the request and never
/// answers. Sockets stay open until the test runtime shuts down.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = read_request_head(&mut socket).await;
            held.push(socket);
        }
    });

    addr
}

/// Start a backend that streams an endless chunked CSV body, one 1 KiB chunk
/// every 20 ms. The returned receiver fires once a write fails, i.e. once the
/// peer has closed the connection.
#[allow(dead_code)]
pub async fn start_endless_backend() -> (SocketAddr, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let _ = read_request_head(&mut socket).await;

        let head = b"HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nTransfer-Encoding: chunked\r\n\r\n";
        if socket.write_all(head).await.is_ok() {
            let mut chunk = b"400\r\n".to_vec();
            chunk.extend(std::iter::repeat(b'7').take(1024));
            chunk.extend_from_slice(b"\r\n");

            while socket.write_all(&chunk).await.is_ok() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
        let _ = closed_tx.send(());
    });

    (addr, closed_rx)
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Client that never pools connections or goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
