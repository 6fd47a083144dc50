//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use xai_proxy::config::ProxyConfig;
use xai_proxy::http::HttpServer;
use xai_proxy::lifecycle::Shutdown;

/// A request as the mock upstream saw it.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

pub type RequestLog = Arc<Mutex<Vec<SeenRequest>>>;

/// Start a mock upstream on an ephemeral port.
///
/// - `/v1/redirect/{status}` answers with that 3xx status and
///   `Location: /v1/models`
/// - `/v1/echo` returns the request body
/// - anything else returns `200 {"ok":true}` with `x-upstream: yes`
pub async fn start_mock_upstream() -> (SocketAddr, RequestLog) {
    let log: RequestLog = Arc::default();
    let app = Router::new().fallback(record).with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, log)
}

async fn record(State(log): State<RequestLog>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let path = parts.uri.path().to_string();

    log.lock().unwrap().push(SeenRequest {
        method: parts.method,
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body: body.to_vec(),
    });

    if let Some(code) = path.strip_prefix("/v1/redirect/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::FOUND);
        return (status, [(header::LOCATION, "/v1/models")]).into_response();
    }

    match path.as_str() {
        "/v1/echo" => Body::from(body).into_response(),
        _ => (
            StatusCode::OK,
            [("content-type", "application/json"), ("x-upstream", "yes")],
            r#"{"ok":true}"#,
        )
            .into_response(),
    }
}

/// Start an upstream that writes `status_line` verbatim, e.g.
/// `"HTTP/1.1 200 Custom Reason"`, followed by a small JSON body.
#[allow(dead_code)]
pub async fn start_raw_upstream(status_line: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let body = r#"{"ok":true}"#;
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Send a bodiless GET over a plain socket and return the raw response text.
#[allow(dead_code)]
pub async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start the proxy in front of `upstream`. Trigger the returned handle to stop it.
pub async fn start_proxy(upstream: SocketAddr) -> (SocketAddr, Shutdown) {
    let mut config = ProxyConfig::default();
    config.upstream.base_url = format!("http://{upstream}/v1");
    config.upstream.use_system_proxy = false;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
