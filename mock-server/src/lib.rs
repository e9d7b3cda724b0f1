//! A small httpbin-style server for exercising the client end to end.
//!
//! # Endpoints
//! - `/anything` and `/anything/{*rest}`: any method; echoes the request back
//!   as JSON and tags the response with an `x-request-id` header.
//! - `GET /status/{code}`: empty response with the given status.
//! - `GET /bytes/{n}`: `n` bytes of a fixed pattern (capped at 1 MiB).
//! - `GET /delay/{ms}`: responds after sleeping `ms` milliseconds.
//! - `GET /redirect`: `302` pointing at `/anything`.
//! - `GET /empty`: `200` with an empty body.

use std::{collections::BTreeMap, time::Duration};

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Largest body `/bytes/{n}` will produce.
pub const MAX_BYTES: usize = 1024 * 1024;

/// Longest sleep `/delay/{ms}` will honour.
const MAX_DELAY_MS: u64 = 10_000;

/// The request as seen by the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/anything", any(anything))
        .route("/anything/{*rest}", any(anything))
        .route("/status/{code}", get(status))
        .route("/bytes/{n}", get(bytes))
        .route("/delay/{ms}", get(delay))
        .route("/redirect", get(redirect))
        .route("/empty", get(empty))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    tracing::info!(addr = ?listener.local_addr().ok(), "mock server listening");
    axum::serve(listener, app()).await
}

/// Byte `i` of every `/bytes/{n}` body.
pub fn pattern_byte(i: usize) -> u8 {
    (i % 251) as u8
}

async fn anything(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let echo = Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    tracing::debug!(method = %echo.method, path = %echo.path, "echo");
    ([("x-request-id", Uuid::new_v4().to_string())], Json(echo))
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn bytes(Path(n): Path<usize>) -> Vec<u8> {
    (0..n.min(MAX_BYTES)).map(pattern_byte).collect()
}

async fn delay(Path(ms): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(ms.min(MAX_DELAY_MS))).await;
    "done"
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/anything")])
}

async fn empty() -> StatusCode {
    StatusCode::OK
}
