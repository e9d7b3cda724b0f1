//! Error types for the synchronous HTTP client.
//!
//! # Design
//! Every stage of request execution has its own `HttpError` variant, and the
//! transport-stage variants keep the underlying `TransportError` as their
//! source. Callers can tell "bad URL" from "connect timeout" by matching the
//! variant instead of inspecting engine state, and can walk
//! `std::error::Error::source` for the engine's own message.

use std::collections::TryReserveError;

/// Errors returned by `HttpClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// A required argument was missing (empty URL, null pointer at the FFI).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The request URL could not be decomposed.
    #[error("malformed url: {0}")]
    MalformedUrl(#[source] UrlError),

    /// A buffer could not be allocated.
    #[error("resource exhausted")]
    ResourceExhausted,

    /// The transport session could not be opened or configured.
    #[error("session initialization failed")]
    SessionInitFailed(#[source] TransportError),

    /// No connection handle could be opened for the target host and port.
    #[error("connection failed")]
    ConnectionFailed(#[source] TransportError),

    /// The transport refused to open a request against the connection.
    #[error("request open failed")]
    RequestOpenFailed(#[source] TransportError),

    /// The request line, headers or body could not be transmitted.
    #[error("send failed")]
    SendFailed(#[source] TransportError),

    /// The response headers never arrived.
    #[error("receive failed")]
    ReceiveFailed(#[source] TransportError),
}

/// Reasons a URL string cannot be split into components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("url is empty")]
    Empty,

    #[error("url has no scheme")]
    MissingScheme,

    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("url has no host")]
    MissingHost,

    #[error("invalid port `{0}`")]
    InvalidPort(String),

    /// A component could not be copied out of the URL.
    #[error("url component is not valid text")]
    Encoding,

    #[error("no memory for url components")]
    Exhausted,
}

impl From<TryReserveError> for UrlError {
    fn from(_: TryReserveError) -> Self {
        UrlError::Exhausted
    }
}

impl From<UrlError> for HttpError {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::Exhausted => HttpError::ResourceExhausted,
            other => HttpError::MalformedUrl(other),
        }
    }
}

/// Failure reported by the transport engine. Opaque to this crate: only the
/// message is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        TransportError::new(err.to_string())
    }
}

impl From<TryReserveError> for TransportError {
    fn from(err: TryReserveError) -> Self {
        TransportError::new(format!("allocation failed: {err}"))
    }
}

/// Errors loading a `ClientConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid client config: {0}")]
    Parse(#[from] serde_json::Error),
}
