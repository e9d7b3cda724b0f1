//! Synchronous HTTP client core.
//!
//! # Overview
//! Given a URL, a method, an optional raw header block and an optional body,
//! `HttpClient` connects, sends the request and collects the complete
//! response (status, raw header block, body) into memory. Every network
//! operation blocks the calling thread until it completes or the per-phase
//! timeout elapses.
//!
//! # Design
//! - The engine that performs socket I/O and TLS sits behind the
//!   `transport` traits. `UreqTransport` is the production engine;
//!   `ScriptedTransport` replays canned exchanges in tests.
//! - Engine handles close on drop, so every exit path of `execute` releases
//!   what it opened.
//! - Connections belong to a single `execute` call, not to the client.
//! - Failures to attach request headers or to read the response headers or
//!   body are absorbed and reported through `Response::degradations`.

mod body;
mod buffer;
pub mod client;
pub mod config;
pub mod encode;
pub mod error;
mod execute;
pub mod http;
pub mod transport;
pub mod url;

pub use client::HttpClient;
pub use config::{ClientConfig, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
pub use encode::url_encode;
pub use error::{ConfigError, HttpError, TransportError, UrlError};
pub use http::{Degradation, Method, Request, Response};
pub use transport::{Timeouts, UreqTransport};
pub use url::UrlComponents;
