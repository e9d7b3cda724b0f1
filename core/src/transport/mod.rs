//! The transport engine seam.
//!
//! # Design
//! The engine that does socket I/O, TLS and header wire-formatting sits
//! behind a chain of traits mirroring its handle hierarchy: a `Transport`
//! opens a `Session`, a session connects to a host and yields a
//! `Connection`, a connection opens a `RequestHandle`. Closing a handle is
//! dropping it, so every handle opened during a call is closed exactly once
//! on every exit path.
//!
//! `UreqTransport` is the production engine. `ScriptedTransport` replays a
//! canned exchange and records every handle it hands out, for tests.

mod agent;
mod scripted;

use std::time::Duration;

use crate::error::TransportError;
use crate::http::Method;

pub use self::agent::{UreqConnection, UreqRequest, UreqSession, UreqTransport};
pub use self::scripted::{
    BodyStep, Call, Ledger, Script, ScriptedConnection, ScriptedRequest, ScriptedSession,
    ScriptedTransport, Stage,
};

/// Per-phase timeouts applied to a session. A zero duration means the phase
/// waits indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub resolve: Duration,
    pub connect: Duration,
    pub send: Duration,
    pub receive: Duration,
}

impl Timeouts {
    /// The same timeout for all four phases.
    pub fn uniform(ms: u32) -> Self {
        let timeout = Duration::from_millis(u64::from(ms));
        Self {
            resolve: timeout,
            connect: timeout,
            send: timeout,
            receive: timeout,
        }
    }
}

/// Opens sessions.
pub trait Transport {
    type Session: Session;

    fn open_session(&self, user_agent: &str) -> Result<Self::Session, TransportError>;
}

/// Long-lived engine configuration. Closed on drop.
pub trait Session {
    type Connection: Connection;

    fn set_timeouts(&mut self, timeouts: Timeouts) -> Result<(), TransportError>;

    fn connect(&self, host: &str, port: u16) -> Result<Self::Connection, TransportError>;
}

/// A target host and port. Closed on drop.
pub trait Connection {
    type Request: RequestHandle;

    fn open_request(
        &self,
        method: Method,
        path: &str,
        secure: bool,
    ) -> Result<Self::Request, TransportError>;
}

/// One in-flight request. Closed on drop.
pub trait RequestHandle {
    /// Attach a raw, CRLF-separated header block.
    fn add_headers(&mut self, headers: &str) -> Result<(), TransportError>;

    fn send(&mut self, body: &[u8]) -> Result<(), TransportError>;

    /// Block until the response headers have arrived.
    fn receive_response(&mut self) -> Result<(), TransportError>;

    fn status_code(&self) -> Result<u16, TransportError>;

    /// Size in bytes of the raw response header block.
    fn raw_headers_len(&self) -> Result<usize, TransportError>;

    /// Copy the raw response header block into `buf`, returning the number
    /// of bytes written.
    fn read_raw_headers(&self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Number of body bytes that can be read without blocking; zero at the
    /// end of the body.
    fn data_available(&mut self) -> Result<usize, TransportError>;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}
