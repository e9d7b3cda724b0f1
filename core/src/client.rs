//! The client handle: session-level settings plus the open transport session.
//!
//! # Design
//! `HttpClient` holds the user agent, the timeout and the transport session,
//! and nothing request-specific. Connections and request handles belong to
//! the `execute` call that opened them and are closed before it returns, so
//! a client carries no "current connection" and `execute` only needs `&self`.
//!
//! Dropping the client closes the session. `destroy` does the same
//! explicitly; ownership rules out destroying a client twice.

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::HttpError;
use crate::transport::{Session, Timeouts, Transport, UreqTransport};

/// A synchronous HTTP client bound to one transport session.
pub struct HttpClient<T: Transport = UreqTransport> {
    // Field order is drop order: the session closes first.
    session: T::Session,
    user_agent: String,
    timeout_ms: u32,
    transport: T,
}

impl HttpClient<UreqTransport> {
    /// Create a client on the `ureq` transport. `None` selects the default
    /// user agent.
    pub fn new(user_agent: Option<&str>) -> Result<Self, HttpError> {
        Self::create(UreqTransport, user_agent)
    }
}

impl<T: Transport> HttpClient<T> {
    /// Open a session on `transport` with a 30 second timeout on every phase.
    pub fn create(transport: T, user_agent: Option<&str>) -> Result<Self, HttpError> {
        let config = ClientConfig {
            user_agent: user_agent.map(str::to_string),
            ..ClientConfig::default()
        };
        Self::with_config(transport, &config)
    }

    pub fn with_config(transport: T, config: &ClientConfig) -> Result<Self, HttpError> {
        let user_agent = config.user_agent().to_string();
        let mut session = transport
            .open_session(&user_agent)
            .map_err(HttpError::SessionInitFailed)?;
        session
            .set_timeouts(Timeouts::uniform(config.timeout_ms))
            .map_err(HttpError::SessionInitFailed)?;

        debug!(user_agent = %user_agent, timeout_ms = config.timeout_ms, "client created");
        Ok(Self {
            session,
            user_agent,
            timeout_ms: config.timeout_ms,
            transport,
        })
    }

    /// Apply `timeout_ms` to all four phases of the live session.
    pub fn set_timeout(&mut self, timeout_ms: u32) -> Result<(), HttpError> {
        self.timeout_ms = timeout_ms;
        debug!(timeout_ms, "timeout updated");
        self.session
            .set_timeouts(Timeouts::uniform(timeout_ms))
            .map_err(|err| {
                warn!(error = %err, timeout_ms, "session rejected timeouts");
                HttpError::SessionInitFailed(err)
            })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn session(&self) -> &T::Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Close the session and release the client.
    pub fn destroy(self) {
        debug!(user_agent = %self.user_agent, "client destroyed");
        drop(self);
    }
}
