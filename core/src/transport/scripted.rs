//! An in-memory transport that replays a scripted exchange.
//!
//! Every handle it opens and closes, and every call made on it, is written
//! to a shared `Ledger` so tests can check that the client releases exactly
//! what it acquired.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{Connection, RequestHandle, Session, Timeouts, Transport};
use crate::error::TransportError;
use crate::http::Method;

/// A stage at which the scripted transport can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpenSession,
    SetTimeouts,
    Connect,
    OpenRequest,
    AddHeaders,
    Send,
    Receive,
    /// Probing the raw header size fails.
    HeaderProbe,
    /// Probing succeeds but fetching the header block fails.
    HeaderFetch,
}

/// One step of the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStep {
    /// Report these bytes as available, then hand them out on read.
    Data(Vec<u8>),
    /// The availability query fails.
    QueryFails,
    /// Report this many bytes available, then fail the read.
    ReadFails(usize),
}

/// What the scripted transport does when driven.
#[derive(Debug, Clone, Default)]
pub struct Script {
    status: u16,
    raw_headers: Vec<u8>,
    body: Vec<BodyStep>,
    failing: Option<Stage>,
}

impl Script {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_raw_headers(mut self, raw: impl Into<Vec<u8>>) -> Self {
        self.raw_headers = raw.into();
        self
    }

    pub fn with_chunk(mut self, chunk: impl Into<Vec<u8>>) -> Self {
        self.body.push(BodyStep::Data(chunk.into()));
        self
    }

    pub fn with_step(mut self, step: BodyStep) -> Self {
        self.body.push(step);
        self
    }

    pub fn failing_at(mut self, stage: Stage) -> Self {
        self.failing = Some(stage);
        self
    }

    fn check(&self, stage: Stage) -> Result<(), TransportError> {
        if self.failing == Some(stage) {
            Err(TransportError::new(format!("scripted failure at {stage:?}")))
        } else {
            Ok(())
        }
    }
}

/// A call made on the scripted transport, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    OpenSession(String),
    SetTimeouts(Timeouts),
    Connect { host: String, port: u16 },
    OpenRequest { method: Method, path: String, secure: bool },
    AddHeaders(String),
    Send(Vec<u8>),
    ReceiveResponse,
    CloseRequest,
    CloseConnection,
    CloseSession,
}

/// Record of everything the scripted transport was asked to do.
#[derive(Debug, Default)]
pub struct Ledger {
    calls: Vec<Call>,
    sessions_opened: usize,
    sessions_closed: usize,
    connections_opened: usize,
    connections_closed: usize,
    requests_opened: usize,
    requests_closed: usize,
    timeouts: Option<Timeouts>,
}

impl Ledger {
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed
    }

    pub fn connections_opened(&self) -> usize {
        self.connections_opened
    }

    pub fn connections_closed(&self) -> usize {
        self.connections_closed
    }

    pub fn requests_opened(&self) -> usize {
        self.requests_opened
    }

    pub fn requests_closed(&self) -> usize {
        self.requests_closed
    }

    /// Timeouts most recently applied to the live session.
    pub fn timeouts(&self) -> Option<Timeouts> {
        self.timeouts
    }

    /// True when every connection and request opened has been closed.
    pub fn calls_released(&self) -> bool {
        self.connections_opened == self.connections_closed
            && self.requests_opened == self.requests_closed
    }

    /// True when no call ever reached the engine beyond the session setup.
    pub fn untouched_since_session(&self) -> bool {
        self.calls
            .iter()
            .all(|call| matches!(call, Call::OpenSession(_) | Call::SetTimeouts(_)))
    }
}

type SharedLedger = Rc<RefCell<Ledger>>;

/// Transport replaying a `Script`.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    script: Rc<Script>,
    ledger: SharedLedger,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script: Rc::new(script),
            ledger: SharedLedger::default(),
        }
    }

    /// Shared handle to the ledger; stays valid after the transport moves.
    pub fn ledger(&self) -> Rc<RefCell<Ledger>> {
        Rc::clone(&self.ledger)
    }
}

impl Transport for ScriptedTransport {
    type Session = ScriptedSession;

    fn open_session(&self, user_agent: &str) -> Result<ScriptedSession, TransportError> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::OpenSession(user_agent.to_string()));
        self.script.check(Stage::OpenSession)?;
        ledger.sessions_opened += 1;
        Ok(ScriptedSession {
            script: Rc::clone(&self.script),
            ledger: Rc::clone(&self.ledger),
        })
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    script: Rc<Script>,
    ledger: SharedLedger,
}

impl Session for ScriptedSession {
    type Connection = ScriptedConnection;

    fn set_timeouts(&mut self, timeouts: Timeouts) -> Result<(), TransportError> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::SetTimeouts(timeouts));
        self.script.check(Stage::SetTimeouts)?;
        ledger.timeouts = Some(timeouts);
        Ok(())
    }

    fn connect(&self, host: &str, port: u16) -> Result<ScriptedConnection, TransportError> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::Connect {
            host: host.to_string(),
            port,
        });
        self.script.check(Stage::Connect)?;
        ledger.connections_opened += 1;
        Ok(ScriptedConnection {
            script: Rc::clone(&self.script),
            ledger: Rc::clone(&self.ledger),
        })
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::CloseSession);
        ledger.sessions_closed += 1;
    }
}

#[derive(Debug)]
pub struct ScriptedConnection {
    script: Rc<Script>,
    ledger: SharedLedger,
}

impl Connection for ScriptedConnection {
    type Request = ScriptedRequest;

    fn open_request(
        &self,
        method: Method,
        path: &str,
        secure: bool,
    ) -> Result<ScriptedRequest, TransportError> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::OpenRequest {
            method,
            path: path.to_string(),
            secure,
        });
        self.script.check(Stage::OpenRequest)?;
        ledger.requests_opened += 1;
        Ok(ScriptedRequest {
            script: Rc::clone(&self.script),
            ledger: Rc::clone(&self.ledger),
            steps: self.script.body.iter().cloned().collect(),
            pending: Vec::new(),
            pos: 0,
            read_fails: false,
        })
    }
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::CloseConnection);
        ledger.connections_closed += 1;
    }
}

#[derive(Debug)]
pub struct ScriptedRequest {
    script: Rc<Script>,
    ledger: SharedLedger,
    steps: VecDeque<BodyStep>,
    pending: Vec<u8>,
    pos: usize,
    read_fails: bool,
}

impl ScriptedRequest {
    fn record(&self, call: Call) {
        self.ledger.borrow_mut().calls.push(call);
    }
}

impl RequestHandle for ScriptedRequest {
    fn add_headers(&mut self, headers: &str) -> Result<(), TransportError> {
        self.record(Call::AddHeaders(headers.to_string()));
        self.script.check(Stage::AddHeaders)
    }

    fn send(&mut self, body: &[u8]) -> Result<(), TransportError> {
        self.record(Call::Send(body.to_vec()));
        self.script.check(Stage::Send)
    }

    fn receive_response(&mut self) -> Result<(), TransportError> {
        self.record(Call::ReceiveResponse);
        self.script.check(Stage::Receive)
    }

    fn status_code(&self) -> Result<u16, TransportError> {
        Ok(self.script.status)
    }

    fn raw_headers_len(&self) -> Result<usize, TransportError> {
        self.script.check(Stage::HeaderProbe)?;
        Ok(self.script.raw_headers.len())
    }

    fn read_raw_headers(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.script.check(Stage::HeaderFetch)?;
        let raw = &self.script.raw_headers;
        let len = raw.len().min(buf.len());
        buf[..len].copy_from_slice(&raw[..len]);
        Ok(len)
    }

    fn data_available(&mut self) -> Result<usize, TransportError> {
        let remaining = self.pending.len() - self.pos;
        if remaining > 0 || self.read_fails {
            return Ok(remaining);
        }
        match self.steps.pop_front() {
            None => Ok(0),
            Some(BodyStep::Data(bytes)) => {
                self.pending = bytes;
                self.pos = 0;
                Ok(self.pending.len())
            }
            Some(BodyStep::QueryFails) => Err(TransportError::new("scripted availability failure")),
            Some(BodyStep::ReadFails(available)) => {
                self.read_fails = true;
                Ok(available)
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.read_fails {
            return Err(TransportError::new("scripted read failure"));
        }
        let pending = &self.pending[self.pos..];
        let len = pending.len().min(buf.len());
        buf[..len].copy_from_slice(&pending[..len]);
        self.pos += len;
        Ok(len)
    }
}

impl Drop for ScriptedRequest {
    fn drop(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::CloseRequest);
        ledger.requests_closed += 1;
    }
}
