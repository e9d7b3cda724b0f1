//! `Transport` backed by a `ureq` agent.
//!
//! # Design
//! `ureq` performs the whole network round trip inside one call, so the
//! handle stages map onto it as follows: connecting only records the target
//! (the connection is established lazily, on send), sending runs the call
//! and keeps the response, and receiving checks that a response is held.
//! The session owns an agent configured with the current timeouts; changing
//! the timeouts rebuilds the agent. Redirects are not followed and error
//! statuses are returned as ordinary responses.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use tracing::trace;
use ureq::http::{self, HeaderName, HeaderValue};
use ureq::{Agent, Body, BodyReader, RequestBuilder};

use super::{Connection, RequestHandle, Session, Timeouts, Transport};
use crate::error::TransportError;
use crate::http::Method;

/// Largest chunk pulled from the body reader per availability query.
const READ_CHUNK: usize = 8 * 1024;

/// Production transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    type Session = UreqSession;

    fn open_session(&self, user_agent: &str) -> Result<UreqSession, TransportError> {
        HeaderValue::from_str(user_agent)
            .map_err(|e| TransportError::new(format!("invalid user agent: {e}")))?;
        Ok(UreqSession {
            agent: build_agent(None),
            user_agent: user_agent.to_string(),
            timeouts: None,
        })
    }
}

fn build_agent(timeouts: Option<Timeouts>) -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0);
    let config = match timeouts {
        Some(t) => config
            .timeout_resolve(phase_limit(t.resolve))
            .timeout_connect(phase_limit(t.connect))
            .timeout_send_request(phase_limit(t.send))
            .timeout_send_body(phase_limit(t.send))
            .timeout_recv_response(phase_limit(t.receive))
            .timeout_recv_body(phase_limit(t.receive)),
        None => config,
    };
    config.build().new_agent()
}

/// A zero timeout waits indefinitely.
fn phase_limit(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

#[derive(Debug)]
pub struct UreqSession {
    agent: Agent,
    user_agent: String,
    timeouts: Option<Timeouts>,
}

impl UreqSession {
    /// Timeouts currently applied to the agent, if any were set.
    pub fn timeouts(&self) -> Option<Timeouts> {
        self.timeouts
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Session for UreqSession {
    type Connection = UreqConnection;

    fn set_timeouts(&mut self, timeouts: Timeouts) -> Result<(), TransportError> {
        self.agent = build_agent(Some(timeouts));
        self.timeouts = Some(timeouts);
        Ok(())
    }

    fn connect(&self, host: &str, port: u16) -> Result<UreqConnection, TransportError> {
        if host.is_empty() {
            return Err(TransportError::new("empty host"));
        }
        Ok(UreqConnection {
            agent: self.agent.clone(),
            user_agent: self.user_agent.clone(),
            host: host.to_string(),
            port,
        })
    }
}

#[derive(Debug)]
pub struct UreqConnection {
    agent: Agent,
    user_agent: String,
    host: String,
    port: u16,
}

impl Connection for UreqConnection {
    type Request = UreqRequest;

    fn open_request(
        &self,
        method: Method,
        path: &str,
        secure: bool,
    ) -> Result<UreqRequest, TransportError> {
        let scheme = if secure { "https" } else { "http" };
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let url = format!("{scheme}://{host}:{}{path}", self.port);
        url.parse::<http::Uri>()
            .map_err(|e| TransportError::new(format!("invalid request target `{url}`: {e}")))?;

        Ok(UreqRequest {
            agent: self.agent.clone(),
            method,
            url,
            headers: vec![("User-Agent".to_string(), self.user_agent.clone())],
            exchange: None,
        })
    }
}

pub struct UreqRequest {
    agent: Agent,
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    exchange: Option<Exchange>,
}

/// A received response whose body is still being read.
struct Exchange {
    status: u16,
    raw_headers: Vec<u8>,
    reader: BodyReader<'static>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Exchange {
    fn new(response: http::Response<Body>) -> Self {
        let status = response.status().as_u16();
        let raw_headers = raw_header_block(&response);
        Self {
            status,
            raw_headers,
            reader: response.into_body().into_reader(),
            chunk: Vec::new(),
            pos: 0,
        }
    }

    fn pending(&self) -> &[u8] {
        &self.chunk[self.pos..]
    }
}

impl UreqRequest {
    fn exchange(&self) -> Result<&Exchange, TransportError> {
        self.exchange
            .as_ref()
            .ok_or_else(|| TransportError::new("no response received"))
    }

    fn exchange_mut(&mut self) -> Result<&mut Exchange, TransportError> {
        self.exchange
            .as_mut()
            .ok_or_else(|| TransportError::new("no response received"))
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Render the status line and headers the way they arrived on the wire.
fn raw_header_block(response: &http::Response<Body>) -> Vec<u8> {
    let status = response.status();
    let mut block = format!(
        "{:?} {} {}\r\n",
        response.version(),
        status.as_str(),
        status.canonical_reason().unwrap_or_default()
    )
    .into_bytes();
    for (name, value) in response.headers() {
        block.extend_from_slice(name.as_str().as_bytes());
        block.extend_from_slice(b": ");
        block.extend_from_slice(value.as_bytes());
        block.extend_from_slice(b"\r\n");
    }
    block.extend_from_slice(b"\r\n");
    block
}

fn is_user_agent(name: &str) -> bool {
    name.eq_ignore_ascii_case(http::header::USER_AGENT.as_str())
}

/// Parse a CRLF-separated header block into name/value pairs.
fn parse_header_block(raw: &str) -> Result<Vec<(String, String)>, TransportError> {
    let mut parsed = Vec::new();
    for line in raw.lines().map(str::trim_end).filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| TransportError::new(format!("malformed header line `{line}`")))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| TransportError::new(format!("invalid header name: {e}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| TransportError::new(format!("invalid header value: {e}")))?;
        let value = value
            .to_str()
            .map_err(|e| TransportError::new(format!("invalid header value: {e}")))?
            .to_string();
        parsed.push((name.as_str().to_string(), value));
    }
    Ok(parsed)
}

impl RequestHandle for UreqRequest {
    fn add_headers(&mut self, headers: &str) -> Result<(), TransportError> {
        let parsed = parse_header_block(headers)?;
        // A caller user agent replaces the session default.
        if parsed.iter().any(|(name, _)| is_user_agent(name)) {
            self.headers.retain(|(name, _)| !is_user_agent(name));
        }
        self.headers.extend(parsed);
        Ok(())
    }

    fn send(&mut self, body: &[u8]) -> Result<(), TransportError> {
        let url = self.url.as_str();
        let headers = self.headers.as_slice();
        trace!(method = self.method.as_str(), url, body_len = body.len(), "ureq call");

        let response = match self.method {
            Method::Get | Method::Delete => {
                let builder = match self.method {
                    Method::Delete => self.agent.delete(url),
                    _ => self.agent.get(url),
                };
                let builder = with_headers(builder, headers);
                if body.is_empty() {
                    builder.call()
                } else {
                    builder.force_send_body().send(body)
                }
            }
            Method::Post => with_headers(self.agent.post(url), headers).send(body),
            Method::Put => with_headers(self.agent.put(url), headers).send(body),
            Method::Patch => with_headers(self.agent.patch(url), headers).send(body),
        }?;

        self.exchange = Some(Exchange::new(response));
        Ok(())
    }

    fn receive_response(&mut self) -> Result<(), TransportError> {
        self.exchange().map(|_| ())
    }

    fn status_code(&self) -> Result<u16, TransportError> {
        Ok(self.exchange()?.status)
    }

    fn raw_headers_len(&self) -> Result<usize, TransportError> {
        Ok(self.exchange()?.raw_headers.len())
    }

    fn read_raw_headers(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let raw = &self.exchange()?.raw_headers;
        let len = raw.len().min(buf.len());
        buf[..len].copy_from_slice(&raw[..len]);
        Ok(len)
    }

    fn data_available(&mut self) -> Result<usize, TransportError> {
        let exchange = self.exchange_mut()?;
        if !exchange.pending().is_empty() {
            return Ok(exchange.pending().len());
        }
        exchange.chunk.resize(READ_CHUNK, 0);
        exchange.pos = 0;
        loop {
            match exchange.reader.read(&mut exchange.chunk) {
                Ok(n) => {
                    exchange.chunk.truncate(n);
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    exchange.chunk.clear();
                    return Err(e.into());
                }
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let exchange = self.exchange_mut()?;
        let pending = exchange.pending();
        if pending.is_empty() {
            return Ok(exchange.reader.read(buf)?);
        }
        let len = pending.len().min(buf.len());
        buf[..len].copy_from_slice(&pending[..len]);
        exchange.pos += len;
        Ok(len)
    }
}
