//! Request execution: from a `Request` to a fully read `Response`.
//!
//! # Design
//! `execute` runs the stages in a fixed order: decompose the URL, connect,
//! open the request, attach headers, send, wait for the response, read the
//! status and header block, drain the body. Each handle is a local owned by
//! this call, so every early return through `?` closes exactly the handles
//! opened so far, newest first.
//!
//! Two failures are absorbed instead of aborting: the caller's headers not
//! being attached, and the response header block or body not being fully
//! readable. The response still comes back, with the absorbed failures listed
//! in `Response::degradations`.

use tracing::{debug, warn};

use crate::body::drain_body;
use crate::buffer::probe_then_fill;
use crate::client::HttpClient;
use crate::error::{HttpError, TransportError};
use crate::http::{Degradation, Method, Request, Response};
use crate::transport::{Connection, RequestHandle, Session, Transport};
use crate::url::UrlComponents;

impl<T: Transport> HttpClient<T> {
    /// Execute `request` and return the complete response.
    pub fn execute(&self, request: &Request<'_>) -> Result<Response, HttpError> {
        if request.url.is_empty() {
            return Err(HttpError::InvalidArgument("request url is empty"));
        }

        let url = UrlComponents::decompose(request.url)?;
        debug!(
            method = request.method.as_str(),
            host = url.host(),
            port = url.port(),
            path = url.path(),
            "executing request"
        );

        let connection = self
            .session()
            .connect(url.host(), url.port())
            .map_err(HttpError::ConnectionFailed)?;

        let mut handle = connection
            .open_request(request.method, url.path(), url.is_secure())
            .map_err(HttpError::RequestOpenFailed)?;
        drop(url);

        let mut degradations = Vec::new();
        if let Some(headers) = request.headers {
            if let Err(err) = handle.add_headers(headers) {
                warn!(error = %err, "request headers were not attached, sending without them");
                degradations.push(Degradation::HeadersNotAttached);
            }
        }

        handle
            .send(request.body_bytes())
            .map_err(HttpError::SendFailed)?;
        handle
            .receive_response()
            .map_err(HttpError::ReceiveFailed)?;
        let status = handle.status_code().map_err(HttpError::ReceiveFailed)?;
        debug!(status, "response received");

        let headers = match read_header_block(&handle) {
            Ok(headers) => headers,
            Err(err) => {
                warn!(error = %err, "response headers unavailable");
                degradations.push(Degradation::HeadersUnavailable);
                None
            }
        };

        let drained = drain_body(&mut handle);
        degradations.extend(drained.degradation);
        let response = Response {
            status,
            headers,
            body: drained.body,
            degradations,
        };
        debug!(
            status,
            body_len = response.body_len(),
            headers_len = response.headers_len(),
            clean = response.is_clean(),
            "request complete"
        );
        Ok(response)
    }

    pub fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.execute(&Request::get(url))
    }

    /// POST `data`, labelled with `content_type` when given.
    pub fn post(
        &self,
        url: &str,
        data: Option<&[u8]>,
        content_type: Option<&str>,
    ) -> Result<Response, HttpError> {
        self.execute_with_body(Method::Post, url, data, content_type)
    }

    /// PUT `data`, labelled with `content_type` when given.
    pub fn put(
        &self,
        url: &str,
        data: Option<&[u8]>,
        content_type: Option<&str>,
    ) -> Result<Response, HttpError> {
        self.execute_with_body(Method::Put, url, data, content_type)
    }

    pub fn delete(&self, url: &str) -> Result<Response, HttpError> {
        self.execute(&Request::delete(url))
    }

    fn execute_with_body(
        &self,
        method: Method,
        url: &str,
        data: Option<&[u8]>,
        content_type: Option<&str>,
    ) -> Result<Response, HttpError> {
        let headers = content_type.map(|ct| format!("Content-Type: {ct}\r\n"));
        self.execute(&Request {
            method,
            url,
            headers: headers.as_deref(),
            body: data,
        })
    }
}

/// Fetch the raw header block. A transport reporting no header bytes yields
/// `None`.
fn read_header_block<R: RequestHandle>(handle: &R) -> Result<Option<String>, TransportError> {
    let raw = probe_then_fill(
        || handle.raw_headers_len(),
        |buf| handle.read_raw_headers(buf),
    )?;
    if raw.is_empty() {
        return Ok(None);
    }
    String::from_utf8(raw)
        .map(Some)
        .map_err(|_| TransportError::new("response header block is not valid UTF-8"))
}
