//! Request and response values exchanged with `HttpClient`.
//!
//! # Design
//! `Request` borrows everything it carries: the URL, the raw header block and
//! the body stay owned by the caller, which matters at the FFI boundary where
//! they point into C memory. `Response` owns its data and is handed to the
//! caller only once the body has been drained completely.

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    /// Map a numeric method code (GET=0 .. PATCH=4). Unknown codes fall back
    /// to `Get`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Method::Post,
            2 => Method::Put,
            3 => Method::Delete,
            4 => Method::Patch,
            _ => Method::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

/// A single request to execute.
///
/// `headers` is a raw header block: CRLF-terminated `Key: Value` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Request<'a> {
    pub method: Method,
    pub url: &'a str,
    pub headers: Option<&'a str>,
    pub body: Option<&'a [u8]>,
}

impl<'a> Request<'a> {
    pub fn new(method: Method, url: &'a str) -> Self {
        Self {
            method,
            url,
            headers: None,
            body: None,
        }
    }

    pub fn get(url: &'a str) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: &'a str) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: &'a str) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: &'a str) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn patch(url: &'a str) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn with_headers(mut self, headers: &'a str) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = Some(body);
        self
    }

    /// Body bytes to transmit; empty when the request has no body.
    pub fn body_bytes(&self) -> &'a [u8] {
        self.body.unwrap_or_default()
    }

    pub fn body_len(&self) -> usize {
        self.body_bytes().len()
    }
}

/// A failure that was absorbed while producing a `Response`.
///
/// The response is still returned, but it may be missing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// The caller's header block was not attached to the request.
    HeadersNotAttached,
    /// The response header block could not be fetched or decoded.
    HeadersUnavailable,
    /// Reading the body stopped early; the body holds what arrived before.
    BodyTruncated,
    /// The body buffer could not grow; the body was dropped entirely.
    BodyDiscarded,
}

/// A complete HTTP response.
///
/// A present body is never empty: a zero-length body is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub(crate) status: u16,
    pub(crate) headers: Option<String>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) degradations: Vec<Degradation>,
}

impl Response {
    /// Assemble a clean response. An empty body is stored as absent.
    pub fn from_parts(status: u16, headers: Option<String>, body: Option<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.filter(|b| !b.is_empty()),
            degradations: Vec::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The raw header block as received, if it could be read.
    pub fn headers(&self) -> Option<&str> {
        self.headers.as_deref()
    }

    pub fn headers_len(&self) -> usize {
        self.headers.as_ref().map_or(0, String::len)
    }

    /// Look up the first header named `name` (case-insensitive) in the raw
    /// header block.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers()?
            .split("\r\n")
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// Consume the response and return the body bytes (empty when absent).
    pub fn into_body(self) -> Vec<u8> {
        self.body.unwrap_or_default()
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.body().unwrap_or_default()).into_owned()
    }

    /// Failures that were absorbed while building this response.
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// True when nothing was absorbed along the way.
    pub fn is_clean(&self) -> bool {
        self.degradations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_codes_map_to_verbs() {
        assert_eq!(Method::from_code(0).as_str(), "GET");
        assert_eq!(Method::from_code(1).as_str(), "POST");
        assert_eq!(Method::from_code(2).as_str(), "PUT");
        assert_eq!(Method::from_code(3).as_str(), "DELETE");
        assert_eq!(Method::from_code(4).as_str(), "PATCH");
    }

    #[test]
    fn unknown_method_code_falls_back_to_get() {
        assert_eq!(Method::from_code(5), Method::Get);
        assert_eq!(Method::from_code(-1), Method::Get);
    }

    #[test]
    fn request_body_length_follows_body() {
        let req = Request::post("http://example.com/").with_body(b"abc");
        assert_eq!(req.body_len(), 3);
        assert_eq!(Request::get("http://example.com/").body_len(), 0);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = Response {
            status: 200,
            headers: Some("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-Id: 7\r\n\r\n".to_string()),
            body: None,
            degradations: Vec::new(),
        };
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.header("x-id"), Some("7"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn absent_body_has_zero_length() {
        let response = Response::default();
        assert_eq!(response.body_len(), 0);
        assert_eq!(response.headers_len(), 0);
        assert_eq!(response.text(), "");
        assert!(response.is_clean());
    }

    #[test]
    fn from_parts_drops_empty_body() {
        let response = Response::from_parts(204, None, Some(Vec::new()));
        assert_eq!(response.body(), None);
        assert!(response.is_clean());
    }
}
