//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, a raw byte buffer instead of `Vec`, and
//! plain integers where C may pass values outside an enum's range. Conversion
//! and release helpers live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};

use synchttp_core::{HttpClient, HttpError, Method, Request, Response};
use tracing::warn;

/// Opaque handle to an `HttpClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiHttpClient {
    pub(crate) inner: HttpClient,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Method codes accepted in `FfiHttpRequest::method`. Any other value is
/// sent as GET.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
    Patch = 4,
}

/// A request described by the C caller. Nothing in it is freed by the
/// library.
///
/// `headers` is an optional NUL-terminated block of CRLF-separated
/// `Key: Value` lines. `body` may be null; otherwise `body_length` bytes are
/// sent.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: c_int,
    pub url: *const c_char,
    pub headers: *const c_char,
    pub body: *const c_char,
    pub body_length: usize,
}

impl FfiHttpRequest {
    /// Borrow the C fields as a core `Request`.
    ///
    /// # Safety
    /// `url` and `headers`, when non-null, must point to NUL-terminated
    /// strings, and `body`, when non-null, to at least `body_length` bytes,
    /// all valid for the lifetime of `self`.
    pub(crate) unsafe fn as_core(&self) -> Result<Request<'_>, HttpError> {
        if self.url.is_null() {
            return Err(HttpError::InvalidArgument("null url"));
        }
        let url = unsafe { CStr::from_ptr(self.url) }
            .to_str()
            .map_err(|_| HttpError::InvalidArgument("url is not valid UTF-8"))?;
        let headers = if self.headers.is_null() {
            None
        } else {
            Some(
                unsafe { CStr::from_ptr(self.headers) }
                    .to_str()
                    .map_err(|_| HttpError::InvalidArgument("headers are not valid UTF-8"))?,
            )
        };
        let body = if self.body.is_null() || self.body_length == 0 {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(self.body as *const u8, self.body_length) })
        };
        Ok(Request {
            method: Method::from_code(self.method),
            url,
            headers,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A complete response, owned by the C caller until passed to
/// `http_response_destroy`.
///
/// `body` is null when the body is empty; otherwise it holds `body_length`
/// bytes followed by a NUL terminator. `headers` is the raw header block as
/// a C string, or null when it could not be read. `degraded` is true when a
/// failure was absorbed while building the response (headers not attached,
/// header block unavailable, body truncated or dropped).
#[repr(C)]
pub struct FfiHttpResponse {
    pub status_code: c_int,
    pub headers: *mut c_char,
    pub body: *mut c_char,
    pub body_length: usize,
    pub headers_length: usize,
    pub degraded: bool,
}

impl FfiHttpResponse {
    /// Convert a core `Response` into a heap-allocated `FfiHttpResponse`.
    pub(crate) fn from_core(response: Response) -> *mut Self {
        let status_code = c_int::from(response.status());
        let mut degraded = !response.is_clean();

        let (headers, headers_length) = match response.headers().map(CString::new) {
            Some(Ok(headers)) => {
                let len = headers.as_bytes().len();
                (headers.into_raw(), len)
            }
            Some(Err(err)) => {
                warn!(error = %err, "header block has an interior NUL, dropping it");
                degraded = true;
                (std::ptr::null_mut(), 0)
            }
            None => (std::ptr::null_mut(), 0),
        };

        let mut body = response.into_body();
        let body_length = body.len();
        let body = if body.is_empty() {
            std::ptr::null_mut()
        } else {
            body.push(0);
            Box::into_raw(body.into_boxed_slice()) as *mut u8 as *mut c_char
        };

        Box::into_raw(Box::new(FfiHttpResponse {
            status_code,
            headers,
            body,
            body_length,
            headers_length,
            degraded,
        }))
    }

    /// Release a response produced by `from_core`, fields included.
    ///
    /// # Safety
    /// `response` must come from `from_core` and not have been released.
    pub(crate) unsafe fn release(response: *mut Self) {
        let response = unsafe { Box::from_raw(response) };
        if !response.headers.is_null() {
            drop(unsafe { CString::from_raw(response.headers) });
        }
        if !response.body.is_null() {
            let body = std::ptr::slice_from_raw_parts_mut(
                response.body as *mut u8,
                response.body_length + 1,
            );
            drop(unsafe { Box::from_raw(body) });
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiHttpResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidArgument = 1,
    MalformedUrl = 2,
    ResourceExhausted = 3,
    SessionInitFailed = 4,
    ConnectionFailed = 5,
    RequestOpenFailed = 6,
    SendFailed = 7,
    ReceiveFailed = 8,
    Panic = 9,
}

impl From<&HttpError> for FfiErrorCode {
    fn from(err: &HttpError) -> Self {
        match err {
            HttpError::InvalidArgument(_) => FfiErrorCode::InvalidArgument,
            HttpError::MalformedUrl(_) => FfiErrorCode::MalformedUrl,
            HttpError::ResourceExhausted => FfiErrorCode::ResourceExhausted,
            HttpError::SessionInitFailed(_) => FfiErrorCode::SessionInitFailed,
            HttpError::ConnectionFailed(_) => FfiErrorCode::ConnectionFailed,
            HttpError::RequestOpenFailed(_) => FfiErrorCode::RequestOpenFailed,
            HttpError::SendFailed(_) => FfiErrorCode::SendFailed,
            HttpError::ReceiveFailed(_) => FfiErrorCode::ReceiveFailed,
        }
    }
}

/// Result envelope for `http_execute`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `response`
/// points to the response. On failure `error_code` names the stage that
/// failed, `error_message` describes the failure and its causes, and
/// `response` is null.
#[repr(C)]
pub struct FfiHttpResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub response: *mut FfiHttpResponse,
}

impl FfiHttpResult {
    pub(crate) fn ok(response: Response) -> *mut Self {
        Box::into_raw(Box::new(FfiHttpResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            response: FfiHttpResponse::from_core(response),
        }))
    }

    /// Build an error result from an `HttpError`, its cause chain joined
    /// into the message.
    pub(crate) fn from_error(err: HttpError) -> *mut Self {
        let error_code = FfiErrorCode::from(&err);
        let mut msg = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            let cause_msg = cause.to_string();
            if !msg.ends_with(&cause_msg) {
                msg.push_str(": ");
                msg.push_str(&cause_msg);
            }
            source = cause.source();
        }
        Self::failure(error_code, &msg)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::InvalidArgument, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }

    fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiHttpResult {
            error_code,
            error_message: CString::new(msg.replace('\0', " ")).unwrap_or_default().into_raw(),
            response: std::ptr::null_mut(),
        }))
    }
}
