//! C-ABI wrapper around `synchttp-core`.
//!
//! # Overview
//! Exposes the synchronous client through `extern "C"` functions so any
//! language with a C FFI can issue HTTP requests and read complete responses
//! without linking against Rust types.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `http_request` and the per-method shortcuts return a response or null.
//!   `http_execute` returns an `FfiHttpResult` envelope that names the stage
//!   that failed.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `http_*_destroy` or `http_string_free` function.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};

use synchttp_core::{url_encode, ClientConfig, HttpClient, HttpError, Method, Response};
use tracing::{debug, warn};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client. `user_agent` may be null to use the default.
///
/// Returns null if the session cannot be opened, if `user_agent` is not
/// valid UTF-8, or if an internal panic occurs. The caller must release the
/// client with `http_client_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn http_client_create(user_agent: *const c_char) -> *mut FfiHttpClient {
    catch_unwind(|| {
        let user_agent = if user_agent.is_null() {
            None
        } else {
            match unsafe { CStr::from_ptr(user_agent) }.to_str() {
                Ok(ua) => Some(ua),
                Err(_) => return std::ptr::null_mut(),
            }
        };
        match HttpClient::new(user_agent) {
            Ok(client) => Box::into_raw(Box::new(FfiHttpClient { inner: client })),
            Err(err) => {
                debug!(error = %err, "http_client_create failed");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a client from a JSON config such as
/// `{"user_agent": "app/1.0", "timeout_ms": 5000}`. Null selects the
/// defaults.
///
/// Returns null if the JSON is invalid or the session cannot be opened.
#[unsafe(no_mangle)]
pub extern "C" fn http_client_create_with_config(config_json: *const c_char) -> *mut FfiHttpClient {
    catch_unwind(|| {
        let config = if config_json.is_null() {
            ClientConfig::default()
        } else {
            let json = match unsafe { CStr::from_ptr(config_json) }.to_str() {
                Ok(json) => json,
                Err(_) => return std::ptr::null_mut(),
            };
            match ClientConfig::from_json(json) {
                Ok(config) => config,
                Err(err) => {
                    warn!(error = %err, "rejecting client config");
                    return std::ptr::null_mut();
                }
            }
        };
        match HttpClient::with_config(synchttp_core::UreqTransport, &config) {
            Ok(client) => Box::into_raw(Box::new(FfiHttpClient { inner: client })),
            Err(err) => {
                debug!(error = %err, "http_client_create_with_config failed");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Release a client and close its session. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn http_client_destroy(client: *mut FfiHttpClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let client = unsafe { Box::from_raw(client) };
            client.inner.destroy();
        }));
    }
}

/// Apply `timeout_ms` to the resolve, connect, send and receive phases.
///
/// Does nothing when `client` is null. Negative values are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn http_client_set_timeout(client: *mut FfiHttpClient, timeout_ms: c_int) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let Ok(timeout_ms) = u32::try_from(timeout_ms) else {
            warn!(timeout_ms, "ignoring negative timeout");
            return;
        };
        let client = unsafe { &mut *client };
        if let Err(err) = client.inner.set_timeout(timeout_ms) {
            warn!(error = %err, "http_client_set_timeout failed");
        }
    }));
}

/// The client's current timeout in milliseconds, or -1 when `client` is
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn http_client_get_timeout(client: *const FfiHttpClient) -> c_int {
    if client.is_null() {
        return -1;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let client = unsafe { &*client };
        c_int::try_from(client.inner.timeout_ms()).unwrap_or(c_int::MAX)
    }))
    .unwrap_or(-1)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn execute_ffi_request(
    client: &FfiHttpClient,
    request: &FfiHttpRequest,
) -> Result<Response, HttpError> {
    let request = unsafe { request.as_core() }?;
    client.inner.execute(&request)
}

fn response_or_null(result: Result<Response, HttpError>) -> *mut FfiHttpResponse {
    match result {
        Ok(response) => FfiHttpResponse::from_core(response),
        Err(err) => {
            debug!(error = %err, "request failed");
            std::ptr::null_mut()
        }
    }
}

/// Execute `request` and return the complete response.
///
/// Returns null if either argument is null or the request fails at any
/// stage. Non-2xx statuses are responses, not failures. The caller must
/// release the response with `http_response_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn http_request(
    client: *const FfiHttpClient,
    request: *const FfiHttpRequest,
) -> *mut FfiHttpResponse {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() || request.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let request = unsafe { &*request };
        response_or_null(execute_ffi_request(client, request))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Execute `request` and report the outcome in a result envelope.
///
/// Never returns null. The caller must release the result with
/// `http_result_destroy`, which also releases its response.
#[unsafe(no_mangle)]
pub extern "C" fn http_execute(
    client: *const FfiHttpClient,
    request: *const FfiHttpRequest,
) -> *mut FfiHttpResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiHttpResult::null_arg("client");
        }
        if request.is_null() {
            return FfiHttpResult::null_arg("request");
        }
        let client = unsafe { &*client };
        let request = unsafe { &*request };
        match execute_ffi_request(client, request) {
            Ok(response) => FfiHttpResult::ok(response),
            Err(e) => FfiHttpResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiHttpResult::panic("panic in http_execute"))
}

fn optional_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_str().ok()
    }
}

fn shortcut(
    client: *const FfiHttpClient,
    method: Method,
    url: *const c_char,
    data: *const c_char,
    content_type: *const c_char,
) -> *mut FfiHttpResponse {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() || url.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(url) = optional_str(url) else {
            return std::ptr::null_mut();
        };
        let data = if data.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(data) }.to_bytes())
        };
        let content_type = optional_str(content_type);
        let result = match method {
            Method::Post => client.inner.post(url, data, content_type),
            Method::Put => client.inner.put(url, data, content_type),
            Method::Delete => client.inner.delete(url),
            _ => client.inner.get(url),
        };
        response_or_null(result)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// GET `url`. Returns null on failure.
#[unsafe(no_mangle)]
pub extern "C" fn http_get(client: *const FfiHttpClient, url: *const c_char) -> *mut FfiHttpResponse {
    shortcut(client, Method::Get, url, std::ptr::null(), std::ptr::null())
}

/// POST the NUL-terminated `data` to `url`. `data` and `content_type` may
/// be null. Returns null on failure.
#[unsafe(no_mangle)]
pub extern "C" fn http_post(
    client: *const FfiHttpClient,
    url: *const c_char,
    data: *const c_char,
    content_type: *const c_char,
) -> *mut FfiHttpResponse {
    shortcut(client, Method::Post, url, data, content_type)
}

/// PUT the NUL-terminated `data` to `url`. `data` and `content_type` may
/// be null. Returns null on failure.
#[unsafe(no_mangle)]
pub extern "C" fn http_put(
    client: *const FfiHttpClient,
    url: *const c_char,
    data: *const c_char,
    content_type: *const c_char,
) -> *mut FfiHttpResponse {
    shortcut(client, Method::Put, url, data, content_type)
}

/// DELETE `url`. Returns null on failure.
#[unsafe(no_mangle)]
pub extern "C" fn http_delete(
    client: *const FfiHttpClient,
    url: *const c_char,
) -> *mut FfiHttpResponse {
    shortcut(client, Method::Delete, url, std::ptr::null(), std::ptr::null())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Percent-encode a NUL-terminated string.
///
/// Returns null when `input` is null. The caller must release the result
/// with `http_string_free`.
#[unsafe(no_mangle)]
pub extern "C" fn http_url_encode(input: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        if input.is_null() {
            return std::ptr::null_mut();
        }
        let bytes = unsafe { CStr::from_ptr(input) }.to_bytes();
        // Encoded output is ASCII without NUL bytes.
        CString::new(url_encode(bytes))
            .map(CString::into_raw)
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Release a response returned by `http_request` or a method shortcut.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn http_response_destroy(response: *mut FfiHttpResponse) {
    if response.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpResponse::release(response) });
}

/// Release a result returned by `http_execute`, including its message and
/// response. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn http_result_destroy(result: *mut FfiHttpResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.response.is_null() {
            unsafe { FfiHttpResponse::release(result.response) };
        }
    });
}

/// Release a string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn http_string_free(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> *mut FfiHttpClient {
        let ua = CString::new("ffi-test/1.0").unwrap();
        let client = http_client_create(ua.as_ptr());
        assert!(!client.is_null());
        client
    }

    #[test]
    fn client_create_and_destroy() {
        let client = client();
        assert_eq!(unsafe { &*client }.inner.user_agent(), "ffi-test/1.0");
        http_client_destroy(client);
    }

    #[test]
    fn client_create_with_null_user_agent_uses_default() {
        let client = http_client_create(std::ptr::null());
        assert!(!client.is_null());
        assert_eq!(
            unsafe { &*client }.inner.user_agent(),
            synchttp_core::DEFAULT_USER_AGENT
        );
        http_client_destroy(client);
    }

    #[test]
    fn client_destroy_null_is_safe() {
        http_client_destroy(std::ptr::null_mut());
    }

    #[test]
    fn client_create_with_config() {
        let json = CString::new(r#"{"user_agent":"cfg/1.0","timeout_ms":2500}"#).unwrap();
        let client = http_client_create_with_config(json.as_ptr());
        assert!(!client.is_null());
        assert_eq!(unsafe { &*client }.inner.user_agent(), "cfg/1.0");
        assert_eq!(http_client_get_timeout(client), 2500);
        http_client_destroy(client);
    }

    #[test]
    fn client_create_with_bad_config_returns_null() {
        let json = CString::new("{not json").unwrap();
        assert!(http_client_create_with_config(json.as_ptr()).is_null());
    }

    #[test]
    fn set_timeout_updates_client() {
        let client = client();
        assert_eq!(http_client_get_timeout(client), 30_000);
        http_client_set_timeout(client, 5_000);
        assert_eq!(http_client_get_timeout(client), 5_000);
        http_client_destroy(client);
    }

    #[test]
    fn negative_timeout_is_ignored() {
        let client = client();
        http_client_set_timeout(client, -1);
        assert_eq!(http_client_get_timeout(client), 30_000);
        http_client_destroy(client);
    }

    #[test]
    fn set_timeout_on_null_client_is_noop() {
        http_client_set_timeout(std::ptr::null_mut(), 1_000);
        assert_eq!(http_client_get_timeout(std::ptr::null()), -1);
    }

    #[test]
    fn method_codes_match_core() {
        assert_eq!(Method::from_code(FfiHttpMethod::Get as c_int), Method::Get);
        assert_eq!(Method::from_code(FfiHttpMethod::Post as c_int), Method::Post);
        assert_eq!(Method::from_code(FfiHttpMethod::Put as c_int), Method::Put);
        assert_eq!(Method::from_code(FfiHttpMethod::Delete as c_int), Method::Delete);
        assert_eq!(Method::from_code(FfiHttpMethod::Patch as c_int), Method::Patch);
        assert_eq!(Method::from_code(42), Method::Get);
    }

    #[test]
    fn request_with_null_arguments_returns_null() {
        let client = client();
        assert!(http_request(client, std::ptr::null()).is_null());
        let url = CString::new("http://localhost/").unwrap();
        let request = FfiHttpRequest {
            method: 0,
            url: url.as_ptr(),
            headers: std::ptr::null(),
            body: std::ptr::null(),
            body_length: 0,
        };
        assert!(http_request(std::ptr::null(), &request).is_null());
        http_client_destroy(client);
    }

    #[test]
    fn execute_null_url_is_invalid_argument() {
        let client = client();
        let request = FfiHttpRequest {
            method: 0,
            url: std::ptr::null(),
            headers: std::ptr::null(),
            body: std::ptr::null(),
            body_length: 0,
        };
        let result = http_execute(client, &request);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::InvalidArgument);
        assert!(!r.error_message.is_null());
        assert!(r.response.is_null());
        http_result_destroy(result);
        http_client_destroy(client);
    }

    #[test]
    fn execute_null_client_is_invalid_argument() {
        let result = http_execute(std::ptr::null(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::InvalidArgument);
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert_eq!(msg, "null argument: client");
        http_result_destroy(result);
    }

    #[test]
    fn execute_malformed_url_names_the_stage() {
        let client = client();
        let url = CString::new("not a url").unwrap();
        let request = FfiHttpRequest {
            method: 0,
            url: url.as_ptr(),
            headers: std::ptr::null(),
            body: std::ptr::null(),
            body_length: 0,
        };
        let result = http_execute(client, &request);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::MalformedUrl);
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert_eq!(msg, "malformed url: url has no scheme");
        http_result_destroy(result);
        http_client_destroy(client);
    }

    #[test]
    fn shortcuts_with_null_arguments_return_null() {
        let client = client();
        let url = CString::new("http://localhost/").unwrap();
        assert!(http_get(client, std::ptr::null()).is_null());
        assert!(http_get(std::ptr::null(), url.as_ptr()).is_null());
        assert!(http_post(std::ptr::null(), url.as_ptr(), std::ptr::null(), std::ptr::null()).is_null());
        assert!(http_put(client, std::ptr::null(), std::ptr::null(), std::ptr::null()).is_null());
        assert!(http_delete(client, std::ptr::null()).is_null());
        http_client_destroy(client);
    }

    #[test]
    fn shortcut_with_malformed_url_returns_null() {
        let client = client();
        let url = CString::new("ftp://example.com/").unwrap();
        assert!(http_get(client, url.as_ptr()).is_null());
        http_client_destroy(client);
    }

    #[test]
    fn url_encode_round_trip() {
        let input = CString::new("hello world&x=1").unwrap();
        let encoded = http_url_encode(input.as_ptr());
        assert!(!encoded.is_null());
        let s = unsafe { CStr::from_ptr(encoded) }.to_str().unwrap();
        assert_eq!(s, "hello%20world%26x%3D1");
        http_string_free(encoded);
    }

    #[test]
    fn url_encode_null_returns_null() {
        assert!(http_url_encode(std::ptr::null()).is_null());
    }

    #[test]
    fn response_conversion_keeps_body_and_headers() {
        let response = Response::from_parts(
            201,
            Some("HTTP/1.1 201 Created\r\nX-A: 1\r\n\r\n".to_string()),
            Some(b"abc".to_vec()),
        );
        let ffi = FfiHttpResponse::from_core(response);
        let r = unsafe { &*ffi };
        assert_eq!(r.status_code, 201);
        assert_eq!(r.body_length, 3);
        let body = unsafe { std::slice::from_raw_parts(r.body as *const u8, r.body_length + 1) };
        assert_eq!(body, &b"abc\0"[..]);
        let headers = unsafe { CStr::from_ptr(r.headers) }.to_str().unwrap();
        assert!(headers.contains("X-A: 1"));
        assert_eq!(r.headers_length, headers.len());
        assert!(!r.degraded);
        http_response_destroy(ffi);
    }

    #[test]
    fn header_block_with_nul_is_dropped_and_flagged() {
        let response = Response::from_parts(
            200,
            Some("HTTP/1.1 200 OK\r\nX-Bad: a\0b\r\n\r\n".to_string()),
            Some(b"ok".to_vec()),
        );
        let ffi = FfiHttpResponse::from_core(response);
        let r = unsafe { &*ffi };
        assert!(r.headers.is_null());
        assert_eq!(r.headers_length, 0);
        assert!(r.degraded);
        assert_eq!(r.body_length, 2);
        http_response_destroy(ffi);
    }

    #[test]
    fn empty_response_has_null_body() {
        let ffi = FfiHttpResponse::from_core(Response::from_parts(204, None, None));
        let r = unsafe { &*ffi };
        assert!(r.body.is_null());
        assert_eq!(r.body_length, 0);
        assert!(r.headers.is_null());
        assert_eq!(r.headers_length, 0);
        http_response_destroy(ffi);
    }

    #[test]
    fn free_functions_accept_null() {
        http_response_destroy(std::ptr::null_mut());
        http_result_destroy(std::ptr::null_mut());
        http_string_free(std::ptr::null_mut());
    }
}
