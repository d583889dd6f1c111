//! Captured request/response records.
//!
//! A [`CapturedCall`] is one observed exchange: the request exactly as
//! handed to the transport, the first response of the redirect chain,
//! the auxiliary call options, and an optional call-site stack. Records
//! are immutable after construction; the rendered display fields are
//! memoized pure functions over the immutable data, computed on first
//! access and cached for the record's lifetime.

use crate::config::InspectConfig;
use crate::{format, stack};
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

/// An outgoing request as handed to the transport.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// HTTP method.
    pub method: Method,
    /// Full request URL.
    pub url: Url,
    /// Request headers as sent.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<Bytes>,
}

/// A buffered response as returned by the transport.
#[derive(Debug, Clone)]
pub struct CallResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Buffered response body.
    pub body: Bytes,
    /// Time from dispatching the request until response headers arrived.
    pub elapsed: Duration,
}

impl CallResponse {
    /// Decode the body for display (JSON pretty-printed when the
    /// content type indicates JSON, UTF-8 otherwise).
    pub fn body_text(&self) -> String {
        format::decode_body(&self.headers, &self.body)
    }
}

/// Auxiliary per-call parameters passed through to the transport.
/// Opaque to the capture layer; kept on the record for display only.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
}

impl std::fmt::Display for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.timeout {
            Some(timeout) => write!(f, "timeout={timeout:?}"),
            None => write!(f, "defaults"),
        }
    }
}

/// One observed request/response pair.
#[derive(Debug)]
pub struct CapturedCall {
    request: CallRequest,
    response: CallResponse,
    options: CallOptions,
    frames: Vec<String>,
    config: Arc<InspectConfig>,

    // Memoized display fields. Computed at most once; the record is
    // otherwise immutable after construction.
    request_headers_text: OnceLock<String>,
    request_body_text: OnceLock<String>,
    response_headers_text: OnceLock<String>,
    response_body_text: OnceLock<String>,
    stack_text: OnceLock<String>,
}

impl CapturedCall {
    pub(crate) fn new(
        request: CallRequest,
        response: CallResponse,
        options: CallOptions,
        frames: Vec<String>,
        config: Arc<InspectConfig>,
    ) -> Self {
        Self {
            request,
            response,
            options,
            frames,
            config,
            request_headers_text: OnceLock::new(),
            request_body_text: OnceLock::new(),
            response_headers_text: OnceLock::new(),
            response_body_text: OnceLock::new(),
            stack_text: OnceLock::new(),
        }
    }

    /// The request as sent.
    pub fn request(&self) -> &CallRequest {
        &self.request
    }

    /// The captured response. When the transport followed redirects,
    /// this is the first response of the chain (the one answering the
    /// original request), not the final one.
    pub fn response(&self) -> &CallResponse {
        &self.response
    }

    /// Auxiliary call parameters, for display.
    pub fn options(&self) -> &CallOptions {
        &self.options
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.request.method
    }

    /// Request URL.
    pub fn url(&self) -> &Url {
        &self.request.url
    }

    /// Captured response status.
    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Elapsed time of the captured response.
    pub fn elapsed(&self) -> Duration {
        self.response.elapsed
    }

    /// Raw captured stack frames; empty when stack capture is disabled.
    pub fn stack_frames(&self) -> &[String] {
        &self.frames
    }

    /// Request headers rendered one per line, sensitive values masked.
    pub fn request_headers_text(&self) -> &str {
        self.request_headers_text
            .get_or_init(|| format::header_lines(&self.request.headers, Some(&self.config)))
    }

    /// Decoded request body: JSON pretty-printed with sorted keys when
    /// the content type indicates JSON, UTF-8 decoded otherwise. Empty
    /// string when the request had no body.
    pub fn request_body_text(&self) -> &str {
        self.request_body_text.get_or_init(|| {
            match self.request.body.as_deref() {
                Some(body) => format::decode_body(&self.request.headers, body),
                None => String::new(),
            }
        })
    }

    /// Response headers rendered one per line.
    pub fn response_headers_text(&self) -> &str {
        self.response_headers_text
            .get_or_init(|| format::header_lines(&self.response.headers, None))
    }

    /// Decoded response body, same rules as [`request_body_text`].
    ///
    /// [`request_body_text`]: Self::request_body_text
    pub fn response_body_text(&self) -> &str {
        self.response_body_text
            .get_or_init(|| self.response.body_text())
    }

    /// Rendered call-site stack; `None` when stack capture was disabled.
    pub fn stack_text(&self) -> Option<&str> {
        if self.frames.is_empty() {
            return None;
        }
        Some(self.stack_text.get_or_init(|| stack::render(&self.frames)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    /// Build a minimal captured call for tests, with a distinguishing
    /// path and a fixed elapsed duration.
    pub(crate) fn call(path: &str, elapsed_ms: u64) -> CapturedCall {
        let url = Url::parse(&format!("https://svc.test{path}")).unwrap();
        let request = CallRequest {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let response = CallResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(b"ok"),
            elapsed: Duration::from_millis(elapsed_ms),
        };
        CapturedCall::new(
            request,
            response,
            CallOptions::default(),
            Vec::new(),
            Arc::new(InspectConfig::new()),
        )
    }
}
