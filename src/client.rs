//! The inspected HTTP client.
//!
//! [`InspectedClient`] is the construction-time injection point: the
//! application builds one where it previously built a bare HTTP client
//! and keeps the familiar call surface (`get`/`post`/... → builder →
//! `send().await`). Every successful send is captured into the calling
//! context's [`CallScope`](crate::CallScope); transport failures
//! propagate untouched and leave no record, and capture itself can
//! never fail the call.
//!
//! The network itself sits behind the [`Transport`] trait: send a
//! request, get back the ordered chain of responses observed for it.
//! The default [`ReqwestTransport`] disables reqwest's automatic
//! redirects and follows them itself so the chain stays observable —
//! the captured record references the first response of the chain, the
//! caller receives the final one.

use crate::config::InspectConfig;
use crate::error::{Error, Result};
use crate::record::{CallOptions, CallRequest, CallResponse, CapturedCall};
use crate::{scope, stack};
use bytes::Bytes;
use http::header::{
    HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION,
    TRANSFER_ENCODING,
};
use http::{HeaderMap, Method, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Opaque "send a request, get responses back" capability.
///
/// Implementations own connection management, TLS, and timeouts. A
/// transport that follows redirects must report every hop in the
/// returned chain, first response first.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request, returning the full response chain.
    async fn send(&self, request: CallRequest, options: &CallOptions) -> Result<ReplyChain>;
}

/// Ordered, non-empty chain of responses observed for one call.
///
/// Length one when no redirect occurred. The first entry answers the
/// original request; the last is what the caller ultimately receives.
#[derive(Debug)]
pub struct ReplyChain {
    first: CallResponse,
    rest: Vec<CallResponse>,
}

impl ReplyChain {
    /// Start a chain from the response to the original request.
    pub fn new(first: CallResponse) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    /// Append a response reached by following a redirect.
    pub fn push(&mut self, response: CallResponse) {
        self.rest.push(response);
    }

    /// The response to the original request.
    pub fn first(&self) -> &CallResponse {
        &self.first
    }

    /// The final response of the chain.
    pub fn last(&self) -> &CallResponse {
        self.rest.last().unwrap_or(&self.first)
    }

    /// Number of responses in the chain.
    pub fn hops(&self) -> usize {
        1 + self.rest.len()
    }

    /// Split into `(first, final)` responses. When the chain has a
    /// single entry the two are clones of the same response.
    pub fn into_parts(mut self) -> (CallResponse, CallResponse) {
        match self.rest.pop() {
            Some(last) => (self.first, last),
            None => (self.first.clone(), self.first),
        }
    }
}

/// Default transport backed by `reqwest`.
///
/// Automatic redirects are disabled on the inner client; redirects are
/// followed here, hop by hop, so the chain can be reported. Per hop:
/// 303 responses, and 301/302 responses to non-GET/HEAD requests,
/// downgrade the follow-up to a bodyless GET; 307/308 preserve method
/// and body; `Authorization` is dropped when the redirect leaves the
/// original host.
pub struct ReqwestTransport {
    client: reqwest::Client,
    max_redirects: usize,
}

impl ReqwestTransport {
    /// Build a transport with its own connection pool.
    pub fn new(config: &InspectConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Wrap an existing `reqwest` client. The client should have
    /// automatic redirects disabled, otherwise intermediate responses
    /// are invisible and the chain collapses to its final entry.
    pub fn from_client(client: reqwest::Client, max_redirects: usize) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    async fn execute_hop(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Bytes>,
        options: &CallOptions,
    ) -> Result<CallResponse> {
        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let started = Instant::now();
        let response = builder.send().await?;
        let elapsed = started.elapsed();

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(CallResponse {
            status,
            headers,
            body,
            elapsed,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: CallRequest, options: &CallOptions) -> Result<ReplyChain> {
        let mut method = request.method;
        let mut url = request.url;
        let mut headers = request.headers;
        let mut body = request.body;

        let response = self
            .execute_hop(
                method.clone(),
                url.clone(),
                headers.clone(),
                body.clone(),
                options,
            )
            .await?;
        let mut chain = ReplyChain::new(response);

        while let Some(target) = redirect_target(chain.last(), &url) {
            if chain.hops() > self.max_redirects {
                return Err(Error::TooManyRedirects {
                    hops: chain.hops(),
                });
            }

            if downgrade_to_get(chain.last().status, &method) {
                method = Method::GET;
                body = None;
                headers.remove(CONTENT_TYPE);
                headers.remove(CONTENT_LENGTH);
                headers.remove(TRANSFER_ENCODING);
            }
            if !same_origin(&target, &url) {
                headers.remove(AUTHORIZATION);
            }
            url = target;

            let response = self
                .execute_hop(
                    method.clone(),
                    url.clone(),
                    headers.clone(),
                    body.clone(),
                    options,
                )
                .await?;
            chain.push(response);
        }

        Ok(chain)
    }
}

/// Where a response redirects to, if anywhere.
///
/// Responses with an unparseable `Location` are treated as final
/// rather than failing the call.
fn redirect_target(response: &CallResponse, base: &Url) -> Option<Url> {
    if !response.status.is_redirection() {
        return None;
    }
    let location = response.headers.get(LOCATION)?.to_str().ok()?;
    match base.join(location) {
        Ok(target) => Some(target),
        Err(err) => {
            tracing::debug!(%err, location, "unparseable redirect location, treating response as final");
            None
        }
    }
}

/// Whether following `status` switches the request to a bodyless GET.
fn downgrade_to_get(status: StatusCode, method: &Method) -> bool {
    status == StatusCode::SEE_OTHER
        || ((status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND)
            && *method != Method::GET
            && *method != Method::HEAD)
}

/// Same scheme, host, and effective port.
fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// HTTP client whose every call is captured into the active scope.
///
/// ```no_run
/// use reqscope::{InspectConfig, InspectedClient};
///
/// # async fn example() -> reqscope::Result<()> {
/// let client = InspectedClient::new(InspectConfig::new())?;
/// let response = client
///     .get("https://api.example.com/users")
///     .header("accept", "application/json")
///     .send()
///     .await?;
/// assert!(response.status.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InspectedClient {
    transport: Arc<dyn Transport>,
    config: Arc<InspectConfig>,
}

impl InspectedClient {
    /// Build a client over the default [`ReqwestTransport`].
    pub fn new(config: InspectConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        })
    }

    /// Build a client over a custom transport.
    pub fn with_transport<T: Transport + 'static>(transport: T, config: InspectConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        }
    }

    /// Start a request with an arbitrary method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> CallBuilder {
        CallBuilder {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            options: CallOptions::default(),
            err: None,
        }
    }

    /// Start a GET request.
    pub fn get(&self, url: impl Into<String>) -> CallBuilder {
        self.request(Method::GET, url)
    }

    /// Start a POST request.
    pub fn post(&self, url: impl Into<String>) -> CallBuilder {
        self.request(Method::POST, url)
    }

    /// Start a PUT request.
    pub fn put(&self, url: impl Into<String>) -> CallBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a PATCH request.
    pub fn patch(&self, url: impl Into<String>) -> CallBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a DELETE request.
    pub fn delete(&self, url: impl Into<String>) -> CallBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start a HEAD request.
    pub fn head(&self, url: impl Into<String>) -> CallBuilder {
        self.request(Method::HEAD, url)
    }
}

impl std::fmt::Debug for InspectedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectedClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for a single inspected call.
pub struct CallBuilder {
    transport: Arc<dyn Transport>,
    config: Arc<InspectConfig>,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    options: CallOptions,
    err: Option<Error>,
}

impl CallBuilder {
    /// Add a header. Invalid names or values fail the eventual `send`.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                if self.err.is_none() {
                    self.err = Some(Error::InvalidHeader(name.to_string()));
                }
            }
        }
        self
    }

    /// Merge a prepared header map into the request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set a `Bearer` authorization header.
    pub fn bearer_auth(self, token: &str) -> Self {
        let value = format!("Bearer {token}");
        self.header("authorization", &value)
    }

    /// Set a raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON request body and set the
    /// content type accordingly.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.body = Some(Bytes::from(body));
            }
            Err(err) => {
                if self.err.is_none() {
                    self.err = Some(Error::Json(err));
                }
            }
        }
        self
    }

    /// Per-call timeout, passed through to the transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Perform the call.
    ///
    /// On success the final response is returned and a record holding
    /// the first response of the chain is collected into the active
    /// scope (dropped silently when none is active). On failure the
    /// transport error propagates and nothing is recorded.
    pub async fn send(self) -> Result<CallResponse> {
        if let Some(err) = self.err {
            return Err(err);
        }
        let url = Url::parse(&self.url)?;
        let request = CallRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        };

        let frames = if self.config.capture_stacks {
            stack::capture(self.config.max_stack_frames)
        } else {
            Vec::new()
        };

        let reply = self.transport.send(request.clone(), &self.options).await?;
        let hops = reply.hops();
        let (earliest, latest) = reply.into_parts();

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = %latest.status,
            hops,
            "captured outgoing call"
        );
        scope::collect(CapturedCall::new(
            request,
            earliest,
            self.options,
            frames,
            Arc::clone(&self.config),
        ));

        Ok(latest)
    }
}
