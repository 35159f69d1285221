//! Fetch executor.
//!
//! [`HttpClient`] turns a URL (possibly with embedded credentials) and
//! [`FetchOptions`] into one request, runs it through a [`Transport`] session
//! and classifies the result. Every call, whatever its outcome, is reported to
//! the [`RequestLog`] exactly once.

mod image;

pub use image::ImagePayload;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::credentials::{self, Credentials};
use crate::error::{classify_status, classify_transport_error, ErrorKind, FetchError};
use crate::observe::{self, RequestLog, RequestRecord, TracingRequestLog};
use crate::options::FetchOptions;
use crate::request::{FetchRequest, FetchResponse, Method};
use crate::session::{SessionKey, SessionRegistry};
use crate::transport::{CurlTransport, Transport};

/// Product identifier sent as `User-Agent` unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("tilefetch/", env!("CARGO_PKG_VERSION"));

/// Blocking tile/image fetcher. Cheap to share between threads.
pub struct HttpClient<T: Transport = CurlTransport, L: RequestLog = TracingRequestLog> {
    transport: T,
    log: L,
    sessions: Arc<SessionRegistry<T::Session>>,
    user_agent: String,
}

impl HttpClient {
    /// libcurl transport, `tracing` request log, private session registry.
    pub fn new() -> Self {
        Self::with_parts(CurlTransport::default(), TracingRequestLog)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport, L: RequestLog> HttpClient<T, L> {
    pub fn with_parts(transport: T, log: L) -> Self {
        Self {
            transport,
            log,
            sessions: Arc::new(SessionRegistry::new()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Use `sessions` instead of a private registry, e.g. to share sessions
    /// between clients with different request logs.
    pub fn with_sessions(mut self, sessions: Arc<SessionRegistry<T::Session>>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry<T::Session>> {
        &self.sessions
    }

    pub fn request_log(&self) -> &L {
        &self.log
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// GET `url`.
    pub fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse, FetchError> {
        self.fetch_with(url, Method::Get, None, options)
    }

    /// Fetch `url` with an explicit method and optional body.
    ///
    /// Userinfo in `url` is sent as basic auth and stripped from the request
    /// URL, from error messages and from the request log.
    pub fn fetch_with(
        &self,
        url: &str,
        method: Method,
        body: Option<Vec<u8>>,
        options: &FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        let (url, credentials) = credentials::split(url);
        let started = Instant::now();

        let (result, duration) = match self.build_request(&url, credentials, method, body, options) {
            Ok(request) => {
                let key = SessionKey::for_request(&request.url, options);
                let session = self
                    .sessions
                    .get_or_create(&key, |key| self.transport.create_session(key));
                tracing::debug!(url = %request.url, %method, "dispatching request");
                let dispatched = Instant::now();
                let (result, elapsed) = self.dispatch(&session, &request, options);
                (result, elapsed.unwrap_or_else(|| dispatched.elapsed()))
            }
            Err(e) => (Err(e), started.elapsed()),
        };

        self.report(&url, method, &result, duration);
        result
    }

    fn build_request(
        &self,
        url: &str,
        credentials: Credentials,
        method: Method,
        body: Option<Vec<u8>>,
        options: &FetchOptions,
    ) -> Result<FetchRequest, FetchError> {
        let url = check_url(url).map_err(|reason| {
            FetchError::new(ErrorKind::MalformedUrl, url, &reason, options.hide_error_details)
        })?;

        let mut request = FetchRequest::new(url);
        request.method = method;
        request.body = body;
        request.timeout = options.timeout;
        request.credentials = credentials;
        request.set_header("User-Agent", &self.user_agent);
        for (name, value) in &options.extra_headers {
            request.set_header(name, value);
        }
        Ok(request)
    }

    /// Sends `request` and classifies the outcome. Also returns the time the
    /// transport reported for the request, if any.
    fn dispatch(
        &self,
        session: &T::Session,
        request: &FetchRequest,
        options: &FetchOptions,
    ) -> (Result<FetchResponse, FetchError>, Option<Duration>) {
        let hide = options.hide_error_details;
        let response = match self.transport.send(session, request) {
            Ok(response) => response,
            Err(e) => {
                let kind = classify_transport_error(&e);
                let err = FetchError::new(kind, &request.url, &e.reason, hide);
                return (Err(err), e.elapsed);
            }
        };

        let elapsed = response.elapsed;
        let result = match classify_status(response.status) {
            None => Ok(FetchResponse::from_transport(request.url.clone(), response)),
            Some(ErrorKind::NoContent) => Err(FetchError::no_content(&request.url)),
            Some(kind) => Err(FetchError::new(
                kind,
                &request.url,
                &response.status.to_string(),
                hide,
            )),
        };
        (result, elapsed)
    }

    fn report(
        &self,
        url: &str,
        method: Method,
        result: &Result<FetchResponse, FetchError>,
        duration: Duration,
    ) {
        let record = match result {
            Ok(resp) => RequestRecord {
                url: url.to_string(),
                method,
                status_code: Some(resp.status),
                body_len: Some(resp.body.len()),
                duration,
                error: None,
            },
            Err(e) => {
                tracing::warn!(kind = %e.kind(), "{}", e.detail());
                RequestRecord {
                    url: url.to_string(),
                    method,
                    status_code: e.status_code(),
                    body_len: None,
                    duration,
                    error: Some(e.detail().to_string()),
                }
            }
        };
        observe::notify(&self.log, &record);
    }
}

/// Accepts absolute http/https URLs with a host and returns the normalized
/// form (e.g. spaces in the path percent-encoded) that is actually sent.
fn check_url(url: &str) -> Result<String, String> {
    if url.contains('\0') {
        return Err("URL contains a NUL byte".to_string());
    }
    let parsed = url::Url::parse(url).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported URL scheme '{other}'")),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err("URL has no host".to_string());
    }
    Ok(parsed.into())
}

impl<T: Transport, L: RequestLog> std::fmt::Debug for HttpClient<T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.user_agent)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
