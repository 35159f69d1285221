//! libcurl transport.
//!
//! A session keeps a pool of `Easy` handles. Connections and the TLS session
//! cache live on a handle and survive `reset()`, so a handle taken back from the
//! pool reuses them; per-request options are re-applied after every reset.
//! Sessions that manage cookies use a single handle instead, since the cookie
//! store belongs to one handle; their requests are serialized on it.

use std::str;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use curl::easy::{Auth, Easy, List};

use super::{Transport, TransportError, TransportErrorKind};
use crate::request::{FetchRequest, Method, TransportResponse};
use crate::session::SessionKey;

/// Applied when a request carries no timeout of its own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Idle handles kept per pooled session; extra handles are dropped on return.
const MAX_IDLE_HANDLES: usize = 16;

/// libcurl-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct CurlTransport {
    /// Total timeout for requests without their own; `None` means no limit.
    pub default_timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            default_timeout: Some(DEFAULT_TIMEOUT),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

enum Handles {
    /// Idle handles; a request takes one or creates a new one.
    Pooled(Mutex<Vec<Easy>>),
    /// One handle holding the session's cookie store.
    Shared(Mutex<Easy>),
}

/// Session state for one [`SessionKey`].
pub struct CurlSession {
    key: SessionKey,
    handles: Handles,
}

impl CurlSession {
    fn new(key: &SessionKey) -> Self {
        let handles = if key.manage_cookies {
            Handles::Shared(Mutex::new(Easy::new()))
        } else {
            Handles::Pooled(Mutex::new(Vec::new()))
        };
        Self {
            key: key.clone(),
            handles,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Number of idle pooled handles (always 0 for cookie sessions).
    pub fn idle_handles(&self) -> usize {
        match &self.handles {
            Handles::Pooled(idle) => idle.lock().unwrap_or_else(PoisonError::into_inner).len(),
            Handles::Shared(_) => 0,
        }
    }
}

fn checkout(idle: &Mutex<Vec<Easy>>) -> Easy {
    idle.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop()
        .unwrap_or_else(Easy::new)
}

fn checkin(idle: &Mutex<Vec<Easy>>, easy: Easy) {
    let mut idle = idle.lock().unwrap_or_else(PoisonError::into_inner);
    if idle.len() < MAX_IDLE_HANDLES {
        idle.push(easy);
    }
}

impl std::fmt::Debug for CurlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurlSession")
            .field("key", &self.key)
            .field("idle_handles", &self.idle_handles())
            .finish()
    }
}

impl Transport for CurlTransport {
    type Session = CurlSession;

    fn create_session(&self, key: &SessionKey) -> CurlSession {
        CurlSession::new(key)
    }

    fn send(
        &self,
        session: &CurlSession,
        request: &FetchRequest,
    ) -> Result<TransportResponse, TransportError> {
        match &session.handles {
            Handles::Pooled(idle) => {
                let mut easy = checkout(idle);
                let result = self.perform(&mut easy, &session.key, request);
                checkin(idle, easy);
                result
            }
            Handles::Shared(handle) => {
                let mut easy = handle.lock().unwrap_or_else(PoisonError::into_inner);
                self.perform(&mut easy, &session.key, request)
            }
        }
    }
}

impl CurlTransport {
    /// Runs `request` on `easy` and stamps the outcome with the time taken.
    fn perform(
        &self,
        easy: &mut Easy,
        key: &SessionKey,
        request: &FetchRequest,
    ) -> Result<TransportResponse, TransportError> {
        let started = Instant::now();
        let result = self.transfer(easy, key, request);
        let elapsed = Some(started.elapsed());
        match result {
            Ok(mut response) => {
                response.elapsed = elapsed;
                Ok(response)
            }
            Err(mut e) => {
                e.elapsed = elapsed;
                Err(e)
            }
        }
    }

    fn transfer(
        &self,
        easy: &mut Easy,
        key: &SessionKey,
        request: &FetchRequest,
    ) -> Result<TransportResponse, TransportError> {
        easy.reset();
        self.configure(easy, key, request)
            .map_err(into_transport_error)?;

        let mut headers: Vec<(String, String)> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|line| {
                    collect_header(&mut headers, line);
                    true
                })
                .map_err(into_transport_error)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(into_transport_error)?;
            transfer.perform().map_err(into_transport_error)?;
        }

        let code = easy.response_code().map_err(into_transport_error)?;
        let status = u16::try_from(code).map_err(|_| {
            TransportError::new(
                TransportErrorKind::Other,
                format!("invalid HTTP status code {code}"),
            )
        })?;
        if status == 0 {
            return Err(TransportError::new(
                TransportErrorKind::Connection,
                "no HTTP response received",
            ));
        }

        Ok(TransportResponse {
            status,
            headers,
            body,
            elapsed: None,
        })
    }

    fn configure(
        &self,
        easy: &mut Easy,
        key: &SessionKey,
        request: &FetchRequest,
    ) -> Result<(), curl::Error> {
        easy.url(&request.url)?;
        easy.follow_location(false)?;
        easy.connect_timeout(self.connect_timeout)?;
        if let Some(timeout) = request.timeout.or(self.default_timeout) {
            easy.timeout(timeout)?;
        }

        if let Some(ca) = &key.ca_cert_path {
            easy.cainfo(ca)?;
        }
        if key.insecure {
            easy.ssl_verify_peer(false)?;
            easy.ssl_verify_host(false)?;
        }
        if key.manage_cookies {
            // Empty file name: enable the in-memory cookie engine without loading anything.
            easy.cookie_file("")?;
        }

        match (request.method, &request.body) {
            (Method::Get, None) => easy.get(true)?,
            (Method::Head, _) => easy.nobody(true)?,
            (Method::Post, body) => {
                easy.post(true)?;
                easy.post_fields_copy(body.as_deref().unwrap_or_default())?;
            }
            (method, Some(body)) => {
                easy.custom_request(method.as_str())?;
                easy.post_fields_copy(body)?;
            }
            (method, None) => easy.custom_request(method.as_str())?,
        }

        if let Some(username) = &request.credentials.username {
            easy.username(username)?;
            easy.password(request.credentials.password.as_deref().unwrap_or(""))?;
            let mut auth = Auth::new();
            auth.basic(true);
            easy.http_auth(&auth)?;
        }

        let mut list = List::new();
        for (name, value) in &request.headers {
            list.append(&format!("{}: {}", name.trim(), value.trim()))?;
        }
        if request.body.is_some() {
            // No 100-continue round trip for small bodies.
            list.append("Expect:")?;
        }
        easy.http_headers(list)?;
        Ok(())
    }
}

/// Collects one raw header line. A status line starts a new header block, so
/// only the headers of the final response (after 1xx interim ones) are kept.
fn collect_header(headers: &mut Vec<(String, String)>, data: &[u8]) {
    let Ok(line) = str::from_utf8(data) else {
        return;
    };
    let line = line.trim_end();
    if line.starts_with("HTTP/") {
        headers.clear();
        return;
    }
    if let Some((name, value)) = line.split_once(':') {
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
}

fn into_transport_error(e: curl::Error) -> TransportError {
    TransportError::new(classify_curl_error(&e), e.to_string())
}

/// Map a curl error onto the transport failure categories.
pub fn classify_curl_error(e: &curl::Error) -> TransportErrorKind {
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return TransportErrorKind::MalformedUrl;
    }
    if e.is_ssl_connect_error()
        || e.is_peer_failed_verification()
        || e.is_ssl_cacert()
        || e.is_ssl_certproblem()
        || e.is_ssl_cipher()
        || e.is_ssl_cacert_badfile()
        || e.is_ssl_crl_badfile()
    {
        return TransportErrorKind::Tls;
    }
    if e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_got_nothing()
        || e.is_send_error()
        || e.is_recv_error()
        || e.is_read_error()
    {
        return TransportErrorKind::Connection;
    }
    TransportErrorKind::Other
}
