//! Transport seam: the HTTP/TLS stack that actually moves bytes.
//!
//! The client only sees [`Transport`]; [`CurlTransport`] is the libcurl-backed
//! implementation used by default.

mod libcurl;

pub use libcurl::{classify_curl_error, CurlSession, CurlTransport};

use std::time::Duration;

use crate::request::{FetchRequest, TransportResponse};
use crate::session::SessionKey;

/// Coarse failure categories a transport must distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The URL was rejected before a connection was attempted.
    MalformedUrl,
    /// TLS handshake or certificate verification failed.
    Tls,
    /// No HTTP response: DNS failure, refused connection, timeout, reset.
    Connection,
    /// Anything else.
    Other,
}

/// Failure reported by [`Transport::send`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub reason: String,
    /// Time the transport spent on the request itself, if it measured it.
    pub elapsed: Option<Duration>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            elapsed: None,
        }
    }
}

/// An HTTP/TLS stack able to execute [`FetchRequest`]s.
///
/// Sessions are created once per [`SessionKey`] by the client's session
/// registry and then shared by every request with that key, possibly from many
/// threads at once.
pub trait Transport: Send + Sync {
    type Session: Send + Sync;

    /// Builds the reusable state for one trust/cookie configuration.
    fn create_session(&self, key: &SessionKey) -> Self::Session;

    /// Executes one request. Any HTTP status counts as a response; only
    /// failures to obtain a response are errors.
    ///
    /// Transports that may wait for a free connection before sending should
    /// set `elapsed` on the response or error to the time spent after that
    /// wait; otherwise the client measures the whole call.
    fn send(
        &self,
        session: &Self::Session,
        request: &FetchRequest,
    ) -> Result<TransportResponse, TransportError>;
}
