//! Classify transport results into fetch error kinds.

use super::ErrorKind;
use crate::transport::{TransportError, TransportErrorKind};

/// Error kind for an HTTP status, or `None` when the status counts as success
/// (2xx/3xx other than 204).
pub fn classify_status(status: u16) -> Option<ErrorKind> {
    match status {
        204 => Some(ErrorKind::NoContent),
        200..=399 => None,
        _ => Some(ErrorKind::HttpStatus(status)),
    }
}

/// Error kind for a failure to obtain a response.
pub fn classify_transport_error(e: &TransportError) -> ErrorKind {
    match e.kind {
        TransportErrorKind::MalformedUrl => ErrorKind::MalformedUrl,
        TransportErrorKind::Tls => ErrorKind::TlsVerification,
        TransportErrorKind::Connection => ErrorKind::NoResponse,
        TransportErrorKind::Other => ErrorKind::InternalTransport,
    }
}
