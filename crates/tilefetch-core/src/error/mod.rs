//! Fetch error taxonomy.
//!
//! Every failed fetch ends up as one [`FetchError`] with a closed
//! [`ErrorKind`]. The error keeps two texts: the message returned to the caller
//! (which may hide URL and reason) and the full detail that always reaches the
//! logs.

mod classify;

pub use classify::{classify_status, classify_transport_error};

use std::fmt;

/// Largest part of a non-image body quoted in a content-type error.
const MAX_QUOTED_BODY: usize = 4096;

/// What went wrong with a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL could not be turned into a request.
    MalformedUrl,
    /// The server answered with an error status (>= 400).
    HttpStatus(u16),
    /// TLS handshake or certificate verification failed.
    TlsVerification,
    /// No HTTP response: refused, timed out, DNS failure.
    NoResponse,
    /// Any other transport failure.
    InternalTransport,
    /// The server answered 204; callers always expect a body.
    NoContent,
    /// `fetch_image` got something that is not an image.
    ContentTypeMismatch,
}

impl ErrorKind {
    /// Message prefix, also used alone when details are hidden.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::MalformedUrl => "URL not correct",
            ErrorKind::HttpStatus(_) | ErrorKind::NoContent => "HTTP Error",
            ErrorKind::TlsVerification => "Could not verify connection to URL",
            ErrorKind::NoResponse => "No response from URL",
            ErrorKind::InternalTransport => "Internal HTTP error",
            ErrorKind::ContentTypeMismatch => "response is not an image",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ErrorKind::HttpStatus(code) => Some(*code),
            ErrorKind::NoContent => Some(204),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedUrl => f.write_str("malformed URL"),
            ErrorKind::HttpStatus(code) => write!(f, "HTTP status {code}"),
            ErrorKind::TlsVerification => f.write_str("TLS verification failure"),
            ErrorKind::NoResponse => f.write_str("no response"),
            ErrorKind::InternalTransport => f.write_str("internal transport error"),
            ErrorKind::NoContent => f.write_str("no content"),
            ErrorKind::ContentTypeMismatch => f.write_str("content type mismatch"),
        }
    }
}

/// A classified fetch failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    kind: ErrorKind,
    message: String,
    detail: String,
}

impl FetchError {
    /// Error for `url` failing with `reason`. With `hide_details` the returned
    /// message names only the kind; the detail keeps URL and reason.
    pub fn new(kind: ErrorKind, url: &str, reason: &str, hide_details: bool) -> Self {
        let detail = format!("{} \"{}\": {}", kind.label(), url, reason);
        let message = if hide_details {
            format!("{} (see logs for URL and reason).", kind.label())
        } else {
            detail.clone()
        };
        Self {
            kind,
            message,
            detail,
        }
    }

    /// 204 answer. The message names no URL, so it is never hidden.
    pub fn no_content(url: &str) -> Self {
        Self {
            kind: ErrorKind::NoContent,
            message: "HTTP Error \"204 No Content\"".to_string(),
            detail: format!("HTTP Error \"{url}\": 204 No Content"),
        }
    }

    /// Response to an image request that is not an image. Quotes up to 4 KiB
    /// of the body; never hidden.
    pub fn content_type_mismatch(url: &str, content_type: Option<&str>, body: &[u8]) -> Self {
        let quoted = &body[..body.len().min(MAX_QUOTED_BODY)];
        let message = format!(
            "{}: ({})",
            ErrorKind::ContentTypeMismatch.label(),
            String::from_utf8_lossy(quoted)
        );
        let detail = format!(
            "{} \"{}\": content-type {}",
            ErrorKind::ContentTypeMismatch.label(),
            url,
            content_type.unwrap_or("missing")
        );
        Self {
            kind: ErrorKind::ContentTypeMismatch,
            message,
            detail,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message meant for the caller.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Full message with URL and reason, for logs.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn status_code(&self) -> Option<u16> {
        self.kind.status_code()
    }
}
