//! Credential-aware HTTP/HTTPS fetching of map tiles and similar images.
//!
//! `credentials::split` separates basic-auth userinfo from a URL;
//! [`HttpClient`] runs the request through a shared transport session,
//! classifies every failure into an [`ErrorKind`] and reports each attempt to
//! a [`RequestLog`].

pub mod config;
pub mod logging;

pub mod client;
pub mod credentials;
pub mod error;
pub mod observe;
pub mod options;
pub mod request;
pub mod session;
pub mod transport;

pub use client::{HttpClient, ImagePayload, DEFAULT_USER_AGENT};
pub use credentials::Credentials;
pub use error::{ErrorKind, FetchError};
pub use observe::{MemoryRequestLog, RequestLog, RequestRecord, TracingRequestLog};
pub use options::FetchOptions;
pub use request::{FetchRequest, FetchResponse, Method, TransportResponse};
pub use session::{SessionKey, SessionRegistry};
pub use transport::{CurlTransport, Transport, TransportError, TransportErrorKind};
