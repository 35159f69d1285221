use std::path::PathBuf;
use std::time::Duration;

/// Per-call fetch configuration.
///
/// `ca_cert_path`, `insecure` and `manage_cookies` select the transport session
/// (see [`crate::session::SessionKey`]); the rest only affect the single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// PEM bundle used as trust root instead of the system store.
    pub ca_cert_path: Option<PathBuf>,
    /// Disable certificate and hostname verification. For HTTPS URLs this also
    /// drops `ca_cert_path`.
    pub insecure: bool,
    /// Enable the transport's in-memory cookie engine for the session.
    pub manage_cookies: bool,
    /// Keep URL and reason out of returned error messages; they still reach the logs.
    pub hide_error_details: bool,
    /// Extra request headers, sent in order after the product identifier.
    pub extra_headers: Vec<(String, String)>,
    /// Total request timeout. `None` uses the transport default.
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
