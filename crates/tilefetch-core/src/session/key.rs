use std::path::PathBuf;

use crate::options::FetchOptions;

/// Identity of a transport session, and the configuration the transport
/// builds it from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Custom trust root (PEM bundle).
    pub ca_cert_path: Option<PathBuf>,
    /// Certificate and hostname verification disabled.
    pub insecure: bool,
    /// In-memory cookie engine enabled.
    pub manage_cookies: bool,
}

impl SessionKey {
    /// Key for fetching `url` with `options`.
    ///
    /// For insecure HTTPS requests `ca_cert_path` is ignored.
    pub fn for_request(url: &str, options: &FetchOptions) -> Self {
        let ca_cert_path = if options.insecure && is_https(url) {
            None
        } else {
            options.ca_cert_path.clone()
        };
        Self {
            ca_cert_path,
            insecure: options.insecure,
            manage_cookies: options.manage_cookies,
        }
    }
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"))
}
