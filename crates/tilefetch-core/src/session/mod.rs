//! Transport sessions shared between requests.
//!
//! A session bundles the trust and cookie settings of a request. Requests with
//! the same [`SessionKey`] reuse one session (and with it the transport's
//! connections, TLS session cache and cookies); the [`SessionRegistry`] makes
//! sure at most one session exists per key.

mod key;
mod registry;

pub use key::SessionKey;
pub use registry::SessionRegistry;
