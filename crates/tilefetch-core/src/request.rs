//! Request and response values passed between the client and the transport.

use std::fmt;
use std::time::Duration;

use crate::credentials::Credentials;

/// HTTP method for a request. Tile sources are almost always `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// One outgoing request, built fresh for every fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Credential-free URL.
    pub url: String,
    pub method: Method,
    /// Header name/value pairs in send order.
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// `None` leaves the transport's default in place.
    pub timeout: Option<Duration>,
    /// Sent as HTTP basic auth when a username is present.
    pub credentials: Credentials,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: Vec::new(),
            body: None,
            timeout: None,
            credentials: Credentials::default(),
        }
    }

    /// Sets a header, replacing any existing header with the same name
    /// (case-insensitive) in place so that ordering is kept.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }
}

/// Raw response returned by a transport.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Time spent on the request itself, excluding any wait for a handle.
    pub elapsed: Option<Duration>,
}

/// Case-insensitive lookup of the first header called `name`.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A successful fetch: status 2xx/3xx other than 204.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Credential-free URL that was requested.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchResponse {
    pub(crate) fn from_transport(url: String, resp: TransportResponse) -> Self {
        let content_type = find_header(&resp.headers, "content-type").map(str::to_string);
        Self {
            url,
            status: resp.status,
            headers: resp.headers,
            body: resp.body,
            content_type,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}
