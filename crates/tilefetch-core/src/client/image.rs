//! Image retrieval on top of [`HttpClient::fetch`].

use super::HttpClient;
use crate::error::FetchError;
use crate::observe::RequestLog;
use crate::options::FetchOptions;
use crate::transport::Transport;

/// Raw image bytes plus the content type the server declared. Not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub url: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl<T: Transport, L: RequestLog> HttpClient<T, L> {
    /// GET `url` and require an `image/*` response.
    ///
    /// A missing or non-image `content-type` fails with
    /// [`ErrorKind::ContentTypeMismatch`](crate::error::ErrorKind::ContentTypeMismatch),
    /// quoting the body; that message is not affected by `hide_error_details`.
    pub fn fetch_image(&self, url: &str, options: &FetchOptions) -> Result<ImagePayload, FetchError> {
        let resp = self.fetch(url, options)?;
        match resp.content_type {
            Some(content_type) if is_image(&content_type) => Ok(ImagePayload {
                url: resp.url,
                content_type,
                data: resp.body,
            }),
            content_type => {
                let err = FetchError::content_type_mismatch(&resp.url, content_type.as_deref(), &resp.body);
                tracing::warn!(kind = %err.kind(), "{}", err.detail());
                Err(err)
            }
        }
    }
}

fn is_image(content_type: &str) -> bool {
    content_type
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image"))
}
