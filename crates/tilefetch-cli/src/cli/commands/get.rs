//! `tilefetch get <url>` – fetch and report a response.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tilefetch_core::{FetchOptions, FetchResponse, HttpClient, Method};

/// Everything `get` needs besides the client.
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<Vec<u8>>,
    pub options: FetchOptions,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// What `--json` prints.
#[derive(Debug, Serialize)]
pub(crate) struct ResponseSummary<'a> {
    pub url: &'a str,
    pub status: u16,
    pub content_type: Option<&'a str>,
    pub length: usize,
    pub headers: Vec<(&'a str, &'a str)>,
}

impl<'a> From<&'a FetchResponse> for ResponseSummary<'a> {
    fn from(resp: &'a FetchResponse) -> Self {
        Self {
            url: &resp.url,
            status: resp.status,
            content_type: resp.content_type.as_deref(),
            length: resp.body.len(),
            headers: resp
                .headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        }
    }
}

pub async fn run_get(client: Arc<HttpClient>, request: GetRequest) -> Result<()> {
    let resp = tokio::task::spawn_blocking({
        let url = request.url.clone();
        let method = request.method;
        let body = request.body.clone();
        let options = request.options.clone();
        move || client.fetch_with(&url, method, body, &options)
    })
    .await
    .context("fetch task join")??;

    if let Some(path) = &request.output {
        std::fs::write(path, &resp.body)
            .with_context(|| format!("write {}", path.display()))?;
    }

    if request.json {
        println!("{}", serde_json::to_string_pretty(&ResponseSummary::from(&resp))?);
    } else {
        println!(
            "{} {} {} bytes",
            resp.status,
            resp.content_type.as_deref().unwrap_or("-"),
            resp.body.len()
        );
    }
    Ok(())
}
