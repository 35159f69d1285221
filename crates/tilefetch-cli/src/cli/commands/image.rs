//! `tilefetch image <url> -o <file>` – fetch an image and save it.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tilefetch_core::{FetchOptions, HttpClient};

pub async fn run_image(
    client: Arc<HttpClient>,
    url: String,
    options: FetchOptions,
    output: &Path,
) -> Result<()> {
    let image = tokio::task::spawn_blocking(move || client.fetch_image(&url, &options))
        .await
        .context("fetch task join")??;
    std::fs::write(output, &image.data)
        .with_context(|| format!("write {}", output.display()))?;
    println!(
        "{} ({}, {} bytes) -> {}",
        image.url,
        image.content_type,
        image.data.len(),
        output.display()
    );
    Ok(())
}
