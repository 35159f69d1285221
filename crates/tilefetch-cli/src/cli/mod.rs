//! CLI for tilefetch.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tilefetch_core::config::{self, TilefetchConfig};
use tilefetch_core::{FetchOptions, HttpClient, Method};

use commands::{run_get, run_image, run_split, GetRequest};

/// Top-level CLI for tilefetch.
#[derive(Debug, Parser)]
#[command(name = "tilefetch")]
#[command(about = "tilefetch: fetch map tiles over HTTP/HTTPS with URL-embedded credentials", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/tilefetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by the fetching commands. Flags override the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct FetchArgs {
    /// Do not verify TLS certificates or host names.
    #[arg(long)]
    pub insecure: bool,

    /// PEM bundle to trust instead of the system store.
    #[arg(long, value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Keep cookies between requests of this invocation.
    #[arg(long)]
    pub cookies: bool,

    /// Keep URL and reason out of error messages (they are still logged).
    #[arg(long)]
    pub hide_error_details: bool,

    /// Extra request header, repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Total request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,
}

impl FetchArgs {
    /// Fetch options from the config file with these flags applied on top.
    pub fn apply(&self, cfg: &TilefetchConfig) -> FetchOptions {
        let mut options = cfg.fetch_options();
        options.insecure |= self.insecure;
        options.manage_cookies |= self.cookies;
        options.hide_error_details |= self.hide_error_details;
        if let Some(ca) = &self.ca_cert {
            options.ca_cert_path = Some(ca.clone());
        }
        if let Some(secs) = self.timeout.filter(|s| s.is_finite() && *s > 0.0) {
            options.timeout = Some(Duration::from_secs_f64(secs));
        }
        for (name, value) in &self.headers {
            options.extra_headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            options.extra_headers.push((name.clone(), value.clone()));
        }
        options
    }
}

/// Parses `Name: value` (or `Name=value`).
fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .or_else(|| s.split_once('='))
        .ok_or_else(|| format!("invalid header '{s}', expected 'Name: value'"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name in '{s}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a URL and report (or save) the response.
    Get {
        /// HTTP/HTTPS URL, may embed `user:password@`.
        url: String,

        /// Write the response body to this file.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Request method.
        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        /// Request body.
        #[arg(short, long)]
        data: Option<String>,

        /// Print status, content type and size as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Fetch an image (the response must be `image/*`) and save it.
    Image {
        /// HTTP/HTTPS URL, may embed `user:password@`.
        url: String,

        /// File to write the image to.
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Show how a URL is split into request URL and credentials.
    Split {
        /// URL to split.
        url: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                url,
                output,
                method,
                data,
                json,
                fetch,
            } => {
                let request = GetRequest {
                    url,
                    method,
                    body: data.map(String::into_bytes),
                    options: fetch.apply(&cfg),
                    output,
                    json,
                };
                run_get(build_client(&cfg), request).await?;
            }
            CliCommand::Image { url, output, fetch } => {
                run_image(build_client(&cfg), url, fetch.apply(&cfg), &output).await?;
            }
            CliCommand::Split { url } => run_split(&url),
        }

        Ok(())
    }
}

fn build_client(cfg: &TilefetchConfig) -> Arc<HttpClient> {
    let client = HttpClient::new();
    let client = match &cfg.user_agent {
        Some(user_agent) => client.with_user_agent(user_agent.clone()),
        None => client,
    };
    Arc::new(client)
}
