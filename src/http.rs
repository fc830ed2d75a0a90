//! Shared HTTP plumbing for the pipeline.
//!
//! Every network access in a build (store pages, the release API, remote
//! images) goes through one [`reqwest::Client`] built here, and every GET is
//! classified into a [`FetchError`] so callers can pick their own degraded
//! default instead of inspecting status codes.

use crate::config::HttpConfig;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Build the client shared by all strategies and the image cache.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Send a GET and reject anything that is not a 2xx.
pub async fn get(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
) -> Result<reqwest::Response, FetchError> {
    let resp = client.get(url).headers(headers).send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(url.to_string()));
    }
    Err(FetchError::Status {
        status,
        url: url.to_string(),
    })
}

/// GET a page body as text.
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    Ok(get(client, url, HeaderMap::new()).await?.text().await?)
}

/// GET a body as raw bytes.
pub async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    Ok(get(client, url, HeaderMap::new()).await?.bytes().await?.to_vec())
}

/// `Authorization: token <secret>` header, marked sensitive so it never
/// shows up in debug output.
pub fn token_header(token: &str) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("token {token}")).ok()?;
    value.set_sensitive(true);
    Some(value)
}
