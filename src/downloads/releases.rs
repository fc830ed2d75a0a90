//! Release-asset strategy: sum asset download counters reported by the
//! source-hosting release API.
//!
//! A query targets either one release (`releases/latest`,
//! `releases/tags/<tag>`) or every release of the repository, fetched page by
//! page until a short page or `max_pages` is reached. Assets are counted when
//! they satisfy a caller-supplied predicate.

use super::{CountError, LOG_TARGET};
use crate::config::ReleasesConfig;
use crate::http;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub download_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Which releases to count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseQuery {
    /// Path under `releases/`, e.g. `latest` or `tags/v1.2.0`.
    Named(String),
    /// Every release (paged).
    All,
}

/// Serializable asset predicate for catalogue entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetFilter {
    #[default]
    All,
    /// Asset name ends with this suffix (e.g. `.apk`).
    Suffix(String),
    /// Asset name equals this exactly.
    Name(String),
}

impl AssetFilter {
    pub fn matches(&self, asset: &ReleaseAsset) -> bool {
        match self {
            Self::All => true,
            Self::Suffix(suffix) => asset.name.ends_with(suffix.as_str()),
            Self::Name(name) => asset.name == *name,
        }
    }
}

/// Sum the counters of the assets accepted by `filter`.
pub fn sum_assets(assets: &[ReleaseAsset], filter: impl Fn(&ReleaseAsset) -> bool) -> u64 {
    assets
        .iter()
        .filter(|a| filter(a))
        .map(|a| a.download_count)
        .sum()
}

/// Sum accepted asset counters across several releases.
pub fn sum_releases(releases: &[Release], filter: impl Fn(&ReleaseAsset) -> bool) -> u64 {
    releases.iter().map(|r| sum_assets(&r.assets, &filter)).sum()
}

/// Release API client.
#[derive(Debug, Clone)]
pub struct ReleaseCounter {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
    per_page: u32,
    max_pages: u32,
}

impl ReleaseCounter {
    pub fn new(client: reqwest::Client, config: &ReleasesConfig, token: Option<String>) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            per_page: config.per_page,
            max_pages: config.max_pages,
        }
    }

    /// Build a counter whose credential is read from `config.token_env`.
    pub fn from_env(client: reqwest::Client, config: &ReleasesConfig) -> Self {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.is_empty());
        if token.is_none() {
            log::warn!(
                target: LOG_TARGET,
                "{} is not set; release API requests are unauthenticated",
                config.token_env
            );
        }
        Self::new(client, config, token)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(value) = self.token.as_deref().and_then(http::token_header) {
            let _ = headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Total downloads of the accepted assets for `owner/repo`.
    pub async fn downloads(
        &self,
        owner: &str,
        repo: &str,
        query: &ReleaseQuery,
        filter: impl Fn(&ReleaseAsset) -> bool,
    ) -> Result<u64, CountError> {
        match query {
            ReleaseQuery::Named(path) => {
                let release = self.fetch_release(owner, repo, path).await?;
                Ok(sum_assets(&release.assets, filter))
            }
            ReleaseQuery::All => {
                let releases = self.fetch_all_releases(owner, repo).await?;
                Ok(sum_releases(&releases, filter))
            }
        }
    }

    /// [`downloads`](Self::downloads) with failures collapsed to zero.
    pub async fn downloads_or_zero(
        &self,
        owner: &str,
        repo: &str,
        query: &ReleaseQuery,
        filter: impl Fn(&ReleaseAsset) -> bool,
    ) -> u64 {
        match self.downloads(owner, repo, query, filter).await {
            Ok(count) => count,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "release count for {owner}/{repo} unavailable: {e}");
                0
            }
        }
    }

    async fn fetch_release(&self, owner: &str, repo: &str, path: &str) -> Result<Release, CountError> {
        let url = format!(
            "{}/repos/{}/{}/releases/{}",
            self.api_base,
            owner,
            repo,
            path.trim_start_matches('/')
        );
        let resp = http::get(&self.client, &url, self.headers()).await?;
        resp.json()
            .await
            .map_err(|e| CountError::Parse(format!("release {owner}/{repo}/{path}: {e}")))
    }

    async fn fetch_all_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>, CountError> {
        let mut all_releases = Vec::new();

        for page in 1..=self.max_pages {
            let url = format!(
                "{}/repos/{}/{}/releases?per_page={}&page={}",
                self.api_base, owner, repo, self.per_page, page
            );
            let resp = http::get(&self.client, &url, self.headers()).await?;
            let releases: Vec<Release> = resp
                .json()
                .await
                .map_err(|e| CountError::Parse(format!("releases of {owner}/{repo}: {e}")))?;

            let count = releases.len();
            all_releases.extend(releases);

            // A short page is the last one
            if count < self.per_page as usize {
                break;
            }
            if page == self.max_pages {
                log::debug!(
                    target: LOG_TARGET,
                    "{owner}/{repo}: stopped after {page} page(s); older releases are not counted"
                );
            }
        }

        log::debug!(
            target: LOG_TARGET,
            "fetched {} release(s) for {owner}/{repo}",
            all_releases.len()
        );
        Ok(all_releases)
    }
}
