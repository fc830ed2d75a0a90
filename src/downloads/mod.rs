//! Download counters.
//!
//! Two independent, best-effort strategies feed a project's download count:
//!
//! | Strategy | Source | Degraded default |
//! |----------|--------|------------------|
//! | [`StoreEstimate`] | package-store detail page, scraped | `None` ("no data") |
//! | [`ReleaseCounter`] | release API asset counters | `0` |
//!
//! Both report failures as a typed [`CountError`] so the caller decides what a
//! failure is worth; the `*_or_none` / `*_or_zero` wrappers apply each
//! strategy's conventional default for callers that do not care.

pub mod releases;
pub mod store;

pub use releases::{AssetFilter, Release, ReleaseAsset, ReleaseCounter, ReleaseQuery};
pub use store::{CountExtractor, PatternExtractor, StoreEstimate};

use crate::http::FetchError;
use thiserror::Error;

/// Log target for counter diagnostics.
pub(crate) const LOG_TARGET: &str = "downloads";

/// Why a counter produced no value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountError {
    #[error("not found")]
    NotFound,
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<FetchError> for CountError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::NotFound(_) => Self::NotFound,
            other => Self::Network(other.to_string()),
        }
    }
}
