//! Image cache for project artwork, icons and favicons.
//!
//! Every image the site shows is copied into the public asset directory at
//! build time so pages never hot-link third-party hosts. Remote and local
//! sources are fetched once, fitted and transcoded to WebP (SVGs are copied
//! verbatim), and written under a deterministic name.
//!
//! # Cache keys
//!
//! The output path is a pure function of the logical name, the optional
//! subdirectory, the build-run identifier and the source format:
//!
//! ```text
//! <public_dir>/images/cached/<subdir>/<sanitized-name>-<run-id>.<webp|svg>
//! ```
//!
//! The source URL or file content is *not* part of the key. A file already
//! present at the computed path is trusted as-is: no fetch, no decode, no
//! re-encode. Changing the run identifier (or the logical name) is the only
//! way to invalidate an entry.
//!
//! ## Within one build
//!
//! Lookups go through an in-process map of [`OnceCell`]s keyed by absolute
//! path, so concurrent requests for the same key share a single fetch and
//! encode. The second caller awaits the first and receives the same string.
//!
//! ## Failure
//!
//! Nothing here returns an error to the caller. Any failure while fetching,
//! decoding or writing yields the original source string, so the page falls
//! back to linking the image directly. An empty source yields an empty string.

use crate::http::{self, FetchError};
use crate::imaging::{BackendError, BadgeParams, ContainParams, ImageBackend, RustBackend};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OnceCell;

/// Public URL prefix of every cached image.
pub const PUBLIC_PREFIX: &str = "/images/cached";

/// Log target for the image progress trace.
const LOG_TARGET: &str = "image";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// Where an image comes from.
///
/// Parsed from a plain string: `http://` and `https://` values are URLs,
/// anything else is a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    Url(String),
    File(PathBuf),
}

impl ImageSource {
    pub fn parse(spec: &str) -> Self {
        if spec.starts_with("http://") || spec.starts_with("https://") {
            Self::Url(spec.to_string())
        } else {
            Self::File(PathBuf::from(spec))
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Url(url) => url.trim().is_empty(),
            Self::File(path) => path.as_os_str().is_empty(),
        }
    }

    /// Whether the source names an SVG file.
    pub fn is_svg(&self) -> bool {
        self.to_string().to_ascii_lowercase().ends_with(".svg")
    }

    /// Last path segment, used to label trace lines.
    fn key(&self) -> String {
        let s = self.to_string();
        s.rsplit('/').next().unwrap_or_default().to_string()
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<String> for ImageSource {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ImageSource> for String {
    fn from(source: ImageSource) -> Self {
        source.to_string()
    }
}

/// One request to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub source: ImageSource,
    /// Logical name, sanitized into the file name.
    pub name: String,
    pub subdir: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Force verbatim copy even when the source does not end in `.svg`.
    pub vector: bool,
}

impl ImageRequest {
    pub fn new(source: ImageSource, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            subdir: None,
            width: None,
            height: None,
            vector: false,
        }
    }

    pub fn subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    /// Fit into a `edge` x `edge` square.
    pub fn square(mut self, edge: u32) -> Self {
        self.width = Some(edge);
        self.height = Some(edge);
        self
    }

    pub fn vector(mut self) -> Self {
        self.vector = true;
        self
    }

    fn is_vector(&self) -> bool {
        self.vector || self.source.is_svg()
    }
}

/// Computed location of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTarget {
    /// URL path the site references, percent-encoded.
    pub public: String,
    /// File the bytes are written to.
    pub absolute: PathBuf,
}

/// Replace every character outside `[A-Za-z0-9+#]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '+' || c == '#' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sibling path a cache file is written to before being renamed into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Compute the cache location for a name. Pure: no filesystem access.
pub fn cache_target(
    public_dir: &Path,
    name: &str,
    subdir: Option<&str>,
    run_id: &str,
    vector: bool,
) -> CacheTarget {
    let stem = format!("{}-{}", sanitize_name(name), run_id);
    let ext = if vector { "svg" } else { "webp" };
    let encoded = utf8_percent_encode(&stem, URI_COMPONENT);

    let mut absolute = public_dir.join(PUBLIC_PREFIX.trim_start_matches('/'));
    let public = match subdir {
        Some(dir) => {
            absolute.push(dir);
            format!("{PUBLIC_PREFIX}/{dir}/{encoded}.{ext}")
        }
        None => format!("{PUBLIC_PREFIX}/{encoded}.{ext}"),
    };
    absolute.push(format!("{stem}.{ext}"));

    CacheTarget { public, absolute }
}

/// Resolve the build-run identifier.
///
/// The environment variable wins when set. Otherwise the first 12 hex digits
/// of the SHA-256 of `fallback_seed` (the catalogue file) are used, so an
/// edited catalogue starts a fresh cache generation.
pub fn resolve_run_id(env_var: &str, fallback_seed: &[u8]) -> String {
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => seed_run_id(fallback_seed),
    }
}

fn seed_run_id(seed: &[u8]) -> String {
    let digest = Sha256::digest(seed);
    format!("{:x}", digest)[..12].to_string()
}

/// Summary of cache activity for a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from a file already on disk.
    pub hits: u32,
    /// Fetched, processed and written.
    pub writes: u32,
    /// Fell back to the source string.
    pub failures: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn write(&mut self) {
        self.writes += 1;
    }

    pub fn failure(&mut self) {
        self.failures += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.writes + self.failures
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures > 0 {
            write!(
                f,
                "{} cached, {} written, {} failed ({} total)",
                self.hits,
                self.writes,
                self.failures,
                self.total()
            )
        } else if self.hits > 0 {
            write!(
                f,
                "{} cached, {} written ({} total)",
                self.hits,
                self.writes,
                self.total()
            )
        } else {
            write!(f, "{} written", self.writes)
        }
    }
}

/// Get-or-create image store rooted at the public asset directory.
pub struct ImageCache<B: ImageBackend = RustBackend> {
    client: reqwest::Client,
    backend: B,
    public_dir: PathBuf,
    source_root: PathBuf,
    run_id: String,
    force: bool,
    cells: Mutex<HashMap<PathBuf, Arc<OnceCell<String>>>>,
    stats: Mutex<CacheStats>,
}

impl<B: ImageBackend> ImageCache<B> {
    /// `public_dir` receives the cache tree; relative file sources are
    /// resolved against `source_root`.
    pub fn new(
        client: reqwest::Client,
        backend: B,
        public_dir: impl Into<PathBuf>,
        source_root: impl Into<PathBuf>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            backend,
            public_dir: public_dir.into(),
            source_root: source_root.into(),
            run_id: run_id.into(),
            force: false,
            cells: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Ignore files already on disk and regenerate every entry once.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn target(&self, name: &str, subdir: Option<&str>, vector: bool) -> CacheTarget {
        cache_target(&self.public_dir, name, subdir, &self.run_id, vector)
    }

    /// Cache one image and return the path pages should reference.
    ///
    /// Returns the original source string on any failure and an empty string
    /// for an empty source.
    pub async fn cache_image(&self, request: &ImageRequest) -> String {
        if request.source.is_empty() {
            return String::new();
        }
        let vector = request.is_vector();
        let target = self.target(&request.name, request.subdir.as_deref(), vector);
        let fallback = request.source.to_string();

        self.get_or_create(&target, &request.source.key(), &fallback, || {
            self.transcode(request, vector)
        })
        .await
    }

    /// Cache a favicon made of `base` with `badge` in its bottom-right corner.
    ///
    /// Written to `favicons/<name>-<run id>.webp`; falls back to the base
    /// source string.
    pub async fn cache_favicon(
        &self,
        base: &ImageSource,
        badge: &ImageSource,
        name: &str,
        size: u32,
    ) -> String {
        if base.is_empty() {
            return String::new();
        }
        let target = self.target(name, Some("favicons"), false);
        let fallback = base.to_string();

        self.get_or_create(&target, &base.key(), &fallback, || {
            self.compose_favicon(base, badge, size)
        })
        .await
    }

    /// Source bytes, fitted and re-encoded unless the asset is vector.
    async fn transcode(&self, request: &ImageRequest, vector: bool) -> Result<Vec<u8>, CacheError> {
        let bytes = self.read_source(&request.source).await?;
        if vector {
            return Ok(bytes);
        }
        let params = ContainParams {
            width: request.width,
            height: request.height,
        };
        Ok(self.backend.contain(&bytes, &params)?)
    }

    async fn compose_favicon(
        &self,
        base: &ImageSource,
        badge: &ImageSource,
        size: u32,
    ) -> Result<Vec<u8>, CacheError> {
        let (base, badge) = tokio::join!(self.read_source(base), self.read_source(badge));
        Ok(self.backend.badge(&base?, &badge?, &BadgeParams { size })?)
    }

    fn cell_for(&self, key: &Path) -> Arc<OnceCell<String>> {
        let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(cells.entry(key.to_path_buf()).or_default())
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut stats);
    }

    /// At most one effective create per target per run. Later and concurrent
    /// callers receive the first caller's result.
    async fn get_or_create<F, Fut>(
        &self,
        target: &CacheTarget,
        key: &str,
        fallback: &str,
        produce: F,
    ) -> String
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, CacheError>>,
    {
        let cell = self.cell_for(&target.absolute);
        cell.get_or_init(|| async {
            if !self.force && tokio::fs::try_exists(&target.absolute).await.unwrap_or(false) {
                log::debug!(target: LOG_TARGET, "Hit    - {key} -> {}", target.public);
                self.record(CacheStats::hit);
                return target.public.clone();
            }

            match self.write_target(target, produce).await {
                Ok(size) => {
                    let file = target.public.trim_start_matches(PUBLIC_PREFIX);
                    log::info!(target: LOG_TARGET, "Cached - {key} -> {file} ({} KB)", size as f64 / 1000.0);
                    self.record(CacheStats::write);
                    target.public.clone()
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Failed - {fallback}: {e}");
                    self.record(CacheStats::failure);
                    fallback.to_string()
                }
            }
        })
        .await
        .clone()
    }

    async fn write_target<F, Fut>(&self, target: &CacheTarget, produce: F) -> Result<usize, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, CacheError>>,
    {
        let output = produce().await?;
        if let Some(parent) = target.absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Only complete files may appear at the target path: an existing file
        // is a hit for every later build with this run id.
        let partial = partial_path(&target.absolute);
        let written = match tokio::fs::write(&partial, &output).await {
            Ok(()) => tokio::fs::rename(&partial, &target.absolute).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        Ok(output.len())
    }

    async fn read_source(&self, source: &ImageSource) -> Result<Vec<u8>, CacheError> {
        match source {
            ImageSource::Url(url) => {
                let host = url::Url::parse(url)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .unwrap_or_default();
                log::info!(target: LOG_TARGET, "Dwnld  - {host} ... {}", source.key());
                Ok(http::get_bytes(&self.client, url).await?)
            }
            ImageSource::File(path) => {
                let path = self.source_root.join(path);
                log::info!(target: LOG_TARGET, "Cache  - {}", path.display());
                Ok(tokio::fs::read(&path).await?)
            }
        }
    }
}
