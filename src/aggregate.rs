//! Catalogue to project list: the build's single fan-out/fan-in pass.
//!
//! ```text
//!              ┌── skills (preloaded table) ───────────┐
//! entry ──────►├── store estimate ─┐                   ├──► Project
//!              │   release assets ─┴─ merge + offsets  │
//!              └── images: project, badges, favicon,   ┘
//!                  extra-link icons
//! ```
//!
//! All projects run concurrently and are joined once; the output keeps
//! catalogue order whatever order the work finishes in. Nothing in here
//! fails: external errors degrade the field they feed.

use crate::cache::{ImageCache, ImageRequest, ImageSource};
use crate::catalogue::{Catalogue, DownloadSources, Project, ProjectEntry, ProjectImages, slugify};
use crate::config::{ImagesConfig, SiteConfig};
use crate::downloads::{CountError, LOG_TARGET, PatternExtractor, ReleaseCounter, StoreEstimate};
use crate::http::{self, FetchError};
use crate::imaging::{ImageBackend, RustBackend};
use crate::skills::{SkillSource, SkillTable, TableSkillSource};
use futures::future::join_all;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("HTTP client: {0}")]
    Http(#[from] FetchError),
    #[error("store pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Everything a build run needs besides the catalogue.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: SiteConfig,
    /// Directory holding `catalogue.toml`; relative paths resolve here.
    pub source_root: PathBuf,
    pub run_id: String,
    /// Regenerate cached images even when present.
    pub force: bool,
}

impl BuildContext {
    pub fn public_dir(&self) -> PathBuf {
        self.source_root.join(&self.config.public_dir)
    }
}

/// Shared badge images every project card uses.
struct Badges {
    play_store: ImageRequest,
    github: ImageRequest,
    favicon: ImageSource,
}

impl Badges {
    fn from_config(config: &SiteConfig) -> Self {
        let size = config.images.badge_size;
        Self {
            play_store: ImageRequest::new(ImageSource::parse(&config.badges.play_store), "playStore")
                .subdir("favicons")
                .square(size),
            github: ImageRequest::new(ImageSource::parse(&config.badges.github), "gitHub")
                .subdir("favicons")
                .square(size),
            favicon: ImageSource::parse(&config.badges.favicon),
        }
    }
}

pub struct Aggregator<B: ImageBackend = RustBackend> {
    store: StoreEstimate,
    releases: ReleaseCounter,
    images: ImageCache<B>,
    sizes: ImagesConfig,
    badges: Badges,
}

impl Aggregator<RustBackend> {
    /// Wire up the HTTP client, counters and image cache from a context.
    pub fn new(ctx: &BuildContext) -> Result<Self, SetupError> {
        let client = http::build_client(&ctx.config.http)?;
        let extractor = PatternExtractor::new(&ctx.config.store.pattern)?;
        let store = StoreEstimate::new(
            client.clone(),
            ctx.config.store.base_url.clone(),
            Box::new(extractor),
        );
        let releases = ReleaseCounter::from_env(client.clone(), &ctx.config.releases);
        let images = ImageCache::new(
            client,
            RustBackend::new(),
            ctx.public_dir(),
            &ctx.source_root,
            ctx.run_id.clone(),
        )
        .with_force(ctx.force);

        Ok(Self::with_parts(store, releases, images, &ctx.config))
    }
}

impl<B: ImageBackend> Aggregator<B> {
    pub fn with_parts(
        store: StoreEstimate,
        releases: ReleaseCounter,
        images: ImageCache<B>,
        config: &SiteConfig,
    ) -> Self {
        Self {
            store,
            releases,
            images,
            sizes: config.images.clone(),
            badges: Badges::from_config(config),
        }
    }

    pub fn images(&self) -> &ImageCache<B> {
        &self.images
    }

    /// Enrich every project, resolving skills against the catalogue's own
    /// `[[skills]]` table.
    pub async fn build(&self, catalogue: &Catalogue) -> Vec<Project> {
        let source = TableSkillSource::new(catalogue.skills.iter().cloned());
        self.build_with(catalogue, &source).await
    }

    pub async fn build_with<S: SkillSource>(&self, catalogue: &Catalogue, skills: &S) -> Vec<Project> {
        let table = SkillTable::preload(skills, catalogue.referenced_skills()).await;
        log::info!(
            "building {} project(s) with {} known skill(s)",
            catalogue.projects.len(),
            table.len()
        );

        join_all(
            catalogue
                .projects
                .iter()
                .map(|entry| self.build_project(entry, &table)),
        )
        .await
    }

    async fn build_project(&self, entry: &ProjectEntry, table: &SkillTable) -> Project {
        let (skills, downloads, images) = tokio::join!(
            async { table.resolve(&entry.skills) },
            self.count_downloads(&entry.name, &entry.downloads),
            self.cache_images(entry),
        );
        log::debug!("{}: {} download(s)", entry.name, downloads.map_or("no".into(), |d| d.to_string()));
        Project::assemble(entry, skills, downloads, images)
    }

    async fn count_downloads(&self, project: &str, sources: &DownloadSources) -> Option<u64> {
        let store = async {
            let package = sources.store.as_deref()?;
            report(project, "store estimate", self.store.downloads(package).await)
        };
        let releases = async {
            let release = sources.releases.as_ref()?;
            let count = self
                .releases
                .downloads(&release.owner, &release.repo, &release.query(), |asset| {
                    release.filter.matches(asset)
                })
                .await;
            report(project, "release assets", count)
        };

        let (store, releases) = tokio::join!(store, releases);
        merge_downloads(store, releases, &sources.offsets)
    }

    async fn cache_images(&self, entry: &ProjectEntry) -> ProjectImages {
        let id = slugify(&entry.name);
        let project_image = async {
            match &entry.image_url {
                Some(source) => {
                    let request = ImageRequest::new(source.clone(), &entry.name)
                        .subdir("projects")
                        .square(self.sizes.project_size);
                    self.images.cache_image(&request).await
                }
                None => String::new(),
            }
        };
        let favicon = async {
            match &entry.image_url {
                Some(source) => {
                    let name = format!("{id}-favicon");
                    self.images
                        .cache_favicon(source, &self.badges.favicon, &name, self.sizes.favicon_size)
                        .await
                }
                None => String::new(),
            }
        };
        let link_icons = join_all(entry.extra_links.iter().map(|link| async move {
            let icon = link.icon.as_ref()?;
            let request = ImageRequest::new(icon.clone(), slugify(&link.name))
                .subdir("icons")
                .square(self.sizes.icon_size);
            Some(self.images.cache_image(&request).await)
        }));

        let (image_url, play_store_icon, github_icon, favicon_url, link_icons) = tokio::join!(
            project_image,
            self.images.cache_image(&self.badges.play_store),
            self.images.cache_image(&self.badges.github),
            favicon,
            link_icons,
        );

        ProjectImages {
            image_url,
            play_store_icon,
            github_icon,
            favicon_url,
            link_icons,
        }
    }
}

fn report(project: &str, source: &str, count: Result<u64, CountError>) -> Option<u64> {
    match count {
        Ok(count) => Some(count),
        Err(e) => {
            log::warn!(target: LOG_TARGET, "{project}: {source} unavailable ({e})");
            None
        }
    }
}

/// Sum what the sources reported plus the historical offsets.
///
/// `None` only when no source reported and there are no offsets, so a
/// project without data renders no count rather than zero.
pub fn merge_downloads(store: Option<u64>, releases: Option<u64>, offsets: &[u64]) -> Option<u64> {
    if store.is_none() && releases.is_none() && offsets.is_empty() {
        return None;
    }
    Some(store.unwrap_or(0) + releases.unwrap_or(0) + offsets.iter().sum::<u64>())
}
