//! The project catalogue and the enriched records built from it.
//!
//! `catalogue.toml` lives in the source directory and is the only place
//! projects are declared:
//!
//! ```toml
//! [[skills]]
//! name = "Kotlin"
//! image_url = "https://icon-widget.codersrank.io/api/Kotlin"
//!
//! [[projects]]
//! name = "Rboard Theme Creator"
//! authors = ["DerTyp7214"]
//! image_url = "https://raw.githubusercontent.com/.../ic_launcher-playstore.png"
//! skills = ["Kotlin"]
//! github_url = "https://github.com/DerTyp7214/RboardThemeCreator"
//! play_store_url = "https://play.google.com/store/apps/details?id=de.dertyp7214.rboardthemecreator"
//!
//! [projects.downloads]
//! store = "de.dertyp7214.rboardthemecreator"
//! offsets = [12000]
//!
//! [projects.downloads.releases]
//! owner = "DerTyp7214"
//! repo = "RboardThemeCreator"
//! all = true
//! filter = { suffix = ".apk" }
//! ```
//!
//! The catalogue is static input: anything structurally wrong with it aborts
//! the build at load time instead of degrading a single field.

use crate::cache::ImageSource;
use crate::downloads::{AssetFilter, ReleaseQuery};
use crate::skills::Skill;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CATALOGUE_FILENAME: &str = "catalogue.toml";

/// Class applied to the monochrome GitHub icon so it follows the theme.
const GITHUB_LINK_CLASS: &str = "invert dark:invert-0";

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Catalogue validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalogue {
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
}

/// One `[[projects]]` entry as authored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub image_url: Option<ImageSource>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub github_url: Option<String>,
    pub play_store_url: Option<String>,
    #[serde(default)]
    pub keypoints: Vec<String>,
    pub download_url: Option<String>,
    pub alternative_download: Option<Link>,
    #[serde(default)]
    pub extra_links: Vec<ExtraLink>,
    #[serde(default)]
    pub downloads: DownloadSources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraLink {
    pub name: String,
    pub url: String,
    pub icon: Option<ImageSource>,
    pub class_name: Option<String>,
}

/// Where a project's download count comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadSources {
    /// Package id on the store.
    pub store: Option<String>,
    pub releases: Option<ReleaseSource>,
    /// Historical counts that no source reports any more.
    #[serde(default)]
    pub offsets: Vec<u64>,
}

impl DownloadSources {
    pub fn is_empty(&self) -> bool {
        self.store.is_none() && self.releases.is_none() && self.offsets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSource {
    pub owner: String,
    pub repo: String,
    /// Path under `releases/`, e.g. `latest` or `tags/v2`. Ignored with `all`.
    pub release: Option<String>,
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub filter: AssetFilter,
}

impl ReleaseSource {
    pub fn query(&self) -> ReleaseQuery {
        if self.all {
            ReleaseQuery::All
        } else {
            ReleaseQuery::Named(self.release.clone().unwrap_or_else(|| "latest".into()))
        }
    }
}

/// Lowercase `name` and turn each whitespace character into `-`.
pub fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

impl Catalogue {
    /// Parse and validate catalogue text.
    pub fn parse(content: &str) -> Result<Self, CatalogueError> {
        let catalogue: Catalogue = toml::from_str(content)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn validate(&self) -> Result<(), CatalogueError> {
        let mut ids = HashSet::new();
        for project in &self.projects {
            if project.name.trim().is_empty() {
                return Err(CatalogueError::Validation(
                    "project name must not be empty".into(),
                ));
            }
            let id = slugify(&project.name);
            if !ids.insert(id.clone()) {
                return Err(CatalogueError::Validation(format!(
                    "duplicate project id '{id}' (from \"{}\")",
                    project.name
                )));
            }
            if let Some(releases) = &project.downloads.releases {
                if releases.owner.is_empty() || releases.repo.is_empty() {
                    return Err(CatalogueError::Validation(format!(
                        "project \"{}\": releases need both owner and repo",
                        project.name
                    )));
                }
            }
        }

        let mut skills = HashSet::new();
        for skill in &self.skills {
            if !skills.insert(skill.name.as_str()) {
                return Err(CatalogueError::Validation(format!(
                    "duplicate skill '{}'",
                    skill.name
                )));
            }
        }
        Ok(())
    }

    /// Every skill name referenced by a project, in first-seen order.
    pub fn referenced_skills(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.projects
            .iter()
            .flat_map(|p| p.skills.iter().map(String::as_str))
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Read and validate `catalogue.toml` from `dir`.
///
/// Returns the raw text too; it seeds the run identifier when none is set.
pub fn load_catalogue(dir: &Path) -> Result<(Catalogue, String), CatalogueError> {
    let content = fs::read_to_string(dir.join(CATALOGUE_FILENAME))?;
    let catalogue = Catalogue::parse(&content)?;
    Ok((catalogue, content))
}

// ============================================================================
// Output records
// ============================================================================

/// A link as rendered, icon already cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectLink {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

/// Cached image paths for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectImages {
    pub image_url: String,
    pub play_store_icon: String,
    pub github_icon: String,
    pub favicon_url: String,
    /// One entry per declared extra link, in order.
    pub link_icons: Vec<Option<String>>,
}

/// Enriched project record handed to the page layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub authors: Vec<String>,
    pub image_url: String,
    pub skills: Vec<Skill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_store_url: Option<String>,
    pub play_store_icon: String,
    pub github_icon: String,
    pub keypoints: Vec<String>,
    pub extra_links: Vec<ProjectLink>,
    pub downloads: Option<u64>,
    pub downloads_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_download: Option<Link>,
    pub favicon_url: String,
}

impl Project {
    /// Combine an entry with its resolved skills, count and cached images.
    pub fn assemble(
        entry: &ProjectEntry,
        skills: Vec<Skill>,
        downloads: Option<u64>,
        images: ProjectImages,
    ) -> Self {
        let mut extra_links: Vec<ProjectLink> = entry
            .extra_links
            .iter()
            .zip(images.link_icons.into_iter().chain(std::iter::repeat(None)))
            .map(|(link, icon_url)| ProjectLink {
                name: link.name.clone(),
                url: link.url.clone(),
                icon_url,
                class_name: link.class_name.clone(),
            })
            .collect();

        if let Some(github_url) = &entry.github_url {
            extra_links.push(ProjectLink {
                name: "GitHub".into(),
                url: github_url.clone(),
                icon_url: Some(images.github_icon.clone()),
                class_name: Some(GITHUB_LINK_CLASS.into()),
            });
        }

        Self {
            id: slugify(&entry.name),
            name: entry.name.clone(),
            authors: entry.authors.clone(),
            image_url: images.image_url,
            skills,
            github_url: entry.github_url.clone(),
            play_store_url: entry.play_store_url.clone(),
            play_store_icon: images.play_store_icon,
            github_icon: images.github_icon,
            keypoints: entry.keypoints.clone(),
            extra_links,
            downloads,
            downloads_display: downloads.map(crate::numbers::format_rounded),
            download_url: entry.download_url.clone(),
            alternative_download: entry.alternative_download.clone(),
            favicon_url: images.favicon_url,
        }
    }
}
