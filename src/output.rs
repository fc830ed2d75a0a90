//! CLI output formatting for `check` and `build`.
//!
//! Output is **project-centric**: each project gets a header line with its
//! catalogue position and name, and indented context lines for what the
//! pipeline knows or produced about it.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Projects
//! 001 Rboard Theme Manager V3 (rboard-theme-manager-v3)
//!     Skills: Kotlin, Gson, C, C++
//!     Downloads: releases DerTyp7214/RboardThemeManagerV3 (all), offsets 27000
//! 002 Overlayer (overlayer)
//!     Skills: Kotlin
//!     Downloads: store de.dertyp7214.overlayer
//!
//! Skills
//!     Kotlin, Gson, C, C++
//!
//! Run id: 3f2a9c0d11be
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Rboard Theme Manager V3 → 27K downloads
//!     Image: /images/cached/projects/Rboard_Theme_Manager_V3-3f2a9c0d11be.webp
//! 002 Color Utils C → no download data
//!     Image: https://icon-widget.codersrank.io/api/C
//!
//! Built 2 projects → public/projects.json
//! Images: 3 cached, 7 written (10 total)
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::cache::CacheStats;
use crate::catalogue::{Catalogue, DownloadSources, Project, slugify};
use crate::downloads::ReleaseQuery;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// One-line description of where a project's count comes from.
fn describe_sources(sources: &DownloadSources) -> String {
    if sources.is_empty() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    if let Some(package) = &sources.store {
        parts.push(format!("store {package}"));
    }
    if let Some(releases) = &sources.releases {
        let which = match releases.query() {
            ReleaseQuery::All => "all".to_string(),
            ReleaseQuery::Named(path) => path,
        };
        parts.push(format!(
            "releases {}/{} ({which})",
            releases.owner, releases.repo
        ));
    }
    if !sources.offsets.is_empty() {
        parts.push(format!("offsets {}", sources.offsets.iter().sum::<u64>()));
    }
    parts.join(", ")
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(catalogue: &Catalogue, run_id: &str) -> Vec<String> {
    let mut lines = vec!["Projects".to_string()];
    for (i, project) in catalogue.projects.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            project.name,
            slugify(&project.name)
        ));
        if !project.skills.is_empty() {
            lines.push(format!("{}Skills: {}", indent(1), project.skills.join(", ")));
        }
        lines.push(format!(
            "{}Downloads: {}",
            indent(1),
            describe_sources(&project.downloads)
        ));
    }

    let referenced = catalogue.referenced_skills();
    if !referenced.is_empty() {
        lines.push(String::new());
        lines.push("Skills".to_string());
        lines.push(format!("{}{}", indent(1), referenced.join(", ")));
    }

    lines.push(String::new());
    lines.push(format!("Run id: {run_id}"));
    lines
}

pub fn print_check_output(catalogue: &Catalogue, run_id: &str) {
    for line in format_check_output(catalogue, run_id) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(projects: &[Project], stats: &CacheStats, output: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, project) in projects.iter().enumerate() {
        let downloads = match &project.downloads_display {
            Some(display) => format!("{display} downloads"),
            None => "no download data".to_string(),
        };
        lines.push(format!("{} {} → {}", format_index(i + 1), project.name, downloads));
        if !project.image_url.is_empty() {
            lines.push(format!("{}Image: {}", indent(1), project.image_url));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Built {} → {}",
        plural(projects.len(), "project"),
        output.display()
    ));
    if stats.total() > 0 {
        lines.push(format!("Images: {stats}"));
    }
    lines
}

pub fn print_build_output(projects: &[Project], stats: &CacheStats, output: &Path) {
    for line in format_build_output(projects, stats, output) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{ProjectEntry, ProjectImages, ReleaseSource};
    use crate::downloads::AssetFilter;

    fn entry(name: &str, sources: DownloadSources) -> ProjectEntry {
        ProjectEntry {
            name: name.into(),
            skills: vec!["Kotlin".into()],
            downloads: sources,
            ..Default::default()
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "project"), "1 project");
        assert_eq!(plural(9, "project"), "9 projects");
        assert_eq!(plural(0, "project"), "0 projects");
    }

    #[test]
    fn describe_sources_combined() {
        let sources = DownloadSources {
            store: Some("de.x.app".into()),
            releases: Some(ReleaseSource {
                owner: "o".into(),
                repo: "r".into(),
                release: Some("tags/latest-release".into()),
                all: false,
                filter: AssetFilter::All,
            }),
            offsets: vec![12000, 15000],
        };
        assert_eq!(
            describe_sources(&sources),
            "store de.x.app, releases o/r (tags/latest-release), offsets 27000"
        );
    }

    #[test]
    fn describe_sources_none() {
        assert_eq!(describe_sources(&DownloadSources::default()), "none");
    }

    #[test]
    fn check_output_lists_projects_and_run_id() {
        let catalogue = Catalogue {
            skills: vec![],
            projects: vec![
                entry("Overlayer", DownloadSources {
                    store: Some("de.dertyp7214.overlayer".into()),
                    ..Default::default()
                }),
                entry("Color Utils C", DownloadSources::default()),
            ],
        };
        let lines = format_check_output(&catalogue, "abc123");

        assert_eq!(lines[0], "Projects");
        assert_eq!(lines[1], "001 Overlayer (overlayer)");
        assert_eq!(lines[2], "    Skills: Kotlin");
        assert_eq!(lines[3], "    Downloads: store de.dertyp7214.overlayer");
        assert_eq!(lines[4], "002 Color Utils C (color-utils-c)");
        assert!(lines.contains(&"    Kotlin".to_string()));
        assert_eq!(lines.last().unwrap(), "Run id: abc123");
    }

    #[test]
    fn build_output_shows_counts_and_summary() {
        let images = |url: &str| ProjectImages {
            image_url: url.into(),
            ..Default::default()
        };
        let projects = vec![
            Project::assemble(
                &entry("Overlayer", DownloadSources::default()),
                vec![],
                Some(1200),
                images("/images/cached/projects/Overlayer-1.webp"),
            ),
            Project::assemble(
                &entry("Color Utils C", DownloadSources::default()),
                vec![],
                None,
                images(""),
            ),
        ];
        let stats = CacheStats {
            hits: 1,
            writes: 2,
            failures: 0,
        };
        let lines = format_build_output(&projects, &stats, Path::new("public/projects.json"));

        assert_eq!(lines[0], "001 Overlayer → 1.2K downloads");
        assert_eq!(lines[1], "    Image: /images/cached/projects/Overlayer-1.webp");
        assert_eq!(lines[2], "002 Color Utils C → no download data");
        assert_eq!(lines[4], "Built 2 projects → public/projects.json");
        assert_eq!(lines[5], "Images: 1 cached, 2 written (3 total)");
    }

    #[test]
    fn build_output_omits_image_stats_when_idle() {
        let lines = format_build_output(&[], &CacheStats::default(), Path::new("out.json"));
        assert_eq!(lines, vec!["".to_string(), "Built 0 projects → out.json".to_string()]);
    }
}
