//! # Folio Build
//!
//! The build-time data pipeline of a static developer portfolio. The pages
//! themselves are rendered elsewhere; this crate produces the data they render:
//! every project from the catalogue, enriched with a live download count and
//! with all of its images copied into the site's public directory.
//!
//! # Architecture: One Fan-Out, One Barrier
//!
//! ```text
//! catalogue.toml ──► Catalogue ──► Aggregator ──► Vec<Project> ──► projects.json
//!                                     │
//!                    ┌────────────────┼────────────────┐
//!                    ▼                ▼                ▼
//!               SkillTable      download counters   ImageCache
//!                               (store + releases)  (public/images/cached/)
//! ```
//!
//! Every project is enriched concurrently and the results are joined once,
//! in catalogue order. Work inside a project (skills, counts, images) is also
//! concurrent. Everything runs on one thread: the work is network and disk
//! bound, so a current-thread tokio runtime multiplexes it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`numbers`] | Parse `12K` / `5+` labels, format counts back as `1.2K` |
//! | [`http`] | Shared `reqwest` client and status handling |
//! | [`downloads`] | Store-page estimate and release-asset counters |
//! | [`imaging`] | Pure-Rust contain-fit, WebP encoding and favicon badges |
//! | [`cache`] | Deterministic get-or-create image cache |
//! | [`skills`] | Skill descriptors and the preloaded lookup table |
//! | [`catalogue`] | `catalogue.toml` loading/validation and the `Project` record |
//! | [`aggregate`] | The per-build pass that ties it all together |
//! | [`config`] | `config.toml` loading, validation and stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Degrade, Don't Abort
//!
//! A portfolio build should not fail because a store page changed its markup
//! or an image host is down. External failures are absorbed where they happen:
//! a count that cannot be read contributes nothing, an image that cannot be
//! cached is linked from its original location. Only a broken config or
//! catalogue (static, reviewed input) stops the build.
//!
//! ## Typed Failures, Caller-Chosen Defaults
//!
//! Counters return `Result<u64, CountError>` rather than a silent `0`. The
//! aggregator decides that any failure means "no data", which keeps a project
//! whose sources are all down from claiming zero downloads.
//!
//! ## Run-Scoped Cache Names
//!
//! Cached files are named `<name>-<run id>.<ext>`. An existing file is never
//! regenerated, so a build only pays for new images; changing the run id
//! starts a fresh generation. Within a build, identical requests share one
//! fetch and encode.

pub mod aggregate;
pub mod cache;
pub mod catalogue;
pub mod config;
pub mod downloads;
pub mod http;
pub mod imaging;
pub mod numbers;
pub mod output;
pub mod skills;
