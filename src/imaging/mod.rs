//! Image processing in pure Rust, with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Contain → WebP** | Lanczos3 resize onto a transparent canvas, lossless WebP |
//! | **Favicon badge** | two contain fits + `imageops::overlay` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    Placement, calculate_badge_placement, calculate_contain_placement, resolve_target,
};
pub use params::{BadgeParams, ContainParams};
pub use rust_backend::RustBackend;
