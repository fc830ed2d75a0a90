//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the image cache
//! needs: contain-fit transcode and badge compositing. Both work on in-memory
//! buffers because sources may come from the network.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{BadgeParams, ContainParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Implementations return the encoded output; writing it to disk is the
/// cache's job.
pub trait ImageBackend: Send + Sync {
    /// Fit the image inside the target box on a transparent canvas and
    /// encode it in the cache's raster format.
    fn contain(&self, bytes: &[u8], params: &ContainParams) -> Result<Vec<u8>, BackendError>;

    /// Fit `base` into a square and draw `badge` over its bottom-right corner.
    fn badge(&self, base: &[u8], badge: &[u8], params: &BadgeParams)
    -> Result<Vec<u8>, BackendError>;
}
