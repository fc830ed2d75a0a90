//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::load_from_memory` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Transparent canvas + placement | `image::imageops::overlay` |
//! | Encode → WebP | `image` WebP encoder (lossless) |

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_badge_placement, calculate_contain_placement, resolve_target};
use super::params::{BadgeParams, ContainParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Fully transparent white, the "contain" letterbox colour.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes)
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {e}")))
}

/// Resize `img` to fit inside `target` and center it on a transparent canvas.
fn contain_on_canvas(img: &DynamicImage, target: (u32, u32)) -> RgbaImage {
    let placement = calculate_contain_placement((img.width(), img.height()), target);
    let resized = img
        .resize_exact(placement.width, placement.height, FilterType::Lanczos3)
        .to_rgba8();

    let mut canvas = RgbaImage::from_pixel(target.0.max(1), target.1.max(1), BACKGROUND);
    image::imageops::overlay(
        &mut canvas,
        &resized,
        i64::from(placement.x),
        i64::from(placement.y),
    );
    canvas
}

fn encode_webp(img: RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e}")))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn contain(&self, bytes: &[u8], params: &ContainParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(bytes)?;
        let target = resolve_target((img.width(), img.height()), params.width, params.height);
        encode_webp(contain_on_canvas(&img, target))
    }

    fn badge(
        &self,
        base: &[u8],
        badge: &[u8],
        params: &BadgeParams,
    ) -> Result<Vec<u8>, BackendError> {
        let size = params.size.max(2);
        let mut canvas = contain_on_canvas(&decode(base)?, (size, size));

        let spot = calculate_badge_placement(size);
        let badge = contain_on_canvas(&decode(badge)?, (spot.width, spot.height));
        image::imageops::overlay(&mut canvas, &badge, i64::from(spot.x), i64::from(spot.y));

        encode_webp(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, RgbImage};

    /// Encode a small gradient PNG with the given dimensions.
    fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buf
    }

    fn square(edge: u32) -> ContainParams {
        ContainParams {
            width: Some(edge),
            height: Some(edge),
        }
    }

    fn decoded(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory_with_format(bytes, ImageFormat::WebP).unwrap()
    }

    #[test]
    fn contain_produces_webp_of_target_size() {
        let out = RustBackend::new()
            .contain(&test_png(400, 200), &square(100))
            .unwrap();
        let img = decoded(&out);
        assert_eq!((img.width(), img.height()), (100, 100));
    }

    #[test]
    fn contain_letterbox_is_transparent() {
        let out = RustBackend::new()
            .contain(&test_png(400, 200), &square(100))
            .unwrap();
        let img = decoded(&out).to_rgba8();
        // Top rows are padding, the middle is the picture
        assert_eq!(img.get_pixel(50, 0)[3], 0);
        assert_eq!(img.get_pixel(50, 50)[3], 255);
    }

    #[test]
    fn contain_without_target_keeps_size() {
        let out = RustBackend::new()
            .contain(&test_png(40, 30), &ContainParams::default())
            .unwrap();
        let img = decoded(&out);
        assert_eq!((img.width(), img.height()), (40, 30));
    }

    #[test]
    fn contain_garbage_errors() {
        let result = RustBackend::new().contain(b"<html>", &square(10));
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn badge_composes_square() {
        let out = RustBackend::new()
            .badge(&test_png(300, 300), &test_png(50, 50), &BadgeParams { size: 64 })
            .unwrap();
        let img = decoded(&out);
        assert_eq!((img.width(), img.height()), (64, 64));
    }
}
