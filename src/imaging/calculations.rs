//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Where a resized image lands on its canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Resolve the output canvas size: requested edges win, missing ones fall
/// back to the source.
pub fn resolve_target(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> (u32, u32) {
    (width.unwrap_or(source.0), height.unwrap_or(source.1))
}

/// Calculate a "contain" fit: the largest size that keeps the source aspect
/// ratio and fits inside `target`, centered on the canvas.
///
/// # Examples
/// ```
/// # use folio_build::imaging::calculate_contain_placement;
/// // 400x200 into a 100x100 box: 100x50, letterboxed 25px top and bottom
/// let p = calculate_contain_placement((400, 200), (100, 100));
/// assert_eq!((p.width, p.height, p.x, p.y), (100, 50, 0, 25));
/// ```
pub fn calculate_contain_placement(source: (u32, u32), target: (u32, u32)) -> Placement {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (tgt_w, tgt_h) = target;

    let scale = (tgt_w as f64 / src_w as f64).min(tgt_h as f64 / src_h as f64);
    let width = ((src_w as f64 * scale).round() as u32).clamp(1, tgt_w.max(1));
    let height = ((src_h as f64 * scale).round() as u32).clamp(1, tgt_h.max(1));

    Placement {
        width,
        height,
        x: tgt_w.saturating_sub(width) / 2,
        y: tgt_h.saturating_sub(height) / 2,
    }
}

/// Badge box for a favicon of `size` pixels: half the edge, flush with the
/// bottom-right corner.
pub fn calculate_badge_placement(size: u32) -> Placement {
    let edge = (size / 2).max(1);
    Placement {
        width: edge,
        height: edge,
        x: size.saturating_sub(edge),
        y: size.saturating_sub(edge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_target_uses_requested_edges() {
        assert_eq!(resolve_target((800, 600), Some(250), Some(250)), (250, 250));
    }

    #[test]
    fn resolve_target_falls_back_per_axis() {
        assert_eq!(resolve_target((800, 600), None, None), (800, 600));
        assert_eq!(resolve_target((800, 600), Some(32), None), (32, 600));
    }

    #[test]
    fn contain_landscape_into_square() {
        let p = calculate_contain_placement((400, 200), (100, 100));
        assert_eq!(
            p,
            Placement {
                width: 100,
                height: 50,
                x: 0,
                y: 25
            }
        );
    }

    #[test]
    fn contain_portrait_into_square() {
        let p = calculate_contain_placement((300, 600), (120, 120));
        assert_eq!((p.width, p.height, p.x, p.y), (60, 120, 30, 0));
    }

    #[test]
    fn contain_same_aspect_fills_canvas() {
        let p = calculate_contain_placement((512, 512), (250, 250));
        assert_eq!((p.width, p.height, p.x, p.y), (250, 250, 0, 0));
    }

    #[test]
    fn contain_upscales_small_sources() {
        let p = calculate_contain_placement((16, 16), (32, 32));
        assert_eq!((p.width, p.height), (32, 32));
    }

    #[test]
    fn contain_extreme_aspect_keeps_one_pixel() {
        let p = calculate_contain_placement((10_000, 1), (100, 100));
        assert_eq!(p.width, 100);
        assert_eq!(p.height, 1);
    }

    #[test]
    fn badge_covers_bottom_right_quarter() {
        let p = calculate_badge_placement(64);
        assert_eq!(
            p,
            Placement {
                width: 32,
                height: 32,
                x: 32,
                y: 32
            }
        );
    }

    #[test]
    fn badge_odd_size() {
        let p = calculate_badge_placement(65);
        assert_eq!((p.width, p.x), (32, 33));
    }
}
