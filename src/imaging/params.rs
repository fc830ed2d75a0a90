//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`cache`](crate::cache) (which decides what images to
//! create) and the [`backend`](super::backend) (which does the pixel work),
//! so the cache can be tested against a mock backend.

/// Contain-fit target box. A missing edge keeps the source's length on that
/// axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Badge-composited favicon: a square of `size` pixels with the badge
/// covering the bottom-right quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeParams {
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keeps_source_size() {
        let p = ContainParams::default();
        assert_eq!(p.width, None);
        assert_eq!(p.height, None);
    }
}
