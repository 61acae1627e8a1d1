pub mod haar_cascade;

use core::fmt::Debug;

use image::RgbImage;

use crate::error::DetectError;

/// Locates faces in a frame. Every call is independent: no tracking, and no
/// ordering guarantee for the returned regions.
pub trait FaceLocator {
    fn locate(&mut self, frame: &RgbImage) -> Result<Vec<FaceRegion>, DetectError>;
}

/// Axis-aligned bounding box around a detected face, in frame pixels.
/// Only meaningful for the frame that produced it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Debug for FaceRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceRegion")
            .field("origin", &(self.x, self.y))
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Tuning for the multi-scale sliding-window scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    /// Growth factor between successive scan scales. Must be > 1.0.
    pub scale_factor: f64,
    /// How many overlapping hits a candidate needs before it is reported.
    /// Higher is stricter.
    pub min_neighbors: i32,
    /// Smallest face side considered, in pixels.
    pub min_face_size: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
            min_face_size: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_region() {
        assert!(FaceRegion::new(10, 10, 0, 20).is_degenerate());
        assert!(FaceRegion::new(10, 10, 20, 0).is_degenerate());
        assert!(!FaceRegion::new(0, 0, 1, 1).is_degenerate());
    }

    #[test]
    fn test_default_params() {
        let params = DetectorParams::default();
        assert_eq!(params.scale_factor, 1.3);
        assert_eq!(params.min_neighbors, 5);
    }
}
