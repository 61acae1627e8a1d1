use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array2, Array4};

use crate::error::NormalizeError;
use crate::face_detection::FaceRegion;

/// Side length of the square classifier input, in pixels.
pub const FACE_SIZE: usize = 48;

// fixed-size single channel face crop, intensities scaled to [0, 1]
#[derive(Debug, Clone)]
pub struct NormalizedFace {
    pixels: Array2<f32>,
}

impl NormalizedFace {
    pub fn pixels(&self) -> &Array2<f32> {
        &self.pixels
    }

    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    /// Batch-of-one NHWC tensor, the layout the FER model expects.
    pub fn to_nhwc(&self) -> Result<Array4<f32>, ndarray::ShapeError> {
        self.pixels
            .to_owned()
            .into_shape((1, FACE_SIZE, FACE_SIZE, 1))
    }
}

/// Crops `region` out of `frame`, converts it to grayscale, resizes it to
/// `FACE_SIZE` x `FACE_SIZE` and scales it to the unit interval.
///
/// Regions that run past the frame edge are clipped. A region with zero
/// width or height, or one whose origin is outside the frame, is rejected
/// rather than silently clamped.
pub fn normalize(frame: &RgbImage, region: &FaceRegion) -> Result<NormalizedFace, NormalizeError> {
    if region.is_degenerate() {
        return Err(NormalizeError::Degenerate {
            width: region.width,
            height: region.height,
        });
    }

    let (frame_width, frame_height) = frame.dimensions();
    if region.x >= frame_width || region.y >= frame_height {
        return Err(NormalizeError::OutOfBounds {
            x: region.x,
            y: region.y,
            frame_width,
            frame_height,
        });
    }

    let width = region.width.min(frame_width - region.x);
    let height = region.height.min(frame_height - region.y);

    let crop = imageops::crop_imm(frame, region.x, region.y, width, height).to_image();
    let gray = imageops::grayscale(&crop);
    let resized = imageops::resize(
        &gray,
        FACE_SIZE as u32,
        FACE_SIZE as u32,
        FilterType::Triangle,
    );

    let pixels = Array2::from_shape_fn((FACE_SIZE, FACE_SIZE), |(row, col)| {
        resized.get_pixel(col as u32, row as u32).0[0] as f32 / 255.0
    });

    Ok(NormalizedFace { pixels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient_frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 13) % 256) as u8;
            Rgb([v, 255 - v, v / 2])
        })
    }

    #[test]
    fn test_output_shape_and_range_for_various_regions() {
        let frame = gradient_frame(320, 240);
        let regions = [
            FaceRegion::new(0, 0, 1, 1),
            FaceRegion::new(10, 20, 3, 200),
            FaceRegion::new(100, 50, 48, 48),
            FaceRegion::new(0, 0, 320, 240),
            FaceRegion::new(300, 200, 100, 100),
        ];

        for region in regions.iter() {
            let face = normalize(&frame, region).unwrap();
            assert_eq!(face.shape(), (FACE_SIZE, FACE_SIZE), "{:?}", region);
            assert!(
                face.pixels().iter().all(|v| (0.0..=1.0).contains(v)),
                "{:?}",
                region
            );
        }
    }

    #[test]
    fn test_white_crop_is_all_ones() {
        let frame = RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]));
        let face = normalize(&frame, &FaceRegion::new(8, 8, 32, 32)).unwrap();
        assert!(face.pixels().iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_black_crop_is_all_zeros() {
        let frame = RgbImage::new(64, 64);
        let face = normalize(&frame, &FaceRegion::new(0, 0, 64, 64)).unwrap();
        assert!(face.pixels().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_zero_width_region_fails() {
        let frame = gradient_frame(64, 64);
        let err = normalize(&frame, &FaceRegion::new(5, 5, 0, 10)).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Degenerate {
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn test_zero_height_region_fails() {
        let frame = gradient_frame(64, 64);
        assert!(matches!(
            normalize(&frame, &FaceRegion::new(5, 5, 10, 0)),
            Err(NormalizeError::Degenerate { .. })
        ));
    }

    #[test]
    fn test_region_outside_frame_fails() {
        let frame = gradient_frame(64, 64);
        assert!(matches!(
            normalize(&frame, &FaceRegion::new(64, 0, 10, 10)),
            Err(NormalizeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_nhwc_layout() {
        let frame = gradient_frame(96, 96);
        let face = normalize(&frame, &FaceRegion::new(0, 0, 96, 96)).unwrap();
        let tensor = face.to_nhwc().unwrap();
        assert_eq!(tensor.shape(), &[1, FACE_SIZE, FACE_SIZE, 1]);
        assert_eq!(tensor[[0, 3, 7, 0]], face.pixels()[[3, 7]]);
    }
}
