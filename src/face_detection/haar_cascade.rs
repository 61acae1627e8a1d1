use std::path::Path;

use image::RgbImage;
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use tracing::info;

use crate::error::{DetectError, StartupError};
use crate::face_detection::{DetectorParams, FaceLocator, FaceRegion};

/// Viola-Jones face locator backed by an OpenCV Haar cascade.
pub struct HaarCascadeLocator {
    classifier: CascadeClassifier,
    params: DetectorParams,
}

impl HaarCascadeLocator {
    pub fn load(path: &Path, params: DetectorParams) -> Result<Self, StartupError> {
        if !path.is_file() {
            return Err(StartupError::CascadeNotFound(path.to_path_buf()));
        }

        let load_error = |message: String| StartupError::CascadeLoad {
            path: path.to_path_buf(),
            message,
        };

        let path_str = path
            .to_str()
            .ok_or_else(|| load_error("path is not valid UTF-8".to_string()))?;

        let classifier =
            CascadeClassifier::new(path_str).map_err(|e| load_error(e.to_string()))?;

        // OpenCV happily constructs a classifier from a file it could not parse
        if classifier.empty().map_err(|e| load_error(e.to_string()))? {
            return Err(load_error("cascade is empty".to_string()));
        }

        info!(
            "Loaded face cascade {} (scale factor {}, min neighbors {})",
            path.display(),
            params.scale_factor,
            params.min_neighbors
        );

        Ok(Self { classifier, params })
    }
}

impl FaceLocator for HaarCascadeLocator {
    fn locate(&mut self, frame: &RgbImage) -> Result<Vec<FaceRegion>, DetectError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let gray = image::imageops::grayscale(frame);

        let mat = Mat::from_slice(gray.as_raw().as_slice())?;
        let mat = mat.reshape(1, gray.height() as i32)?;

        let min_size = self.params.min_face_size as i32;
        let mut faces = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &mat,
            &mut faces,
            self.params.scale_factor,
            self.params.min_neighbors,
            0,
            Size::new(min_size, min_size),
            Size::new(0, 0),
        )?;

        Ok(faces.iter().map(to_region).collect())
    }
}

fn to_region(rect: Rect) -> FaceRegion {
    let x = rect.x.max(0);
    let y = rect.y.max(0);
    let width = (rect.x + rect.width - x).max(0);
    let height = (rect.y + rect.height - y).max(0);

    FaceRegion::new(x as u32, y as u32, width as u32, height as u32)
}
