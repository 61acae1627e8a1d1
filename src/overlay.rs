use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use tracing::{info, warn};

use crate::face_detection::FaceRegion;

const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const STATUS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;

/// Draws face boxes, labels and the status line onto frames.
///
/// Text needs a TrueType font. Without one only boxes are drawn. Nothing in
/// here can fail.
pub struct OverlayRenderer {
    font: Option<Font<'static>>,
    label_scale: Scale,
    status_scale: Scale,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            font: None,
            label_scale: Scale::uniform(20.0),
            status_scale: Scale::uniform(18.0),
        }
    }
}

impl OverlayRenderer {
    pub fn with_font(font: Font<'static>) -> Self {
        Self {
            font: Some(font),
            ..Default::default()
        }
    }

    /// Loads the font at `path`, falling back to a box-only renderer.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            warn!("No overlay font configured, labels will only appear in the status bar");
            return Self::default();
        };

        let font = std::fs::read(path)
            .ok()
            .and_then(Font::try_from_vec);

        match font {
            Some(font) => {
                info!("Loaded overlay font {}", path.display());
                Self::with_font(font)
            }
            None => {
                warn!("Could not load overlay font {}, drawing boxes only", path.display());
                Self::default()
            }
        }
    }

    pub fn draw_face(&self, image: &mut RgbImage, region: &FaceRegion, label: &str) {
        if region.is_degenerate() {
            return;
        }

        for inset in 0..BOX_THICKNESS {
            let width = region.width.saturating_sub(2 * inset);
            let height = region.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at((region.x + inset) as i32, (region.y + inset) as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(image, rect, BOX_COLOR);
        }

        if let Some(font) = &self.font {
            // label sits just above the box, or inside it at the top edge
            let y = (region.y as i32 - self.label_scale.y as i32 - 4).max(0);
            draw_text_mut(
                image,
                LABEL_COLOR,
                region.x as i32,
                y,
                self.label_scale,
                font,
                label,
            );
        }
    }

    pub fn draw_status(&self, image: &mut RgbImage, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(image, STATUS_COLOR, 10, 10, self.status_scale, font, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_is_drawn_without_font() {
        let renderer = OverlayRenderer::default();
        let mut image = RgbImage::new(100, 100);

        renderer.draw_face(&mut image, &FaceRegion::new(10, 20, 30, 40), "Happy");

        assert_eq!(*image.get_pixel(10, 20), BOX_COLOR);
        assert_eq!(*image.get_pixel(11, 21), BOX_COLOR);
        assert_eq!(*image.get_pixel(39, 59), BOX_COLOR);
        // interior untouched
        assert_eq!(*image.get_pixel(25, 40), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_box_past_frame_edge_is_clipped() {
        let renderer = OverlayRenderer::default();
        let mut image = RgbImage::new(50, 50);

        renderer.draw_face(&mut image, &FaceRegion::new(40, 40, 100, 100), "Sad");

        assert_eq!(*image.get_pixel(40, 45), BOX_COLOR);
    }

    #[test]
    fn test_status_without_font_is_noop() {
        let renderer = OverlayRenderer::default();
        let mut image = RgbImage::new(64, 64);
        let before = image.clone();

        renderer.draw_status(&mut image, "Frames: 1 | Patient: p1");

        assert_eq!(image, before);
    }

    #[test]
    fn test_missing_font_falls_back() {
        let renderer = OverlayRenderer::load(Some(Path::new("/nonexistent/font.ttf")));
        assert!(renderer.font.is_none());
    }
}
