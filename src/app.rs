use std::time::Instant;

use crate::frame_loop::{FrameLoop, LoopState};
use crate::utils::FrameRate;

pub const WINDOW_TITLE: &str = "Patient Emotion Monitor";

/// Window front-end: every repaint runs one iteration of the frame loop on
/// the UI thread and shows the annotated frame.
pub struct MonitorApp {
    frame_loop: FrameLoop,
    texture: Option<egui::TextureHandle>,
    frame_rate: FrameRate,
}

impl MonitorApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, frame_loop: FrameLoop) -> Self {
        Self {
            frame_loop,
            texture: None,
            frame_rate: FrameRate::default(),
        }
    }

    fn status_text(&self) -> String {
        match self.frame_rate.fps() {
            Some(fps) => format!(
                "{} | FPS: {:.0} | press Q to quit",
                self.frame_loop.pipeline().status_line(),
                fps
            ),
            None => format!("{} | press Q to quit", self.frame_loop.pipeline().status_line()),
        }
    }
}

impl eframe::App for MonitorApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let quit = ctx.input(|i| i.key_pressed(egui::Key::Q) || i.key_pressed(egui::Key::Escape));

        if let Some(report) = self.frame_loop.step(quit) {
            self.frame_rate.tick(Instant::now());

            let image = &report.image;
            let size = [image.width() as usize, image.height() as usize];
            let ui_image = egui::ColorImage::from_rgb(size, image.as_raw().as_slice());

            match self.texture.as_mut() {
                Some(texture) => texture.set(ui_image, egui::TextureOptions::default()),
                None => {
                    self.texture =
                        Some(ctx.load_texture("frame", ui_image, egui::TextureOptions::default()))
                }
            }
        }

        if self.frame_loop.state() == LoopState::Terminating {
            frame.close();
            return;
        }

        let status = self.status_text();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                // scale to panel width, keep aspect ratio
                let [width, height] = texture.size();
                let ui_img_width = ui.available_width();
                let ui_img_height = ui_img_width * height as f32 / width.max(1) as f32;

                ui.image(texture, egui::Vec2::new(ui_img_width, ui_img_height));
            } else {
                ui.label("Waiting for camera...");
            }
        });

        // the camera paces the loop, so repaint as soon as possible
        ctx.request_repaint();
    }
}
