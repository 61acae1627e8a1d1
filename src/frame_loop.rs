
use image::RgbImage;
use tracing::info;

use crate::pipeline::{FrameReport, PipelineContext};
use crate::webcam::FrameSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminating,
}

/// Where annotated frames go, and where the quit signal comes from.
pub trait DisplaySink {
    fn show(&mut self, image: &RgbImage, status: &str);

    /// Polled once at the top of every iteration.
    fn quit_requested(&mut self) -> bool {
        false
    }
}

/// Display sink for running without a window. Logs the status line now and
/// then so a headless monitor still shows signs of life.
pub struct LogDisplay {
    every: u64,
    shown: u64,
}

impl LogDisplay {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            shown: 0,
        }
    }
}

impl DisplaySink for LogDisplay {
    fn show(&mut self, _image: &RgbImage, status: &str) {
        self.shown += 1;
        if self.shown % self.every == 0 {
            info!("{}", status);
        }
    }
}

/// Owns the capture handle and the pipeline context and drives one
/// iteration per call to [`FrameLoop::step`].
///
/// The capture handle is dropped as soon as the loop starts terminating,
/// and at the latest when the loop itself is dropped.
pub struct FrameLoop {
    source: Option<Box<dyn FrameSource>>,
    pipeline: PipelineContext,
    state: LoopState,
}

impl FrameLoop {
    pub fn new(source: Box<dyn FrameSource>, pipeline: PipelineContext) -> Self {
        Self {
            source: Some(source),
            pipeline,
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pipeline(&self) -> &PipelineContext {
        &self.pipeline
    }

    /// Runs one iteration. Returns `None` once the loop is terminating,
    /// either because `quit` was set or because the source ran dry.
    pub fn step(&mut self, quit: bool) -> Option<FrameReport> {
        if self.state == LoopState::Terminating {
            return None;
        }
        if quit {
            info!("Quit requested");
            self.terminate();
            return None;
        }

        let frame = self.source.as_mut().and_then(|source| source.next_frame());
        let Some(frame) = frame else {
            self.terminate();
            return None;
        };

        let captured_at = frame.captured_at;
        Some(self.pipeline.process_frame(frame, captured_at))
    }

    /// Loops until end-of-stream or until the display asks to quit.
    pub fn run(&mut self, display: &mut dyn DisplaySink) {
        while self.state == LoopState::Running {
            let quit = display.quit_requested();
            if let Some(report) = self.step(quit) {
                display.show(&report.image, &self.pipeline.status_line());
            }
        }
    }

    pub fn terminate(&mut self) {
        if self.state == LoopState::Terminating {
            return;
        }
        self.state = LoopState::Terminating;
        // dropping the source releases the device
        self.source = None;
        info!(
            "Stopped after {} frames",
            self.pipeline.frame_count()
        );
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.terminate();
    }
}
