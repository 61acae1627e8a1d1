//! Live camera emotion monitor.
//!
//! Each frame is scanned for faces, every face is classified into one of
//! seven emotions and mapped to a wellbeing score, the result is drawn on
//! the frame, and at most once per throttling window the current candidate
//! is reported to a remote endpoint for the configured patient.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod emotion;
pub mod error;
pub mod face;
pub mod face_detection;
pub mod frame_loop;
pub mod overlay;
pub mod pipeline;
pub mod utils;
pub mod webcam;

pub use config::{Args, MonitorConfig};
pub use dispatch::{DispatchOutcome, DispatchThrottler, MoodEvent, MoodTransport};
pub use emotion::{Emotion, EmotionClassifier, EmotionPrediction, ScoredEmotion};
pub use face_detection::{DetectorParams, FaceLocator, FaceRegion};
pub use frame_loop::{DisplaySink, FrameLoop, LoopState};
pub use pipeline::{CandidatePolicy, FrameReport, PipelineContext};
pub use webcam::{Frame, FrameSource};
