//! Error types for the monitor.
//!
//! Only [`StartupError`] is fatal. Everything else is scoped to one frame,
//! one face or one dispatch attempt and is logged by the caller.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures that halt the process before the frame loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not open camera {index}: {message}")]
    CameraOpen { index: u32, message: String },

    #[error("Face cascade not found: {0}")]
    CascadeNotFound(PathBuf),

    #[error("Could not load face cascade {path}: {message}")]
    CascadeLoad { path: PathBuf, message: String },

    #[error("Emotion model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Could not load emotion model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("Could not build HTTP client: {0}")]
    HttpClient(String),

    #[error("Display failed: {0}")]
    Display(String),
}

/// A frame could not be read from the capture device.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera read failed")]
    Read,

    #[error("No frame from camera within {0:?}")]
    Stalled(Duration),

    #[error("Frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// The face locator failed on one frame.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Face detection failed: {0}")]
    Backend(String),
}

impl From<opencv::Error> for DetectError {
    fn from(err: opencv::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A face region could not be turned into a classifier input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Degenerate face region {width}x{height}")]
    Degenerate { width: u32, height: u32 },

    #[error("Face region origin ({x}, {y}) lies outside the {frame_width}x{frame_height} frame")]
    OutOfBounds {
        x: u32,
        y: u32,
        frame_width: u32,
        frame_height: u32,
    },
}

/// Inference failed for one face.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("ONNX runtime error: {0}")]
    Runtime(#[from] ort::OrtError),

    #[error("Invalid input shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Model produced no output")]
    MissingOutput,

    #[error("Model produced {actual} scores, expected {expected}")]
    OutputLength { expected: usize, actual: usize },

    #[error("Model produced a non-finite score")]
    NonFinite,
}

/// One dispatch attempt failed. Never retried within the same window.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Server answered with status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
