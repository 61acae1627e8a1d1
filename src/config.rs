//! Command line / environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::error::StartupError;
use crate::face_detection::DetectorParams;
use crate::pipeline::CandidatePolicy;
use crate::webcam::CameraSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "emotion-monitor")]
#[command(author, version, about = "Live facial emotion monitor with periodic wellbeing reports", long_about = None)]
pub struct Args {
    /// Base URL of the mood aggregation server
    #[arg(long, env = "EMOTION_MONITOR_SERVER_URL", default_value = "http://localhost:5000")]
    pub server_url: String,

    /// Identifier reported with every observation
    #[arg(long, env = "EMOTION_MONITOR_PATIENT_ID", default_value = "patient_001")]
    pub patient_id: String,

    /// Minimum seconds between two dispatch attempts
    #[arg(long, env = "EMOTION_MONITOR_SEND_INTERVAL", default_value_t = 5.0)]
    pub send_interval: f64,

    /// HTTP timeout for one dispatch attempt, in seconds
    #[arg(long, env = "EMOTION_MONITOR_REQUEST_TIMEOUT", default_value_t = 2.0)]
    pub request_timeout: f64,

    /// Emotion classifier (ONNX)
    #[arg(long, env = "EMOTION_MONITOR_MODEL", default_value = "fer.onnx")]
    pub model: PathBuf,

    /// Haar cascade for face detection
    #[arg(
        long,
        env = "EMOTION_MONITOR_CASCADE",
        default_value = "haarcascade_frontalface_default.xml"
    )]
    pub cascade: PathBuf,

    /// Detector scale growth factor (> 1.0)
    #[arg(long, env = "EMOTION_MONITOR_SCALE_FACTOR", default_value_t = 1.3)]
    pub scale_factor: f64,

    /// Detector minimum neighbour count (higher is stricter)
    #[arg(long, env = "EMOTION_MONITOR_MIN_NEIGHBORS", default_value_t = 5)]
    pub min_neighbors: i32,

    /// Smallest face side to detect, in pixels
    #[arg(long, env = "EMOTION_MONITOR_MIN_FACE_SIZE", default_value_t = 30)]
    pub min_face_size: u32,

    /// Camera index
    #[arg(long, env = "EMOTION_MONITOR_CAMERA", default_value_t = 0)]
    pub camera: u32,

    /// Requested capture width
    #[arg(long, env = "EMOTION_MONITOR_WIDTH", default_value_t = 640)]
    pub width: u32,

    /// Requested capture height
    #[arg(long, env = "EMOTION_MONITOR_HEIGHT", default_value_t = 480)]
    pub height: u32,

    /// Requested capture frame rate
    #[arg(long, env = "EMOTION_MONITOR_FPS", default_value_t = 30)]
    pub fps: u32,

    /// Seconds to wait for a frame before treating the camera as lost
    #[arg(long, env = "EMOTION_MONITOR_FRAME_TIMEOUT", default_value_t = 5.0)]
    pub frame_timeout: f64,

    /// Flip frames horizontally
    #[arg(long, env = "EMOTION_MONITOR_MIRROR")]
    pub mirror: bool,

    /// TrueType font for overlay text
    #[arg(long, env = "EMOTION_MONITOR_FONT")]
    pub font: Option<PathBuf>,

    /// Which face is reported when several are visible
    #[arg(long, env = "EMOTION_MONITOR_SELECTION", value_enum, default_value_t = Selection::Last)]
    pub selection: Selection,

    /// Run without a window
    #[arg(long, env = "EMOTION_MONITOR_HEADLESS")]
    pub headless: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Selection {
    /// Last face processed in the frame
    Last,
    /// Most confident face in the frame
    Confidence,
}

impl From<Selection> for CandidatePolicy {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Last => CandidatePolicy::LastProcessed,
            Selection::Confidence => CandidatePolicy::HighestConfidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub server_url: Url,
    pub patient_id: String,
    pub interval: Duration,
    pub timeout: Duration,
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub dispatch: DispatchSettings,
    pub detector: DetectorParams,
    pub camera: CameraSettings,
    pub model_path: PathBuf,
    pub cascade_path: PathBuf,
    pub font_path: Option<PathBuf>,
    pub policy: CandidatePolicy,
    pub headless: bool,
}

impl Args {
    pub fn into_config(self) -> Result<MonitorConfig, StartupError> {
        let server_url = Url::parse(&self.server_url)
            .map_err(|e| StartupError::Config(format!("server url '{}': {}", self.server_url, e)))?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(StartupError::Config(format!(
                "server url must be http or https, got '{}'",
                server_url.scheme()
            )));
        }

        let patient_id = self.patient_id.trim().to_string();
        if patient_id.is_empty() {
            return Err(StartupError::Config("patient id must not be empty".to_string()));
        }

        let interval = positive_seconds("send interval", self.send_interval)?;
        let timeout = positive_seconds("request timeout", self.request_timeout)?;
        let frame_timeout = positive_seconds("frame timeout", self.frame_timeout)?;

        if !(self.scale_factor > 1.0) {
            return Err(StartupError::Config(format!(
                "scale factor must be greater than 1.0, got {}",
                self.scale_factor
            )));
        }
        if self.min_neighbors < 0 {
            return Err(StartupError::Config(format!(
                "min neighbors must not be negative, got {}",
                self.min_neighbors
            )));
        }
        if self.width == 0 || self.height == 0 || self.fps == 0 {
            return Err(StartupError::Config(
                "camera width, height and fps must be positive".to_string(),
            ));
        }

        Ok(MonitorConfig {
            dispatch: DispatchSettings {
                server_url,
                patient_id,
                interval,
                timeout,
            },
            detector: DetectorParams {
                scale_factor: self.scale_factor,
                min_neighbors: self.min_neighbors,
                min_face_size: self.min_face_size,
            },
            camera: CameraSettings {
                index: self.camera,
                width: self.width,
                height: self.height,
                fps: self.fps,
                mirror: self.mirror,
                frame_timeout,
            },
            model_path: self.model,
            cascade_path: self.cascade,
            font_path: self.font,
            policy: self.selection.into(),
            headless: self.headless,
        })
    }
}

fn positive_seconds(name: &str, secs: f64) -> Result<Duration, StartupError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(StartupError::Config(format!(
            "{} must be a positive number of seconds, got {}",
            name, secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // clap reads EMOTION_MONITOR_* at parse time, so env-mutating tests
    // must not overlap with any other parse
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn parse_locked(args: &[&str]) -> Result<MonitorConfig, StartupError> {
        let mut argv = vec!["emotion-monitor"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap().into_config()
    }

    fn parse(args: &[&str]) -> Result<MonitorConfig, StartupError> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        parse_locked(args)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[
            "--server-url",
            "http://localhost:5000",
            "--patient-id",
            "patient_001",
        ])
        .unwrap();

        assert_eq!(config.dispatch.server_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.dispatch.patient_id, "patient_001");
        assert_eq!(config.dispatch.interval, Duration::from_secs(5));
        assert_eq!(config.dispatch.timeout, Duration::from_secs(2));
        assert_eq!(config.detector.scale_factor, 1.3);
        assert_eq!(config.detector.min_neighbors, 5);
        assert_eq!(config.policy, CandidatePolicy::LastProcessed);
        assert_eq!(config.camera.frame_timeout, Duration::from_secs(5));
        assert!(!config.headless);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--server-url",
            "https://mood.example.org",
            "--patient-id",
            "p-42",
            "--send-interval",
            "2.5",
            "--scale-factor",
            "1.1",
            "--min-neighbors",
            "3",
            "--selection",
            "confidence",
            "--camera",
            "1",
            "--mirror",
            "--headless",
        ])
        .unwrap();

        assert_eq!(config.dispatch.interval, Duration::from_millis(2500));
        assert_eq!(config.detector.scale_factor, 1.1);
        assert_eq!(config.detector.min_neighbors, 3);
        assert_eq!(config.policy, CandidatePolicy::HighestConfidence);
        assert_eq!(config.camera.index, 1);
        assert!(config.camera.mirror);
        assert!(config.headless);
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = ["--server-url", "http://localhost:5000", "--patient-id", "p1"];
        let bad: [&[&str]; 6] = [
            &["--send-interval", "0"],
            &["--request-timeout=-1"],
            &["--scale-factor", "1.0"],
            &["--min-neighbors=-2"],
            &["--width", "0"],
            &["--frame-timeout", "0"],
        ];

        for extra in bad {
            let mut args = base.to_vec();
            args.extend_from_slice(extra);
            assert!(
                matches!(parse(&args), Err(StartupError::Config(_))),
                "{:?}",
                extra
            );
        }
    }

    #[test]
    fn test_rejects_bad_server_url() {
        assert!(parse(&["--server-url", "not a url", "--patient-id", "p1"]).is_err());
        assert!(parse(&["--server-url", "ftp://host", "--patient-id", "p1"]).is_err());
    }

    #[test]
    fn test_rejects_blank_patient() {
        assert!(parse(&["--server-url", "http://localhost:5000", "--patient-id", "  "]).is_err());
    }

    #[test]
    fn test_camera_and_policy_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("EMOTION_MONITOR_SELECTION", "confidence");
        std::env::set_var("EMOTION_MONITOR_WIDTH", "1280");
        std::env::set_var("EMOTION_MONITOR_FRAME_TIMEOUT", "1.5");
        let config = parse_locked(&["--server-url", "http://localhost:5000", "--patient-id", "p1"]);
        std::env::remove_var("EMOTION_MONITOR_SELECTION");
        std::env::remove_var("EMOTION_MONITOR_WIDTH");
        std::env::remove_var("EMOTION_MONITOR_FRAME_TIMEOUT");

        let config = config.unwrap();
        assert_eq!(config.policy, CandidatePolicy::HighestConfidence);
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.frame_timeout, Duration::from_millis(1500));
    }
}
