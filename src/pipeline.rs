//! One frame's worth of work: locate → normalize → classify → score →
//! render → throttled dispatch.
//!
//! All state that outlives a frame lives in [`PipelineContext`].

use std::time::Instant;

use image::RgbImage;
use tracing::{debug, warn};

use crate::dispatch::{DispatchOutcome, DispatchThrottler, MoodTransport};
use crate::emotion::{EmotionClassifier, ScoredEmotion};
use crate::face::normalize;
use crate::face_detection::{FaceLocator, FaceRegion};
use crate::overlay::OverlayRenderer;
use crate::webcam::Frame;

/// How the single dispatch candidate is picked when a frame has several faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidatePolicy {
    /// The face processed last replaces any earlier candidate.
    #[default]
    LastProcessed,
    /// The most confident face wins. Ties keep the earlier face.
    HighestConfidence,
}

impl CandidatePolicy {
    pub fn select(
        &self,
        current: Option<ScoredEmotion>,
        next: ScoredEmotion,
    ) -> Option<ScoredEmotion> {
        match (self, current) {
            (CandidatePolicy::HighestConfidence, Some(current))
                if current.confidence >= next.confidence =>
            {
                Some(current)
            }
            _ => Some(next),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceObservation {
    pub region: FaceRegion,
    pub scored: ScoredEmotion,
}

/// What happened to one frame.
#[derive(Debug)]
pub struct FrameReport {
    pub frame_number: u64,
    pub image: RgbImage,
    pub faces: Vec<FaceObservation>,
    pub candidate: Option<ScoredEmotion>,
    pub dispatch: DispatchOutcome,
}

pub struct PipelineContext {
    locator: Box<dyn FaceLocator>,
    classifier: Box<dyn EmotionClassifier>,
    throttler: DispatchThrottler<Box<dyn MoodTransport>>,
    overlay: OverlayRenderer,
    policy: CandidatePolicy,
    patient_id: String,
    frame_count: u64,
}

impl PipelineContext {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        classifier: Box<dyn EmotionClassifier>,
        throttler: DispatchThrottler<Box<dyn MoodTransport>>,
        overlay: OverlayRenderer,
        policy: CandidatePolicy,
        patient_id: impl Into<String>,
    ) -> Self {
        Self {
            locator,
            classifier,
            throttler,
            overlay,
            policy,
            patient_id: patient_id.into(),
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn status_line(&self) -> String {
        format!("Frames: {} | Patient: {}", self.frame_count, self.patient_id)
    }

    pub fn process_frame(&mut self, frame: Frame, now: Instant) -> FrameReport {
        self.frame_count += 1;
        let mut image = frame.image;

        let regions = match self.locator.locate(&image) {
            Ok(regions) => regions,
            Err(e) => {
                warn!(frame = self.frame_count, "{}", e);
                Vec::new()
            }
        };

        let mut faces = Vec::with_capacity(regions.len());
        let mut candidate = None;

        for region in regions {
            let face = match normalize(&image, &region) {
                Ok(face) => face,
                Err(e) => {
                    debug!(frame = self.frame_count, "Skipping face: {}", e);
                    continue;
                }
            };

            let prediction = match self.classifier.classify(&face) {
                Ok(prediction) => prediction,
                Err(e) => {
                    warn!(frame = self.frame_count, "Emotion classification failed: {}", e);
                    continue;
                }
            };

            let scored = ScoredEmotion::from_prediction(&prediction);
            candidate = self.policy.select(candidate, scored);
            faces.push(FaceObservation { region, scored });
        }

        // drawn only after every crop has been taken
        for face in faces.iter() {
            self.overlay
                .draw_face(&mut image, &face.region, &face.scored.label_text());
        }

        let dispatch = self.throttler.offer(candidate.as_ref(), now);

        self.overlay.draw_status(&mut image, &self.status_line());

        FrameReport {
            frame_number: self.frame_count,
            image,
            faces,
            candidate,
            dispatch,
        }
    }
}
