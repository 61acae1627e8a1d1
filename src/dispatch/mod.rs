//! Rate-limited reporting of the current dispatch candidate.
//!
//! At most one delivery attempt per throttling window. The window restarts
//! on every attempt whatever its outcome, and failed attempts are never
//! retried: the next window's candidate gets the next attempt.

pub mod http;

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::emotion::{Emotion, ScoredEmotion};
use crate::error::DispatchError;

/// Path appended to the configured server URL.
pub const MOOD_ENDPOINT_PATH: &str = "/api/mood";

/// Delivers one mood event. Implementations must bound their own latency.
pub trait MoodTransport {
    fn send(&self, event: &MoodEvent) -> Result<(), DispatchError>;
}

impl<T: MoodTransport + ?Sized> MoodTransport for Box<T> {
    fn send(&self, event: &MoodEvent) -> Result<(), DispatchError> {
        (**self).send(event)
    }
}

/// Wire body of a dispatch attempt. Built fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEvent {
    pub patient_id: String,
    pub emotion: Emotion,
    pub score: i32,
    pub confidence: f32,
    /// ISO-8601 local wall-clock time of the attempt.
    pub timestamp: String,
}

impl MoodEvent {
    pub fn new(patient_id: &str, scored: &ScoredEmotion, at: DateTime<Local>) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            emotion: scored.emotion,
            score: scored.score,
            confidence: scored.confidence.clamp(0.0, 1.0),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, false),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No face was scored in this frame.
    NoCandidate,
    /// The previous attempt is less than one interval old.
    WindowOpen,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    Delivered,
    Failed(DispatchError),
}

impl DispatchOutcome {
    /// True when a delivery was attempted, successful or not.
    pub fn attempted(&self) -> bool {
        !matches!(self, DispatchOutcome::Skipped(_))
    }
}

pub struct DispatchThrottler<T> {
    transport: T,
    patient_id: String,
    interval: Duration,
    last_attempt: Option<Instant>,
}

impl<T: MoodTransport> DispatchThrottler<T> {
    pub fn new(transport: T, patient_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            transport,
            patient_id: patient_id.into(),
            interval,
            last_attempt: None,
        }
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Offers this frame's candidate. Delivery is attempted only when a
    /// candidate exists and at least one interval has passed since the last
    /// attempt.
    pub fn offer(&mut self, candidate: Option<&ScoredEmotion>, now: Instant) -> DispatchOutcome {
        let Some(candidate) = candidate else {
            return DispatchOutcome::Skipped(SkipReason::NoCandidate);
        };

        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < self.interval {
                return DispatchOutcome::Skipped(SkipReason::WindowOpen);
            }
        }

        self.last_attempt = Some(now);

        let event = MoodEvent::new(&self.patient_id, candidate, Local::now());
        match self.transport.send(&event) {
            Ok(()) => {
                info!(
                    patient_id = %event.patient_id,
                    "Sent {} (score {}, confidence {:.2})",
                    event.emotion,
                    event.score,
                    event.confidence
                );
                DispatchOutcome::Delivered
            }
            Err(e) => {
                warn!(patient_id = %event.patient_id, "Failed to send mood data: {}", e);
                DispatchOutcome::Failed(e)
            }
        }
    }
}
