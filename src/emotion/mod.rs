pub mod model_fer;
pub mod score;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::face::NormalizedFace;

pub use score::{score_of, DEFAULT_SCORE};

/// Maps a normalized face to a probability distribution over [`Emotion::ALL`].
/// Implementations must be deterministic for a fixed model.
pub trait EmotionClassifier {
    fn classify(&self, face: &NormalizedFace) -> Result<EmotionPrediction, ClassifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// Model output order.
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral => "Neutral",
        }
    }

    pub fn wellbeing_score(&self) -> i32 {
        score::score_of_emotion(*self)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEmotion(pub String);

impl fmt::Display for UnknownEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown emotion label '{}'", self.0)
    }
}

impl std::error::Error for UnknownEmotion {}

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    /// Case-insensitive, so lowercase provider labels ("happy") resolve too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Probability per label, in [`Emotion::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionPrediction {
    probabilities: [f32; 7],
}

impl EmotionPrediction {
    /// Builds a prediction from raw model scores.
    ///
    /// Scores that already form a distribution are kept as they are,
    /// anything else (logits) goes through a softmax.
    pub fn from_scores(scores: &[f32]) -> Result<Self, ClassifyError> {
        if scores.len() != Emotion::ALL.len() {
            return Err(ClassifyError::OutputLength {
                expected: Emotion::ALL.len(),
                actual: scores.len(),
            });
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ClassifyError::NonFinite);
        }

        let mut probabilities = [0.0f32; 7];
        probabilities.copy_from_slice(scores);

        let in_range = probabilities.iter().all(|p| (0.0..=1.0).contains(p));
        let sum: f32 = probabilities.iter().sum();
        if !in_range || (sum - 1.0).abs() > 1e-3 {
            softmax(&mut probabilities);
        }

        Ok(Self { probabilities })
    }

    pub fn probabilities(&self) -> &[f32; 7] {
        &self.probabilities
    }


    /// Top label and its probability. Ties resolve to the earlier label.
    pub fn top(&self) -> (Emotion, f32) {
        let mut best = 0;
        for (i, p) in self.probabilities.iter().enumerate() {
            if *p > self.probabilities[best] {
                best = i;
            }
        }
        (Emotion::ALL[best], self.probabilities[best])
    }
}

fn softmax(values: &mut [f32; 7]) {
    let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

/// Top emotion of one face with its wellbeing score and confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEmotion {
    pub emotion: Emotion,
    pub score: i32,
    pub confidence: f32,
}

impl ScoredEmotion {
    pub fn new(emotion: Emotion, confidence: f32) -> Self {
        Self {
            emotion,
            score: emotion.wellbeing_score(),
            confidence,
        }
    }

    pub fn from_prediction(prediction: &EmotionPrediction) -> Self {
        let (emotion, confidence) = prediction.top();
        Self::new(emotion, confidence)
    }

    /// Text drawn above the face box.
    pub fn label_text(&self) -> String {
        format!(
            "{} (Score: {}, Conf: {:.2})",
            self.emotion, self.score, self.confidence
        )
    }
}
