//! Static emotion → wellbeing score table.

use crate::emotion::Emotion;

/// Score for any label outside the table.
pub const DEFAULT_SCORE: i32 = 50;

pub(crate) fn score_of_emotion(emotion: Emotion) -> i32 {
    match emotion {
        Emotion::Happy => 80,
        Emotion::Surprise => 60,
        Emotion::Neutral => 50,
        Emotion::Angry => 25,
        Emotion::Sad => 20,
        Emotion::Fear => 15,
        Emotion::Disgust => 10,
    }
}

/// Wellbeing score for a label name. Total: unknown labels get [`DEFAULT_SCORE`].
pub fn score_of(label: &str) -> i32 {
    label
        .parse::<Emotion>()
        .map(score_of_emotion)
        .unwrap_or(DEFAULT_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        let expected = [
            ("Angry", 25),
            ("Disgust", 10),
            ("Fear", 15),
            ("Happy", 80),
            ("Sad", 20),
            ("Surprise", 60),
            ("Neutral", 50),
        ];
        for (label, score) in expected {
            assert_eq!(score_of(label), score, "{}", label);
        }
    }

    #[test]
    fn test_every_emotion_is_in_table() {
        for emotion in Emotion::ALL {
            assert_eq!(score_of(emotion.as_str()), emotion.wellbeing_score());
        }
    }

    #[test]
    fn test_unknown_label_gets_default() {
        assert_eq!(score_of("Contempt"), DEFAULT_SCORE);
        assert_eq!(score_of(""), DEFAULT_SCORE);
    }

    #[test]
    fn test_lowercase_provider_labels() {
        assert_eq!(score_of("sad"), 20);
        assert_eq!(score_of("disgust"), 10);
    }
}
