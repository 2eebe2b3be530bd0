//! Confidence score derived from per-answer confidence and completion.

use serde::{Deserialize, Serialize};

use crate::domain::answer::{Answer, ConfidenceLevel};

/// Numeric weight assigned to each confidence level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub low: u8,
    pub medium: u8,
    pub high: u8,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self { low: 33, medium: 66, high: 100 }
    }
}

impl ConfidenceWeights {
    pub fn weight(&self, level: ConfidenceLevel) -> u8 {
        match level {
            ConfidenceLevel::Low => self.low,
            ConfidenceLevel::Medium => self.medium,
            ConfidenceLevel::High => self.high,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.high > 100 {
            return Err("scoring.confidence weights must be in range 0..=100".to_string());
        }
        if !(self.low <= self.medium && self.medium <= self.high) {
            return Err("scoring.confidence weights must satisfy low <= medium <= high".to_string());
        }
        Ok(())
    }
}

/// Averages the weights of answered questions and scales by completion.
///
/// Returns 0 when nothing has been answered; the result is rounded and clamped
/// to `0..=100`.
pub fn estimate_confidence<'a>(
    weights: &ConfidenceWeights,
    answers: impl IntoIterator<Item = &'a Answer>,
    total_questions: usize,
) -> u8 {
    let mut answered = 0usize;
    let mut weight_sum = 0u64;
    for answer in answers {
        answered += 1;
        weight_sum += u64::from(weights.weight(answer.confidence_level));
    }

    if answered == 0 || total_questions == 0 {
        return 0;
    }

    let average = weight_sum as f64 / answered as f64;
    let completion = (answered as f64 / total_questions as f64).min(1.0);
    (average * completion).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{estimate_confidence, ConfidenceWeights};
    use crate::domain::answer::{Answer, ConfidenceLevel};
    use crate::framework::{PillarId, QuestionId};

    fn answer(level: ConfidenceLevel) -> Answer {
        Answer {
            pillar: PillarId::new("metrics"),
            question_id: QuestionId::new("metrics_quantified"),
            answer_value: "yes".to_string(),
            score: 8,
            confidence_level: level,
            evidence_notes: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn no_answers_means_zero_confidence() {
        let answers: Vec<Answer> = Vec::new();
        assert_eq!(estimate_confidence(&ConfidenceWeights::default(), &answers, 37), 0);
    }

    #[test]
    fn fully_answered_high_confidence_scores_hundred() {
        let answers: Vec<Answer> = (0..4).map(|_| answer(ConfidenceLevel::High)).collect();
        assert_eq!(estimate_confidence(&ConfidenceWeights::default(), &answers, 4), 100);
    }

    #[test]
    fn average_is_penalized_by_completion_ratio() {
        let answers = vec![answer(ConfidenceLevel::High), answer(ConfidenceLevel::Low)];
        // average 66.5 scaled by 2/4
        assert_eq!(estimate_confidence(&ConfidenceWeights::default(), &answers, 4), 33);
    }

    #[test]
    fn weights_must_be_ordered() {
        let weights = ConfidenceWeights { low: 70, medium: 66, high: 100 };
        assert!(weights.validate().is_err());
        assert!(ConfidenceWeights::default().validate().is_ok());
    }
}
