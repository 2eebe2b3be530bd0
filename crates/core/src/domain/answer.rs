use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::framework::{PillarId, QuestionId};

/// How sure the rep is about an answer, as reported alongside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for ConfidenceLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ValidationError::InvalidConfidence(other.to_string())),
        }
    }
}

/// Latest recorded answer for one question of one opportunity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub pillar: PillarId,
    pub question_id: QuestionId,
    pub answer_value: String,
    pub score: u32,
    pub confidence_level: ConfidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Caller input for an answer; the score is resolved from the framework on upsert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub pillar: PillarId,
    pub question_id: QuestionId,
    pub value: String,
    pub confidence_level: ConfidenceLevel,
    #[serde(default)]
    pub evidence_notes: Option<String>,
}

impl AnswerSubmission {
    pub fn new(
        pillar: impl Into<String>,
        question_id: impl Into<String>,
        value: impl Into<String>,
        confidence_level: ConfidenceLevel,
    ) -> Self {
        Self {
            pillar: PillarId::new(pillar),
            question_id: QuestionId::new(question_id),
            value: value.into(),
            confidence_level,
            evidence_notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.evidence_notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::ConfidenceLevel;
    use crate::errors::ValidationError;

    #[test]
    fn confidence_level_parses_case_insensitively() {
        assert_eq!(" High ".parse::<ConfidenceLevel>(), Ok(ConfidenceLevel::High));
        assert_eq!("medium".parse::<ConfidenceLevel>(), Ok(ConfidenceLevel::Medium));
        assert_eq!(
            "certain".parse::<ConfidenceLevel>(),
            Err(ValidationError::InvalidConfidence("certain".to_string()))
        );
    }
}
