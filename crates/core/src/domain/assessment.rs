use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::answer::Answer;
use crate::framework::{PillarId, PipelineStage};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpportunityId(pub String);

impl OpportunityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived snapshot of one opportunity's qualification.
///
/// Never edited in place: every answer change produces a new snapshot through
/// [`crate::qualification::AssessmentEngine::recompute`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub opportunity_id: OpportunityId,
    pub answers: Vec<Answer>,
    pub pillar_scores: BTreeMap<PillarId, u32>,
    pub total_score: u32,
    pub confidence_score: u8,
    pub completion_percentage: u8,
    pub risk_level: RiskLevel,
    pub stage_readiness: BTreeMap<PipelineStage, bool>,
    pub coaching_actions: Vec<String>,
    pub competitive_strengths: Vec<String>,
    pub areas_of_concern: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub version: u64,
}

impl Assessment {
    /// Equality that ignores the volatile `last_updated` and `version` fields.
    pub fn same_evaluation(&self, other: &Self) -> bool {
        self.opportunity_id == other.opportunity_id
            && self.answers == other.answers
            && self.pillar_scores == other.pillar_scores
            && self.total_score == other.total_score
            && self.confidence_score == other.confidence_score
            && self.completion_percentage == other.completion_percentage
            && self.risk_level == other.risk_level
            && self.stage_readiness == other.stage_readiness
            && self.coaching_actions == other.coaching_actions
            && self.competitive_strengths == other.competitive_strengths
            && self.areas_of_concern == other.areas_of_concern
    }

    pub fn pillar_score(&self, pillar: &PillarId) -> u32 {
        self.pillar_scores.get(pillar).copied().unwrap_or(0)
    }

    pub fn answers_for<'a>(&'a self, pillar: &'a PillarId) -> impl Iterator<Item = &'a Answer> {
        self.answers.iter().filter(move |answer| &answer.pillar == pillar)
    }

    pub fn is_ready_for(&self, stage: PipelineStage) -> bool {
        self.stage_readiness.get(&stage).copied().unwrap_or(false)
    }
}
