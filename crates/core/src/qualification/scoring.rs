//! Per-pillar and total score calculation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::framework::{Framework, PillarId};
use crate::store::AnswerStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pillar_scores: BTreeMap<PillarId, u32>,
    pub total_score: u32,
    pub answered_questions: usize,
    pub total_questions: usize,
}

impl ScoreBreakdown {
    pub fn completion_ratio(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.answered_questions as f64 / self.total_questions as f64
    }

    /// Completion rounded down, so 79.9% never reads as the 80% completion threshold.
    pub fn completion_percentage(&self) -> u8 {
        if self.total_questions == 0 {
            return 0;
        }
        ((self.answered_questions * 100) / self.total_questions).min(100) as u8
    }
}

/// Sums the latest answer score per question within each pillar.
///
/// Every configured pillar appears in the result; unanswered questions contribute 0.
pub fn calculate_scores(framework: &Framework, store: &AnswerStore) -> ScoreBreakdown {
    let mut pillar_scores = BTreeMap::new();
    let mut answered_questions = 0;

    for pillar in framework.pillars() {
        let mut pillar_score: u32 = 0;
        for question in &pillar.questions {
            if let Some(answer) = store.get(&pillar.id, &question.id) {
                pillar_score = pillar_score.saturating_add(answer.score);
                answered_questions += 1;
            }
        }
        pillar_scores.insert(pillar.id.clone(), pillar_score);
    }

    let total_score = pillar_scores.values().copied().fold(0, u32::saturating_add);
    ScoreBreakdown {
        pillar_scores,
        total_score,
        answered_questions,
        total_questions: framework.total_questions(),
    }
}

/// `score` as a whole percentage of `max`, rounded down.
pub fn percent_of(score: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    score.saturating_mul(100) / max
}
