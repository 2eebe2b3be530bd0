//! Assessment assembly.
//!
//! [`AssessmentEngine`] composes scoring, confidence, risk, stage readiness and
//! coaching into one immutable [`Assessment`] snapshot per recompute.

pub mod coaching;
pub mod confidence;
pub mod insights;
pub mod policy;
pub mod readiness;
pub mod risk;
pub mod scoring;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::answer::Answer;
use crate::domain::assessment::{Assessment, OpportunityId};
use crate::domain::insight::Insight;
use crate::export::{self, ExportError, ExportFormat};
use crate::framework::{CoachingPrompt, Framework};
use crate::store::AnswerStore;

pub use coaching::{prompt_for_branch, select_prompts};
pub use confidence::{estimate_confidence, ConfidenceWeights};
pub use insights::{rank_insights, InsightGenerator};
pub use policy::ScoringPolicy;
pub use readiness::evaluate_stage_readiness;
pub use risk::RiskThresholds;
pub use scoring::{calculate_scores, percent_of, ScoreBreakdown};

/// Pillars at or above this share of their maximum are listed as competitive strengths.
pub const STRENGTH_LIST_FROM_PERCENT: u32 = 75;

/// Pillars below this share of their maximum are listed as areas of concern.
pub const CONCERN_BELOW_PERCENT: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssessmentEngine {
    framework: Framework,
    policy: ScoringPolicy,
}

impl AssessmentEngine {
    pub fn new(framework: Framework, policy: ScoringPolicy) -> Self {
        Self { framework, policy }
    }

    pub fn framework(&self) -> &Framework {
        &self.framework
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Snapshot of an opportunity with no answers, before any recompute.
    pub fn empty(&self, opportunity_id: OpportunityId) -> Assessment {
        let store = AnswerStore::create(opportunity_id);
        let mut assessment = self.assemble(&store, Utc::now());
        assessment.version = 0;
        assessment
    }

    pub fn recompute(&self, store: &AnswerStore, previous: Option<&Assessment>) -> Assessment {
        self.recompute_at(store, previous, Utc::now())
    }

    /// Rebuilds the snapshot from the store. Everything except `last_updated`
    /// and `version` is a pure function of the store contents.
    pub fn recompute_at(
        &self,
        store: &AnswerStore,
        previous: Option<&Assessment>,
        now: DateTime<Utc>,
    ) -> Assessment {
        let mut assessment = self.assemble(store, now);
        assessment.version = previous
            .filter(|previous| previous.opportunity_id == assessment.opportunity_id)
            .map_or(1, |previous| previous.version + 1);

        info!(
            event_name = "assessment.recomputed",
            opportunity_id = %assessment.opportunity_id,
            total_score = assessment.total_score,
            confidence_score = assessment.confidence_score,
            completion_percentage = assessment.completion_percentage,
            risk_level = %assessment.risk_level,
            version = assessment.version,
            "assessment recomputed"
        );

        assessment
    }

    /// Full, unranked insight set for an assessment.
    pub fn generate_insights(&self, assessment: &Assessment) -> Vec<Insight> {
        InsightGenerator::new(&self.framework, self.policy.confidence).generate(assessment)
    }

    /// Insights ranked by priority and truncated to `limit`, or the configured
    /// insight limit when `limit` is `None`.
    pub fn ranked_insights(&self, assessment: &Assessment, limit: Option<usize>) -> Vec<Insight> {
        rank_insights(
            self.generate_insights(assessment),
            limit.unwrap_or(self.policy.insight_limit),
        )
    }

    pub fn coaching_prompts<'a>(
        &self,
        answers: impl IntoIterator<Item = &'a Answer>,
    ) -> Vec<CoachingPrompt> {
        select_prompts(&self.framework, answers)
    }

    pub fn export(
        &self,
        assessment: &Assessment,
        format: ExportFormat,
    ) -> Result<String, ExportError> {
        export::render(&self.framework, assessment, format)
    }

    fn assemble(&self, store: &AnswerStore, now: DateTime<Utc>) -> Assessment {
        let scores = calculate_scores(&self.framework, store);
        let confidence_score = estimate_confidence(
            &self.policy.confidence,
            store.answers(),
            scores.total_questions,
        );
        let risk_level = self.policy.risk.classify(scores.total_score, confidence_score);
        let stage_readiness = evaluate_stage_readiness(&self.framework, &scores);
        let coaching_actions = coaching_actions(&select_prompts(&self.framework, store.answers()));
        let (competitive_strengths, areas_of_concern) = self.summarize_pillars(store, &scores);

        Assessment {
            opportunity_id: store.opportunity_id().clone(),
            answers: self.answers_in_framework_order(store),
            pillar_scores: scores.pillar_scores.clone(),
            total_score: scores.total_score,
            confidence_score,
            completion_percentage: scores.completion_percentage(),
            risk_level,
            stage_readiness,
            coaching_actions,
            competitive_strengths,
            areas_of_concern,
            last_updated: now,
            version: 0,
        }
    }

    fn answers_in_framework_order(&self, store: &AnswerStore) -> Vec<Answer> {
        self.framework
            .pillars()
            .iter()
            .flat_map(|pillar| {
                pillar.questions.iter().filter_map(|question| store.get(&pillar.id, &question.id))
            })
            .cloned()
            .collect()
    }

    fn summarize_pillars(
        &self,
        store: &AnswerStore,
        scores: &ScoreBreakdown,
    ) -> (Vec<String>, Vec<String>) {
        let mut strengths = Vec::new();
        let mut concerns = Vec::new();

        for pillar in self.framework.pillars() {
            let score = scores.pillar_scores.get(&pillar.id).copied().unwrap_or(0);
            let max = pillar.max_score();
            let percent = percent_of(score, max);

            if percent >= STRENGTH_LIST_FROM_PERCENT {
                strengths.push(format!("{}: {score}/{max}", pillar.title));
            } else if percent < CONCERN_BELOW_PERCENT {
                if store.answers_for(&pillar.id).next().is_none() {
                    concerns.push(format!("{}: not assessed", pillar.title));
                } else {
                    concerns.push(format!("{}: {score}/{max}", pillar.title));
                }
            }
        }

        (strengths, concerns)
    }
}

impl Default for AssessmentEngine {
    fn default() -> Self {
        Self::new(Framework::meddpicc(), ScoringPolicy::default())
    }
}

/// Flattens triggered prompts into a de-duplicated action list.
///
/// A prompt without action items contributes its prompt text.
fn coaching_actions(prompts: &[CoachingPrompt]) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    for prompt in prompts {
        let items = if prompt.action_items.is_empty() {
            std::slice::from_ref(&prompt.prompt_text)
        } else {
            prompt.action_items.as_slice()
        };
        for item in items {
            if !actions.contains(item) {
                actions.push(item.clone());
            }
        }
    }
    actions
}
