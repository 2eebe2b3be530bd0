//! Stage readiness gates.

use std::collections::BTreeMap;

use crate::framework::{Framework, PipelineStage, StageGate};

use super::scoring::ScoreBreakdown;

/// Evaluates every configured stage gate against the current pillar scores.
pub fn evaluate_stage_readiness(
    framework: &Framework,
    scores: &ScoreBreakdown,
) -> BTreeMap<PipelineStage, bool> {
    framework
        .stages()
        .iter()
        .map(|gate| (gate.stage, gate_passes(framework, gate, scores)))
        .collect()
}

fn gate_passes(framework: &Framework, gate: &StageGate, scores: &ScoreBreakdown) -> bool {
    gate.pillars.iter().all(|pillar_id| {
        let Some(pillar) = framework.pillar(pillar_id) else {
            return false;
        };
        let score = scores.pillar_scores.get(pillar_id).copied().unwrap_or(0);
        u64::from(score) * 100 >= u64::from(gate.min_percent) * u64::from(pillar.max_score())
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::evaluate_stage_readiness;
    use crate::domain::answer::{AnswerSubmission, ConfidenceLevel};
    use crate::domain::assessment::OpportunityId;
    use crate::framework::{Framework, PipelineStage};
    use crate::qualification::scoring::calculate_scores;
    use crate::store::AnswerStore;

    fn answer_pillar(store: &mut AnswerStore, framework: &Framework, pillar: &str, value: &str) {
        let questions: Vec<String> = framework
            .pillars()
            .iter()
            .find(|candidate| candidate.id.as_str() == pillar)
            .map(|candidate| candidate.questions.iter().map(|q| q.id.0.clone()).collect())
            .unwrap_or_default();
        for question in questions {
            store
                .upsert(
                    framework,
                    AnswerSubmission::new(pillar, question, value, ConfidenceLevel::High),
                    Utc::now(),
                )
                .expect("valid answer");
        }
    }

    #[test]
    fn empty_assessment_is_not_ready_for_any_stage() {
        let framework = Framework::meddpicc();
        let readiness = evaluate_stage_readiness(
            &framework,
            &calculate_scores(&framework, &AnswerStore::create(OpportunityId::new("O"))),
        );

        assert_eq!(readiness.len(), 4);
        assert!(readiness.values().all(|ready| !ready));
    }

    #[test]
    fn prospect_needs_metrics_and_pain_at_half() {
        let framework = Framework::meddpicc();
        let mut store = AnswerStore::create(OpportunityId::new("O"));
        answer_pillar(&mut store, &framework, "metrics", "partial");

        let partial = evaluate_stage_readiness(&framework, &calculate_scores(&framework, &store));
        assert!(!partial[&PipelineStage::Prospect]);

        answer_pillar(&mut store, &framework, "implicate_pain", "partial");
        let ready = evaluate_stage_readiness(&framework, &calculate_scores(&framework, &store));
        assert!(ready[&PipelineStage::Prospect]);
        assert!(!ready[&PipelineStage::Engage]);
    }

    #[test]
    fn readiness_is_monotonic_across_stages() {
        let framework = Framework::meddpicc();
        let mut store = AnswerStore::create(OpportunityId::new("O"));
        for pillar in ["metrics", "implicate_pain", "champion", "economic_buyer"] {
            answer_pillar(&mut store, &framework, pillar, "yes");
        }

        let readiness = evaluate_stage_readiness(&framework, &calculate_scores(&framework, &store));
        assert!(readiness[&PipelineStage::Prospect]);
        assert!(readiness[&PipelineStage::Engage]);
        assert!(!readiness[&PipelineStage::Acquire]);

        for stage in PipelineStage::ALL.windows(2) {
            if readiness[&stage[1]] {
                assert!(readiness[&stage[0]], "{} ready without {}", stage[1], stage[0]);
            }
        }
    }

    #[test]
    fn keep_requires_every_pillar_at_three_quarters() {
        let framework = Framework::meddpicc();
        let mut store = AnswerStore::create(OpportunityId::new("O"));
        let pillars: Vec<String> =
            framework.pillars().iter().map(|pillar| pillar.id.0.clone()).collect();
        for pillar in &pillars {
            answer_pillar(&mut store, &framework, pillar, "yes");
        }

        let readiness = evaluate_stage_readiness(&framework, &calculate_scores(&framework, &store));
        assert!(PipelineStage::ALL.iter().all(|stage| readiness[stage]));
    }
}
