//! Rule-based insight generation.
//!
//! The generator scans pillar scores and individual answers of an assessment and
//! returns the full, unranked set of insights. [`rank_insights`] orders and trims
//! them for presentation.

use crate::domain::assessment::Assessment;
use crate::domain::insight::{Insight, InsightPriority, InsightType};
use crate::framework::{Framework, Pillar, PillarId};

use super::coaching::{prompt_for_branch, select_prompts};
use super::confidence::ConfidenceWeights;
use super::scoring::percent_of;

/// Answered pillars below this share of their maximum are weaknesses.
pub const WEAKNESS_BELOW_PERCENT: u32 = 50;

/// Pillars at or above this share of their maximum are strengths.
pub const STRENGTH_FROM_PERCENT: u32 = 90;

pub const ECONOMIC_BUYER: &str = "economic_buyer";
pub const CHAMPION: &str = "champion";

/// Average answer confidence below this raises an evidence risk.
pub const LOW_CONFIDENCE_BELOW: u32 = 50;

/// Default number of insights kept by [`rank_insights`].
pub const DEFAULT_INSIGHT_LIMIT: usize = 10;

pub struct InsightGenerator<'a> {
    framework: &'a Framework,
    weights: ConfidenceWeights,
}

impl<'a> InsightGenerator<'a> {
    pub fn new(framework: &'a Framework, weights: ConfidenceWeights) -> Self {
        Self { framework, weights }
    }

    pub fn generate(&self, assessment: &Assessment) -> Vec<Insight> {
        let mut insights = Vec::new();

        for pillar in self.framework.pillars() {
            if let Some(insight) = self.pillar_insight(pillar, assessment) {
                insights.push(insight);
            }
        }

        if let Some(insight) = self.champion_to_buyer(assessment) {
            insights.push(insight);
        }
        if let Some(insight) = self.low_confidence_evidence(assessment) {
            insights.push(insight);
        }

        insights
    }

    fn pillar_insight(&self, pillar: &Pillar, assessment: &Assessment) -> Option<Insight> {
        let answered = assessment.answers_for(&pillar.id).count();
        let score = assessment.pillar_score(&pillar.id);
        let max = pillar.max_score();
        let percent = percent_of(score, max);

        if answered == 0 {
            let recommendation = prompt_for_branch(self.framework, &pillar.id, "no")
                .map(|prompt| prompt.prompt_text.clone())
                .unwrap_or_else(|| {
                    format!("Start qualifying {}: {}", pillar.title, pillar.description)
                });
            return Some(Insight {
                kind: InsightType::Risk,
                pillar: Some(pillar.id.clone()),
                description: format!("{} has not been assessed.", pillar.title),
                recommendation,
                impact: format!(
                    "Without evidence on {}, the forecast for this opportunity is unreliable.",
                    pillar.title
                ),
                priority: InsightPriority::Critical,
            });
        }

        if percent < WEAKNESS_BELOW_PERCENT {
            return Some(Insight {
                kind: InsightType::Weakness,
                pillar: Some(pillar.id.clone()),
                description: format!("{} is weak at {score}/{max} points.", pillar.title),
                recommendation: self.weakness_recommendation(pillar, assessment),
                impact: format!(
                    "A weak {} position is a common reason qualified deals slip or stall.",
                    pillar.title
                ),
                priority: InsightPriority::High,
            });
        }

        if percent >= STRENGTH_FROM_PERCENT {
            return Some(Insight {
                kind: InsightType::Strength,
                pillar: Some(pillar.id.clone()),
                description: format!("{} is strong at {score}/{max} points.", pillar.title),
                recommendation: format!(
                    "Keep {} evidence current and use it to reinforce weaker pillars.",
                    pillar.title
                ),
                impact: "Strong qualification here reduces late-stage surprises.".to_string(),
                priority: InsightPriority::Low,
            });
        }

        None
    }

    fn weakness_recommendation(&self, pillar: &Pillar, assessment: &Assessment) -> String {
        select_prompts(self.framework, assessment.answers_for(&pillar.id))
            .into_iter()
            .next()
            .or_else(|| prompt_for_branch(self.framework, &pillar.id, "no").cloned())
            .map(|prompt| prompt.prompt_text)
            .unwrap_or_else(|| {
                format!("Revisit the open {} questions with your champion.", pillar.title)
            })
    }

    fn champion_to_buyer(&self, assessment: &Assessment) -> Option<Insight> {
        let economic_buyer = self.framework.pillar(&PillarId::new(ECONOMIC_BUYER))?;
        let champion = self.framework.pillar(&PillarId::new(CHAMPION))?;

        let buyer_percent =
            percent_of(assessment.pillar_score(&economic_buyer.id), economic_buyer.max_score());
        let champion_percent =
            percent_of(assessment.pillar_score(&champion.id), champion.max_score());

        if buyer_percent >= WEAKNESS_BELOW_PERCENT || champion_percent < WEAKNESS_BELOW_PERCENT {
            return None;
        }

        Some(Insight {
            kind: InsightType::Opportunity,
            pillar: Some(economic_buyer.id.clone()),
            description: format!(
                "{} is established but the {} is not yet identified.",
                champion.title, economic_buyer.title
            ),
            recommendation: format!(
                "Leverage your champion to secure an introduction to the {}.",
                economic_buyer.title.to_lowercase()
            ),
            impact: "Champion-led access is the fastest route to budget authority.".to_string(),
            priority: InsightPriority::Medium,
        })
    }

    fn low_confidence_evidence(&self, assessment: &Assessment) -> Option<Insight> {
        let answered = assessment.answers.len() as u32;
        if answered == 0 {
            return None;
        }
        let weight_sum: u32 = assessment
            .answers
            .iter()
            .map(|answer| u32::from(self.weights.weight(answer.confidence_level)))
            .sum();
        let average = weight_sum / answered;
        if average >= LOW_CONFIDENCE_BELOW {
            return None;
        }

        Some(Insight {
            kind: InsightType::Risk,
            pillar: None,
            description: format!(
                "Recorded answers average {average}/100 confidence across {answered} questions."
            ),
            recommendation: "Validate low-confidence answers directly with the customer and \
                             record the evidence."
                .to_string(),
            impact: "Scores built on unverified answers overstate qualification.".to_string(),
            priority: InsightPriority::High,
        })
    }
}

/// Orders insights by priority (critical first) and keeps the first `limit`.
///
/// The sort is stable, so insights of equal priority keep generation order.
pub fn rank_insights(mut insights: Vec<Insight>, limit: usize) -> Vec<Insight> {
    insights.sort_by(|a, b| b.priority.cmp(&a.priority));
    insights.truncate(limit);
    insights
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::{rank_insights, InsightGenerator};
    use crate::domain::answer::{Answer, ConfidenceLevel};
    use crate::domain::assessment::{Assessment, OpportunityId, RiskLevel};
    use crate::domain::insight::{Insight, InsightPriority, InsightType};
    use crate::framework::{Framework, PillarId};
    use crate::qualification::confidence::ConfidenceWeights;

    fn assessment_with(framework: &Framework, answers: Vec<Answer>) -> Assessment {
        let mut pillar_scores: BTreeMap<PillarId, u32> =
            framework.pillars().iter().map(|pillar| (pillar.id.clone(), 0)).collect();
        for answer in &answers {
            *pillar_scores.entry(answer.pillar.clone()).or_insert(0) += answer.score;
        }
        Assessment {
            opportunity_id: OpportunityId::new("OPP-1"),
            total_score: pillar_scores.values().sum(),
            answers,
            pillar_scores,
            confidence_score: 0,
            completion_percentage: 0,
            risk_level: RiskLevel::Critical,
            stage_readiness: BTreeMap::new(),
            coaching_actions: Vec::new(),
            competitive_strengths: Vec::new(),
            areas_of_concern: Vec::new(),
            last_updated: Utc::now(),
            version: 1,
        }
    }

    fn generate(framework: &Framework, answers: Vec<Answer>) -> Vec<Insight> {
        InsightGenerator::new(framework, ConfidenceWeights::default())
            .generate(&assessment_with(framework, answers))
    }

    fn pillar_answers(
        framework: &Framework,
        pillar: &str,
        value: &str,
        level: ConfidenceLevel,
    ) -> Vec<Answer> {
        let pillar = framework.pillar(&PillarId::new(pillar)).expect("pillar exists");
        pillar
            .questions
            .iter()
            .map(|question| Answer {
                pillar: pillar.id.clone(),
                question_id: question.id.clone(),
                answer_value: value.to_string(),
                score: question.option(value).map(|option| option.score).unwrap_or(0),
                confidence_level: level,
                evidence_notes: None,
                timestamp: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn unanswered_assessment_yields_one_critical_risk_per_pillar() {
        let framework = Framework::meddpicc();
        let insights = generate(&framework, Vec::new());

        assert_eq!(insights.len(), 8);
        assert!(insights.iter().all(|insight| {
            insight.kind == InsightType::Risk && insight.priority == InsightPriority::Critical
        }));
        let metrics = insights
            .iter()
            .find(|insight| insight.pillar == Some(PillarId::new("metrics")))
            .expect("metrics insight");
        assert!(metrics.recommendation.starts_with("Work with the customer to quantify"));
    }

    #[test]
    fn champion_without_buyer_is_an_opportunity() {
        let framework = Framework::meddpicc();
        let answers = pillar_answers(&framework, "champion", "yes", ConfidenceLevel::High);
        let insights = generate(&framework, answers);

        let opportunity = insights
            .iter()
            .find(|insight| insight.kind == InsightType::Opportunity)
            .expect("cross-pillar opportunity");
        assert_eq!(opportunity.priority, InsightPriority::Medium);
        assert!(opportunity.recommendation.contains("champion"));
        assert!(insights.iter().any(|insight| {
            insight.kind == InsightType::Strength
                && insight.pillar == Some(PillarId::new("champion"))
        }));
    }

    #[test]
    fn weak_answered_pillar_is_a_high_weakness() {
        let framework = Framework::meddpicc();
        let mut answers = pillar_answers(&framework, "paper_process", "no", ConfidenceLevel::High);
        answers[0].answer_value = "partial".to_string();
        answers[0].score = 5;
        let insights = generate(&framework, answers);

        let weakness = insights
            .iter()
            .find(|insight| insight.pillar == Some(PillarId::new("paper_process")))
            .expect("paper process insight");
        assert_eq!(weakness.kind, InsightType::Weakness);
        assert_eq!(weakness.priority, InsightPriority::High);
        assert!(weakness.description.contains("5/40"));
    }

    #[test]
    fn answered_pillar_at_zero_points_is_a_weakness_not_a_risk() {
        let framework = Framework::meddpicc();
        let answers = pillar_answers(&framework, "paper_process", "no", ConfidenceLevel::High);
        let insights = generate(&framework, answers);

        let paper_process: Vec<&Insight> = insights
            .iter()
            .filter(|insight| insight.pillar == Some(PillarId::new("paper_process")))
            .collect();
        assert_eq!(paper_process.len(), 1);
        assert_eq!(paper_process[0].kind, InsightType::Weakness);
        assert_eq!(paper_process[0].priority, InsightPriority::High);
        assert!(paper_process[0].description.contains("0/40"));
    }

    #[test]
    fn mostly_low_confidence_answers_raise_an_evidence_risk() {
        let framework = Framework::meddpicc();
        let answers = pillar_answers(&framework, "metrics", "yes", ConfidenceLevel::Low);
        let insights = generate(&framework, answers);

        assert!(insights.iter().any(|insight| {
            insight.kind == InsightType::Risk && insight.pillar.is_none()
        }));
    }

    #[test]
    fn ranking_orders_by_priority_and_truncates() {
        let insight = |priority| Insight {
            kind: InsightType::Risk,
            pillar: None,
            description: format!("{priority:?}"),
            recommendation: String::new(),
            impact: String::new(),
            priority,
        };
        let ranked = rank_insights(
            vec![
                insight(InsightPriority::Low),
                insight(InsightPriority::Critical),
                insight(InsightPriority::Medium),
                insight(InsightPriority::High),
            ],
            3,
        );

        let priorities: Vec<_> = ranked.iter().map(|insight| insight.priority).collect();
        assert_eq!(
            priorities,
            vec![InsightPriority::Critical, InsightPriority::High, InsightPriority::Medium]
        );
    }
}
