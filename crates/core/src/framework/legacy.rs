//! Adapter for the legacy framework shape.
//!
//! Legacy definitions weight each question with a single number and score the
//! fixed answers `yes` (full weight), `partial` (half, rounded down) and `no` (zero).
//! Stage thresholds are fractions in `0.0..=1.0`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    AnswerOption, CoachingPrompt, Framework, FrameworkDefinition, FrameworkError, Pillar,
    PillarId, PipelineStage, Question, QuestionId, StageGate,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFramework {
    pub pillars: Vec<LegacyPillar>,
    #[serde(default)]
    pub stage_thresholds: BTreeMap<PipelineStage, LegacyStageThreshold>,
    #[serde(default)]
    pub coaching: Vec<LegacyCoachingRule>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPillar {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    pub questions: Vec<LegacyQuestion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyQuestion {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub hint: String,
    pub weight: u32,
}

/// `pillars` empty means every pillar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStageThreshold {
    pub fraction: f64,
    #[serde(default)]
    pub pillars: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCoachingRule {
    pub pillar: String,
    #[serde(default)]
    pub question: Option<String>,
    pub answer: String,
    pub message: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Framework {
    pub fn from_legacy_json(raw: &str) -> Result<Self, FrameworkError> {
        let legacy = serde_json::from_str::<LegacyFramework>(raw)
            .map_err(|error| FrameworkError::Parse(error.to_string()))?;
        Self::from_legacy(legacy)
    }

    pub fn from_legacy(legacy: LegacyFramework) -> Result<Self, FrameworkError> {
        Self::from_definition(translate(legacy)?)
    }
}

/// Translates the legacy shape into an unvalidated [`FrameworkDefinition`].
pub fn translate(legacy: LegacyFramework) -> Result<FrameworkDefinition, FrameworkError> {
    let pillars = legacy.pillars.into_iter().map(translate_pillar).collect();

    let mut stages = Vec::with_capacity(legacy.stage_thresholds.len());
    for (stage, threshold) in legacy.stage_thresholds {
        stages.push(StageGate {
            stage,
            min_percent: fraction_to_percent(stage, threshold.fraction)?,
            all_pillars: threshold.pillars.is_empty(),
            pillars: threshold.pillars.into_iter().map(PillarId).collect(),
        });
    }

    let coaching_prompts = legacy
        .coaching
        .into_iter()
        .map(|rule| CoachingPrompt {
            pillar: PillarId(rule.pillar),
            question_id: rule.question.map(QuestionId),
            trigger_value: rule.answer.to_ascii_lowercase(),
            prompt_text: rule.message,
            action_items: rule.actions,
        })
        .collect();

    Ok(FrameworkDefinition { pillars, stages, coaching_prompts })
}

fn translate_pillar(pillar: LegacyPillar) -> Pillar {
    Pillar {
        id: PillarId(pillar.key),
        title: pillar.name,
        description: pillar.summary,
        questions: pillar
            .questions
            .into_iter()
            .map(|question| Question {
                id: QuestionId(question.id),
                text: question.prompt,
                tooltip: question.hint,
                options: vec![
                    AnswerOption {
                        label: "Yes".to_string(),
                        value: "yes".to_string(),
                        score: question.weight,
                    },
                    AnswerOption {
                        label: "Partially".to_string(),
                        value: "partial".to_string(),
                        score: question.weight / 2,
                    },
                    AnswerOption { label: "No".to_string(), value: "no".to_string(), score: 0 },
                ],
            })
            .collect(),
    }
}

fn fraction_to_percent(stage: PipelineStage, fraction: f64) -> Result<u8, FrameworkError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(FrameworkError::Parse(format!(
            "legacy threshold for stage `{stage}` must be within 0.0..=1.0, got {fraction}"
        )));
    }
    Ok((fraction * 100.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use crate::framework::{Framework, FrameworkError, PillarId, PipelineStage, QuestionId};

    const LEGACY: &str = r#"{
        "pillars": [
            {
                "key": "metrics",
                "name": "Metrics",
                "questions": [
                    { "id": "impact", "prompt": "Is impact quantified?", "weight": 10 },
                    { "id": "baseline", "prompt": "Is there a baseline?", "weight": 5 }
                ]
            },
            {
                "key": "champion",
                "name": "Champion",
                "questions": [
                    { "id": "identified", "prompt": "Champion identified?", "weight": 20 }
                ]
            }
        ],
        "stageThresholds": {
            "prospect": { "fraction": 0.5, "pillars": ["metrics"] },
            "engage": { "fraction": 0.75 }
        },
        "coaching": [
            { "pillar": "metrics", "answer": "NO", "message": "Quantify the impact." }
        ]
    }"#;

    #[test]
    fn legacy_weights_become_yes_partial_no_options() {
        let framework = Framework::from_legacy_json(LEGACY).expect("legacy framework adapts");

        let baseline = framework
            .question(&PillarId::new("metrics"), &QuestionId::new("baseline"))
            .expect("baseline question exists");
        let scores: Vec<u32> = baseline.options.iter().map(|option| option.score).collect();
        assert_eq!(scores, vec![5, 2, 0]);
        assert_eq!(framework.max_total_score(), 35);
    }

    #[test]
    fn legacy_thresholds_and_coaching_are_translated() {
        let framework = Framework::from_legacy_json(LEGACY).expect("legacy framework adapts");

        let stages = framework.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].stage, PipelineStage::Prospect);
        assert_eq!(stages[0].min_percent, 50);
        assert_eq!(stages[1].min_percent, 75);
        assert_eq!(stages[1].pillars.len(), 2);
        assert_eq!(framework.coaching_prompts()[0].trigger_value, "no");
    }

    #[test]
    fn out_of_range_fraction_is_a_configuration_error() {
        let raw = LEGACY.replace("0.75", "1.5");
        let error = Framework::from_legacy_json(&raw).expect_err("fraction above one must fail");
        assert!(matches!(error, FrameworkError::Parse(message) if message.contains("engage")));
    }
}
