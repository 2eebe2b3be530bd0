//! Qualification framework: pillars, questions, option scores, stage gates and the
//! coaching prompt table.
//!
//! A [`Framework`] is only ever constructed through validation, so downstream
//! components can assume unique ids, non-empty pillars and monotonic stage gates.

mod defaults;
pub mod legacy;

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PillarId(pub String);

impl PillarId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PillarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selectable answer for a question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub value: String,
    pub score: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    #[serde(default)]
    pub tooltip: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn max_score(&self) -> u32 {
        self.options.iter().map(|option| option.score).max().unwrap_or(0)
    }

    pub fn option(&self, value: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.value == value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    pub id: PillarId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

impl Pillar {
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(Question::max_score).fold(0, u32::saturating_add)
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Prospect,
    Engage,
    Acquire,
    Keep,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [Self::Prospect, Self::Engage, Self::Acquire, Self::Keep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prospect => "prospect",
            Self::Engage => "engage",
            Self::Acquire => "acquire",
            Self::Keep => "keep",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum evidence required before an opportunity may advance to `stage`.
///
/// Every listed pillar must score at least `min_percent` of its maximum. With
/// `all_pillars` set, the gate covers every pillar of the framework.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageGate {
    pub stage: PipelineStage,
    pub min_percent: u8,
    #[serde(default)]
    pub all_pillars: bool,
    #[serde(default)]
    pub pillars: Vec<PillarId>,
}

/// A canned recommendation fired by a specific answer value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingPrompt {
    pub pillar: PillarId,
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    pub trigger_value: String,
    pub prompt_text: String,
    #[serde(default)]
    pub action_items: Vec<String>,
}

impl CoachingPrompt {
    pub fn matches(&self, pillar: &PillarId, question_id: &QuestionId, value: &str) -> bool {
        &self.pillar == pillar
            && self.trigger_value == value
            && self.question_id.as_ref().map_or(true, |id| id == question_id)
    }
}

/// Unvalidated framework shape as read from configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkDefinition {
    pub pillars: Vec<Pillar>,
    #[serde(default)]
    pub stages: Vec<StageGate>,
    #[serde(default)]
    pub coaching_prompts: Vec<CoachingPrompt>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameworkError {
    #[error("framework must define at least one pillar")]
    NoPillars,
    #[error("duplicate pillar id `{0}`")]
    DuplicatePillar(PillarId),
    #[error("pillar `{0}` has no questions")]
    EmptyPillar(PillarId),
    #[error("pillar `{0}` has a maximum score of zero")]
    ZeroMaxScore(PillarId),
    #[error("duplicate question id `{question_id}` in pillar `{pillar}`")]
    DuplicateQuestion { pillar: PillarId, question_id: QuestionId },
    #[error("question `{question_id}` in pillar `{pillar}` has no options")]
    QuestionWithoutOptions { pillar: PillarId, question_id: QuestionId },
    #[error("duplicate option value `{value}` on question `{question_id}` in pillar `{pillar}`")]
    DuplicateOption { pillar: PillarId, question_id: QuestionId, value: String },
    #[error("stage `{0}` is configured more than once")]
    DuplicateStage(PipelineStage),
    #[error("stage `{stage}` references unknown pillar `{pillar}`")]
    UnknownStagePillar { stage: PipelineStage, pillar: PillarId },
    #[error("stage `{stage}` min_percent {min_percent} must be in range 0..=100")]
    InvalidStagePercent { stage: PipelineStage, min_percent: u8 },
    #[error("stage `{stage}` gates no pillars")]
    EmptyStageGate { stage: PipelineStage },
    #[error("stage `{stage}` is less strict than earlier stage `{previous}`")]
    NonMonotonicStageGate { stage: PipelineStage, previous: PipelineStage },
    #[error("coaching prompt references unknown pillar `{0}`")]
    UnknownPromptPillar(PillarId),
    #[error("coaching prompt references unknown question `{question_id}` in pillar `{pillar}`")]
    UnknownPromptQuestion { pillar: PillarId, question_id: QuestionId },
    #[error("coaching prompt trigger `{value}` is not an option value in pillar `{pillar}`")]
    UnknownPromptTrigger { pillar: PillarId, value: String },
    #[error("framework maximum score exceeds {limit}")]
    ScoreOverflow { limit: u32 },
    #[error("framework definition could not be parsed: {0}")]
    Parse(String),
}

/// Upper bound on a framework's total maximum score. Keeps every score sum and
/// percentage computation well inside `u32`.
pub const MAX_FRAMEWORK_SCORE: u32 = 1_000_000;

/// Validated, immutable framework configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Framework {
    pillars: Vec<Pillar>,
    stages: Vec<StageGate>,
    coaching_prompts: Vec<CoachingPrompt>,
}

impl Framework {
    /// The built-in eight-pillar MEDDPICC framework.
    pub fn meddpicc() -> Self {
        Self::assemble(defaults::definition())
    }

    pub fn from_definition(definition: FrameworkDefinition) -> Result<Self, FrameworkError> {
        validate_definition(&definition)?;
        Ok(Self::assemble(definition))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, FrameworkError> {
        let definition = toml::from_str::<FrameworkDefinition>(raw)
            .map_err(|error| FrameworkError::Parse(error.to_string()))?;
        Self::from_definition(definition)
    }

    fn assemble(mut definition: FrameworkDefinition) -> Self {
        let all_ids: Vec<PillarId> =
            definition.pillars.iter().map(|pillar| pillar.id.clone()).collect();
        for gate in &mut definition.stages {
            if gate.all_pillars {
                gate.pillars = all_ids.clone();
            }
        }
        definition.stages.sort_by_key(|gate| gate.stage);

        Self {
            pillars: definition.pillars,
            stages: definition.stages,
            coaching_prompts: definition.coaching_prompts,
        }
    }

    pub fn pillars(&self) -> &[Pillar] {
        &self.pillars
    }

    pub fn pillar(&self, id: &PillarId) -> Option<&Pillar> {
        self.pillars.iter().find(|pillar| &pillar.id == id)
    }

    pub fn question(&self, pillar: &PillarId, question_id: &QuestionId) -> Option<&Question> {
        self.pillar(pillar).and_then(|pillar| pillar.question(question_id))
    }

    /// Stage gates in pipeline order.
    pub fn stages(&self) -> &[StageGate] {
        &self.stages
    }

    pub fn coaching_prompts(&self) -> &[CoachingPrompt] {
        &self.coaching_prompts
    }

    pub fn total_questions(&self) -> usize {
        self.pillars.iter().map(|pillar| pillar.questions.len()).sum()
    }

    pub fn max_total_score(&self) -> u32 {
        self.pillars.iter().map(Pillar::max_score).fold(0, u32::saturating_add)
    }

    /// Resolves a submitted value to its configured option, or explains why it cannot.
    pub fn resolve_option(
        &self,
        pillar: &PillarId,
        question_id: &QuestionId,
        value: &str,
    ) -> Result<&AnswerOption, ValidationError> {
        let pillar_def = self
            .pillar(pillar)
            .ok_or_else(|| ValidationError::UnknownPillar { pillar: pillar.clone() })?;
        let question = pillar_def.question(question_id).ok_or_else(|| {
            ValidationError::UnknownQuestion {
                pillar: pillar.clone(),
                question_id: question_id.clone(),
            }
        })?;

        question.option(value).ok_or_else(|| ValidationError::UnknownOption {
            pillar: pillar.clone(),
            question_id: question_id.clone(),
            value: value.to_string(),
            allowed: question.options.iter().map(|option| option.value.clone()).collect(),
        })
    }
}

fn validate_definition(definition: &FrameworkDefinition) -> Result<(), FrameworkError> {
    if definition.pillars.is_empty() {
        return Err(FrameworkError::NoPillars);
    }

    let mut pillar_ids = HashSet::new();
    let mut framework_max: u32 = 0;
    for pillar in &definition.pillars {
        if !pillar_ids.insert(&pillar.id) {
            return Err(FrameworkError::DuplicatePillar(pillar.id.clone()));
        }
        let pillar_max = validate_pillar(pillar)?;
        framework_max = framework_max
            .checked_add(pillar_max)
            .filter(|total| *total <= MAX_FRAMEWORK_SCORE)
            .ok_or(FrameworkError::ScoreOverflow { limit: MAX_FRAMEWORK_SCORE })?;
    }

    validate_stages(definition, &pillar_ids)?;
    validate_prompts(definition)?;
    Ok(())
}

/// Returns the pillar's maximum score once its questions check out.
fn validate_pillar(pillar: &Pillar) -> Result<u32, FrameworkError> {
    if pillar.questions.is_empty() {
        return Err(FrameworkError::EmptyPillar(pillar.id.clone()));
    }

    let mut question_ids = HashSet::new();
    for question in &pillar.questions {
        if !question_ids.insert(&question.id) {
            return Err(FrameworkError::DuplicateQuestion {
                pillar: pillar.id.clone(),
                question_id: question.id.clone(),
            });
        }
        if question.options.is_empty() {
            return Err(FrameworkError::QuestionWithoutOptions {
                pillar: pillar.id.clone(),
                question_id: question.id.clone(),
            });
        }

        let mut values = HashSet::new();
        for option in &question.options {
            if !values.insert(option.value.as_str()) {
                return Err(FrameworkError::DuplicateOption {
                    pillar: pillar.id.clone(),
                    question_id: question.id.clone(),
                    value: option.value.clone(),
                });
            }
        }
    }

    let max_score = pillar
        .questions
        .iter()
        .map(Question::max_score)
        .try_fold(0u32, |total, score| total.checked_add(score))
        .filter(|total| *total <= MAX_FRAMEWORK_SCORE)
        .ok_or(FrameworkError::ScoreOverflow { limit: MAX_FRAMEWORK_SCORE })?;
    if max_score == 0 {
        return Err(FrameworkError::ZeroMaxScore(pillar.id.clone()));
    }

    Ok(max_score)
}

fn validate_stages(
    definition: &FrameworkDefinition,
    pillar_ids: &HashSet<&PillarId>,
) -> Result<(), FrameworkError> {
    let mut gates: Vec<(PipelineStage, u8, BTreeSet<&PillarId>)> = Vec::new();
    let mut seen = HashSet::new();

    for gate in &definition.stages {
        if !seen.insert(gate.stage) {
            return Err(FrameworkError::DuplicateStage(gate.stage));
        }
        if gate.min_percent > 100 {
            return Err(FrameworkError::InvalidStagePercent {
                stage: gate.stage,
                min_percent: gate.min_percent,
            });
        }
        for pillar in &gate.pillars {
            if !pillar_ids.contains(pillar) {
                return Err(FrameworkError::UnknownStagePillar {
                    stage: gate.stage,
                    pillar: pillar.clone(),
                });
            }
        }

        let gated: BTreeSet<&PillarId> = if gate.all_pillars {
            pillar_ids.iter().copied().collect()
        } else {
            gate.pillars.iter().collect()
        };
        if gated.is_empty() {
            return Err(FrameworkError::EmptyStageGate { stage: gate.stage });
        }
        gates.push((gate.stage, gate.min_percent, gated));
    }

    gates.sort_by_key(|(stage, _, _)| *stage);
    for pair in gates.windows(2) {
        let (previous, previous_percent, previous_pillars) = &pair[0];
        let (stage, percent, pillars) = &pair[1];
        if percent < previous_percent || !pillars.is_superset(previous_pillars) {
            return Err(FrameworkError::NonMonotonicStageGate {
                stage: *stage,
                previous: *previous,
            });
        }
    }

    Ok(())
}

fn validate_prompts(definition: &FrameworkDefinition) -> Result<(), FrameworkError> {
    for prompt in &definition.coaching_prompts {
        let pillar = definition
            .pillars
            .iter()
            .find(|pillar| pillar.id == prompt.pillar)
            .ok_or_else(|| FrameworkError::UnknownPromptPillar(prompt.pillar.clone()))?;

        let trigger_known = match &prompt.question_id {
            Some(question_id) => {
                let question = pillar.question(question_id).ok_or_else(|| {
                    FrameworkError::UnknownPromptQuestion {
                        pillar: prompt.pillar.clone(),
                        question_id: question_id.clone(),
                    }
                })?;
                question.option(&prompt.trigger_value).is_some()
            }
            None => pillar
                .questions
                .iter()
                .any(|question| question.option(&prompt.trigger_value).is_some()),
        };

        if !trigger_known {
            return Err(FrameworkError::UnknownPromptTrigger {
                pillar: prompt.pillar.clone(),
                value: prompt.trigger_value.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        AnswerOption, Framework, FrameworkDefinition, FrameworkError, Pillar, PillarId,
        PipelineStage, Question, QuestionId, StageGate, MAX_FRAMEWORK_SCORE,
    };
    use crate::errors::ValidationError;

    fn question(id: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            text: format!("Question {id}?"),
            tooltip: String::new(),
            options: vec![
                AnswerOption { label: "Yes".to_string(), value: "yes".to_string(), score: 10 },
                AnswerOption { label: "No".to_string(), value: "no".to_string(), score: 0 },
            ],
        }
    }

    fn pillar(id: &str, questions: &[&str]) -> Pillar {
        Pillar {
            id: PillarId::new(id),
            title: id.to_uppercase(),
            description: String::new(),
            questions: questions.iter().map(|q| question(q)).collect(),
        }
    }

    #[test]
    fn default_framework_passes_validation() {
        let framework = Framework::meddpicc();
        let definition = FrameworkDefinition {
            pillars: framework.pillars().to_vec(),
            stages: framework.stages().to_vec(),
            coaching_prompts: framework.coaching_prompts().to_vec(),
        };

        assert_eq!(Framework::from_definition(definition), Ok(framework.clone()));
        assert_eq!(framework.pillars().len(), 8);
        assert_eq!(framework.max_total_score(), 320);
        assert!(framework.pillars().iter().all(|pillar| pillar.max_score() == 40));
        assert!(framework.pillars().iter().all(|pillar| (4..=5).contains(&pillar.questions.len())));
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let error = Framework::from_definition(FrameworkDefinition {
            pillars: vec![pillar("metrics", &["q1", "q1"])],
            ..FrameworkDefinition::default()
        })
        .expect_err("duplicate question ids must fail");

        assert!(matches!(error, FrameworkError::DuplicateQuestion { .. }));
    }

    #[test]
    fn looser_later_stage_is_rejected() {
        let error = Framework::from_definition(FrameworkDefinition {
            pillars: vec![pillar("metrics", &["q1"]), pillar("champion", &["q2"])],
            stages: vec![
                StageGate {
                    stage: PipelineStage::Prospect,
                    min_percent: 60,
                    all_pillars: false,
                    pillars: vec![PillarId::new("metrics")],
                },
                StageGate {
                    stage: PipelineStage::Engage,
                    min_percent: 50,
                    all_pillars: true,
                    pillars: Vec::new(),
                },
            ],
            ..FrameworkDefinition::default()
        })
        .expect_err("engage gate is looser than prospect");

        assert_eq!(
            error,
            FrameworkError::NonMonotonicStageGate {
                stage: PipelineStage::Engage,
                previous: PipelineStage::Prospect,
            }
        );
    }

    #[test]
    fn stage_gate_must_cover_earlier_pillars() {
        let error = Framework::from_definition(FrameworkDefinition {
            pillars: vec![pillar("metrics", &["q1"]), pillar("champion", &["q2"])],
            stages: vec![
                StageGate {
                    stage: PipelineStage::Prospect,
                    min_percent: 50,
                    all_pillars: false,
                    pillars: vec![PillarId::new("metrics")],
                },
                StageGate {
                    stage: PipelineStage::Engage,
                    min_percent: 50,
                    all_pillars: false,
                    pillars: vec![PillarId::new("champion")],
                },
            ],
            ..FrameworkDefinition::default()
        })
        .expect_err("engage drops the metrics gate");

        assert!(matches!(error, FrameworkError::NonMonotonicStageGate { .. }));
    }

    #[test]
    fn resolve_option_reports_allowed_values() {
        let framework = Framework::meddpicc();
        let error = framework
            .resolve_option(
                &PillarId::new("metrics"),
                &QuestionId::new("metrics_quantified"),
                "maybe",
            )
            .expect_err("maybe is not an option");

        match error {
            ValidationError::UnknownOption { allowed, .. } => {
                assert_eq!(allowed, vec!["yes", "partial", "no"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn framework_parses_from_toml() {
        let framework = Framework::from_toml_str(
            r#"
[[pillars]]
id = "metrics"
title = "Metrics"

[[pillars.questions]]
id = "quantified"
text = "Is the impact quantified?"

[[pillars.questions.options]]
label = "Yes"
value = "yes"
score = 5

[[pillars.questions.options]]
label = "No"
value = "no"
score = 0

[[stages]]
stage = "prospect"
min_percent = 50
all_pillars = true

[[coaching_prompts]]
pillar = "metrics"
trigger_value = "no"
prompt_text = "Quantify the impact."
"#,
        )
        .expect("framework toml should parse");

        assert_eq!(framework.total_questions(), 1);
        assert_eq!(framework.max_total_score(), 5);
        assert_eq!(framework.stages()[0].pillars, vec![PillarId::new("metrics")]);
    }

    #[test]
    fn prompt_with_unknown_trigger_is_rejected() {
        let mut definition = FrameworkDefinition {
            pillars: vec![pillar("metrics", &["q1"])],
            ..FrameworkDefinition::default()
        };
        definition.coaching_prompts.push(super::CoachingPrompt {
            pillar: PillarId::new("metrics"),
            question_id: None,
            trigger_value: "partial".to_string(),
            prompt_text: "never fires".to_string(),
            action_items: Vec::new(),
        });

        let error = Framework::from_definition(definition).expect_err("partial is not an option");
        assert!(matches!(error, FrameworkError::UnknownPromptTrigger { .. }));
    }

    #[test]
    fn oversized_option_scores_are_rejected_instead_of_overflowing() {
        let error = Framework::from_toml_str(
            r#"
[[pillars]]
id = "metrics"
title = "Metrics"

[[pillars.questions]]
id = "q1"
text = "First?"
options = [{ label = "Yes", value = "yes", score = 4294967295 }]

[[pillars.questions]]
id = "q2"
text = "Second?"
options = [{ label = "Yes", value = "yes", score = 4294967295 }]
"#,
        )
        .expect_err("sum of option scores overflows");

        assert_eq!(error, FrameworkError::ScoreOverflow { limit: MAX_FRAMEWORK_SCORE });
    }

    #[test]
    fn framework_total_above_limit_is_rejected() {
        let mut heavy = pillar("metrics", &["q1"]);
        heavy.questions[0].options[0].score = MAX_FRAMEWORK_SCORE;
        let definition = FrameworkDefinition {
            pillars: vec![heavy, pillar("champion", &["q1"])],
            ..FrameworkDefinition::default()
        };

        let error = Framework::from_definition(definition).expect_err("total exceeds limit");
        assert!(matches!(error, FrameworkError::ScoreOverflow { .. }));
    }
}
