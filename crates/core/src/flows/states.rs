use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an opportunity's assessment, tracked outside the snapshot itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationState {
    #[default]
    Draft,
    Completed,
}

impl QualificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for QualificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationEvent {
    AnswerRecorded,
    ResetRequested,
}

/// Facts about the freshly recomputed assessment that drive a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationContext {
    pub completion_percentage: u8,
    pub completion_threshold_pct: u8,
    pub lock_completed: bool,
}

impl QualificationContext {
    pub fn meets_threshold(&self) -> bool {
        self.completion_percentage >= self.completion_threshold_pct
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationAction {
    RecomputeAssessment,
    MarkCompleted,
    ReopenAssessment,
    DiscardAnswers,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: QualificationState,
    pub to: QualificationState,
    pub event: QualificationEvent,
    pub actions: Vec<QualificationAction>,
}
