use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::states::{
    QualificationAction, QualificationContext, QualificationEvent, QualificationState,
    TransitionOutcome,
};

pub trait FlowDefinition {
    fn initial_state(&self) -> QualificationState;
    fn transition(
        &self,
        current: QualificationState,
        event: QualificationEvent,
        context: &QualificationContext,
    ) -> Result<TransitionOutcome, QualificationTransitionError>;
}

/// Draft until completion crosses the threshold. Editing a completed assessment
/// reopens it and re-checks completion in the same step; reset empties it.
#[derive(Clone, Debug, Default)]
pub struct StandardQualificationFlow;

impl FlowDefinition for StandardQualificationFlow {
    fn initial_state(&self) -> QualificationState {
        QualificationState::Draft
    }

    fn transition(
        &self,
        current: QualificationState,
        event: QualificationEvent,
        context: &QualificationContext,
    ) -> Result<TransitionOutcome, QualificationTransitionError> {
        transition_standard(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> QualificationState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: QualificationState,
        event: QualificationEvent,
        context: &QualificationContext,
    ) -> Result<TransitionOutcome, QualificationTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: QualificationState,
        event: QualificationEvent,
        context: &QualificationContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, QualificationTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                info!(
                    event_name = "qualification.transition_applied",
                    correlation_id = %audit.correlation_id,
                    from = %outcome.from,
                    to = %outcome.to,
                    "qualification state transition applied"
                );
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "qualification.transition_applied",
                        AuditCategory::Lifecycle,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event))
                    .with_metadata(
                        "completion_percentage",
                        context.completion_percentage.to_string(),
                    ),
                );
            }
            Err(error) => {
                warn!(
                    event_name = "qualification.transition_rejected",
                    correlation_id = %audit.correlation_id,
                    error = %error,
                    "qualification state transition rejected"
                );
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "qualification.transition_rejected",
                        AuditCategory::Lifecycle,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<StandardQualificationFlow> {
    fn default() -> Self {
        Self::new(StandardQualificationFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QualificationTransitionError {
    #[error("assessment is completed and locked; reset it before recording new answers")]
    CompletedAssessmentLocked,
}

fn transition_standard(
    current: QualificationState,
    event: QualificationEvent,
    context: &QualificationContext,
) -> Result<TransitionOutcome, QualificationTransitionError> {
    use QualificationAction::{DiscardAnswers, MarkCompleted, RecomputeAssessment, ReopenAssessment};
    use QualificationEvent::{AnswerRecorded, ResetRequested};
    use QualificationState::{Completed, Draft};

    let (to, actions) = match (current, event) {
        (Draft, AnswerRecorded) if context.meets_threshold() => {
            (Completed, vec![RecomputeAssessment, MarkCompleted])
        }
        (Draft, AnswerRecorded) => (Draft, vec![RecomputeAssessment]),
        (Completed, AnswerRecorded) if context.lock_completed => {
            return Err(QualificationTransitionError::CompletedAssessmentLocked);
        }
        (Completed, AnswerRecorded) if context.meets_threshold() => {
            (Completed, vec![ReopenAssessment, RecomputeAssessment, MarkCompleted])
        }
        (Completed, AnswerRecorded) => (Draft, vec![ReopenAssessment, RecomputeAssessment]),
        (_, ResetRequested) => (Draft, vec![DiscardAnswers, RecomputeAssessment]),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}
