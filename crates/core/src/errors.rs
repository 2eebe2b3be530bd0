use thiserror::Error;

use crate::domain::assessment::OpportunityId;
use crate::export::ExportError;
use crate::flows::QualificationTransitionError;
use crate::framework::{FrameworkError, PillarId, QuestionId};

/// Rejection of a single answer submission. Raised before the answer store is touched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown pillar `{pillar}`")]
    UnknownPillar { pillar: PillarId },
    #[error("unknown question `{question_id}` in pillar `{pillar}`")]
    UnknownQuestion { pillar: PillarId, question_id: QuestionId },
    #[error(
        "value `{value}` is not an option for `{pillar}.{question_id}` (expected one of {allowed:?})"
    )]
    UnknownOption {
        pillar: PillarId,
        question_id: QuestionId,
        value: String,
        allowed: Vec<String>,
    },
    #[error("unsupported confidence level `{0}` (expected low|medium|high)")]
    InvalidConfidence(String),
    #[error("answers belong to opportunity `{found}`, expected `{expected}`")]
    OpportunityMismatch { expected: OpportunityId, found: OpportunityId },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] QualificationTransitionError),
    #[error(transparent)]
    Framework(#[from] FrameworkError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<ValidationError> for ApplicationError {
    fn from(value: ValidationError) -> Self {
        Self::Domain(DomainError::Validation(value))
    }
}

impl From<QualificationTransitionError> for ApplicationError {
    fn from(value: QualificationTransitionError) -> Self {
        Self::Domain(DomainError::Transition(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The answer could not be recorded. Check the pillar, question and value."
            }
            Self::ServiceUnavailable { .. } => {
                "The assessment store is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::Validation(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Domain(DomainError::Transition(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Domain(DomainError::Framework(_))
            | ApplicationError::Domain(DomainError::InvariantViolation(_)) => Self::Internal {
                message: "qualification framework invariant failed".to_owned(),
                correlation_id: unassigned(),
            },
            ApplicationError::Export(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: unassigned() }
            }
        }
    }
}

fn unassigned() -> String {
    "unassigned".to_owned()
}
