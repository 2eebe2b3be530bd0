pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod flows;
pub mod framework;
pub mod qualification;
pub mod store;

pub use domain::answer::{Answer, AnswerSubmission, ConfidenceLevel};
pub use domain::assessment::{Assessment, OpportunityId, RiskLevel};
pub use domain::insight::{Insight, InsightPriority, InsightType};
pub use errors::{ApplicationError, DomainError, InterfaceError, ValidationError};
pub use export::{AssessmentDocument, ExportError, ExportFormat};
pub use flows::{QualificationState, QualificationTransitionError};
pub use framework::{
    CoachingPrompt, Framework, FrameworkError, Pillar, PillarId, PipelineStage, QuestionId,
};
pub use qualification::{AssessmentEngine, ScoringPolicy};
pub use store::AnswerStore;
