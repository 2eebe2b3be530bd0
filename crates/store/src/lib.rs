pub mod repositories;
pub mod service;

pub use repositories::{
    AssessmentRepository, InMemoryAssessmentRepository, OpportunityRecord, RepositoryError,
};
pub use service::QualificationService;
