use async_trait::async_trait;
use thiserror::Error;

use meddpicc_core::domain::assessment::{Assessment, OpportunityId};
use meddpicc_core::flows::QualificationState;
use meddpicc_core::store::AnswerStore;

pub mod memory;

pub use memory::InMemoryAssessmentRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record for `{answers}` carries an assessment for `{assessment}`")]
    MismatchedRecord { answers: OpportunityId, assessment: OpportunityId },
}

/// Everything persisted for one opportunity: the live answers, the snapshot
/// derived from them, and the lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpportunityRecord {
    pub answers: AnswerStore,
    pub assessment: Assessment,
    pub state: QualificationState,
}

impl OpportunityRecord {
    pub fn opportunity_id(&self) -> &OpportunityId {
        self.answers.opportunity_id()
    }

    /// Answers and snapshot must describe the same opportunity before a record is stored.
    pub fn check_consistent(&self) -> Result<(), RepositoryError> {
        if self.assessment.opportunity_id == *self.opportunity_id() {
            return Ok(());
        }
        Err(RepositoryError::MismatchedRecord {
            answers: self.opportunity_id().clone(),
            assessment: self.assessment.opportunity_id.clone(),
        })
    }
}

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &OpportunityId,
    ) -> Result<Option<OpportunityRecord>, RepositoryError>;
    async fn save(&self, record: OpportunityRecord) -> Result<(), RepositoryError>;
    async fn list_ids(&self) -> Result<Vec<OpportunityId>, RepositoryError>;
}
