use std::collections::HashMap;

use tokio::sync::RwLock;

use meddpicc_core::domain::assessment::OpportunityId;

use super::{AssessmentRepository, OpportunityRecord, RepositoryError};

#[derive(Default)]
pub struct InMemoryAssessmentRepository {
    records: RwLock<HashMap<String, OpportunityRecord>>,
}

#[async_trait::async_trait]
impl AssessmentRepository for InMemoryAssessmentRepository {
    async fn find_by_id(
        &self,
        id: &OpportunityId,
    ) -> Result<Option<OpportunityRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(id.as_str()).cloned())
    }

    async fn save(&self, record: OpportunityRecord) -> Result<(), RepositoryError> {
        record.check_consistent()?;
        let mut records = self.records.write().await;
        records.insert(record.opportunity_id().0.clone(), record);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<OpportunityId>, RepositoryError> {
        let records = self.records.read().await;
        let mut ids: Vec<OpportunityId> = records.keys().cloned().map(OpportunityId).collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use meddpicc_core::domain::assessment::OpportunityId;
    use meddpicc_core::flows::QualificationState;
    use meddpicc_core::qualification::AssessmentEngine;
    use meddpicc_core::store::AnswerStore;

    use crate::repositories::{
        AssessmentRepository, InMemoryAssessmentRepository, OpportunityRecord, RepositoryError,
    };

    fn record(id: &str) -> OpportunityRecord {
        let engine = AssessmentEngine::default();
        let opportunity_id = OpportunityId::new(id);
        OpportunityRecord {
            answers: AnswerStore::create(opportunity_id.clone()),
            assessment: engine.empty(opportunity_id),
            state: QualificationState::Draft,
        }
    }

    #[tokio::test]
    async fn in_memory_record_round_trip() {
        let repo = InMemoryAssessmentRepository::default();
        let record = record("OPP-1");

        repo.save(record.clone()).await.expect("save record");
        let found = repo.find_by_id(&OpportunityId::new("OPP-1")).await.expect("find record");

        assert_eq!(found, Some(record));
        assert_eq!(
            repo.find_by_id(&OpportunityId::new("OPP-404")).await.expect("lookup"),
            None
        );
    }

    #[tokio::test]
    async fn list_ids_is_sorted() {
        let repo = InMemoryAssessmentRepository::default();
        repo.save(record("OPP-2")).await.expect("save");
        repo.save(record("OPP-1")).await.expect("save");

        let ids = repo.list_ids().await.expect("list");

        assert_eq!(ids, vec![OpportunityId::new("OPP-1"), OpportunityId::new("OPP-2")]);
    }

    #[tokio::test]
    async fn save_rejects_record_with_foreign_assessment() {
        let repo = InMemoryAssessmentRepository::default();
        let mut mismatched = record("OPP-1");
        mismatched.assessment = record("OPP-2").assessment;

        let error = repo.save(mismatched).await.expect_err("mismatched record must be rejected");

        assert!(matches!(
            error,
            RepositoryError::MismatchedRecord { ref answers, ref assessment }
                if answers.as_str() == "OPP-1" && assessment.as_str() == "OPP-2"
        ));
        assert!(repo.list_ids().await.expect("list").is_empty());
    }
}
