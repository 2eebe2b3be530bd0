//! Async qualification service.
//!
//! Writes for one opportunity are serialized by a per-opportunity mutex. Each
//! accepted write works on a copy of the answer store, recomputes once over that
//! consistent snapshot and commits only when validation and the lifecycle
//! transition both succeed.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use meddpicc_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink,
};
use meddpicc_core::domain::answer::{Answer, AnswerSubmission};
use meddpicc_core::domain::assessment::{Assessment, OpportunityId};
use meddpicc_core::domain::insight::Insight;
use meddpicc_core::errors::ApplicationError;
use meddpicc_core::export::{self, ExportFormat};
use meddpicc_core::flows::{
    FlowEngine, QualificationContext, QualificationEvent, QualificationState,
    StandardQualificationFlow,
};
use meddpicc_core::framework::CoachingPrompt;
use meddpicc_core::qualification::AssessmentEngine;
use meddpicc_core::store::AnswerStore;

use crate::repositories::{AssessmentRepository, OpportunityRecord, RepositoryError};

const ACTOR: &str = "qualification-service";

pub struct QualificationService<R, S = NoopAuditSink> {
    engine: AssessmentEngine,
    repository: R,
    audit: S,
    flow: FlowEngine<StandardQualificationFlow>,
    locks: Mutex<HashMap<OpportunityId, Arc<Mutex<()>>>>,
}

impl<R> QualificationService<R, NoopAuditSink>
where
    R: AssessmentRepository,
{
    pub fn new(engine: AssessmentEngine, repository: R) -> Self {
        Self::with_audit_sink(engine, repository, NoopAuditSink)
    }
}

impl<R, S> QualificationService<R, S>
where
    R: AssessmentRepository,
    S: AuditSink,
{
    pub fn with_audit_sink(engine: AssessmentEngine, repository: R, audit: S) -> Self {
        Self {
            engine,
            repository,
            audit,
            flow: FlowEngine::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &AssessmentEngine {
        &self.engine
    }

    /// Validates and records one answer, returning the recomputed assessment.
    ///
    /// On any error the stored answers, assessment and lifecycle state are unchanged.
    pub async fn submit_answer(
        &self,
        opportunity_id: &OpportunityId,
        submission: AnswerSubmission,
    ) -> Result<Assessment, ApplicationError> {
        let lock = self.lock_for(opportunity_id).await;
        let _guard = lock.lock().await;

        let context = audit_context(opportunity_id);
        let record = self.load_or_create(opportunity_id).await?;
        let pillar = submission.pillar.clone();
        let question_id = submission.question_id.clone();

        let mut answers = record.answers.clone();
        if let Err(error) = answers.upsert(self.engine.framework(), submission, Utc::now()) {
            warn!(
                event_name = "answer.rejected",
                opportunity_id = %opportunity_id,
                correlation_id = %context.correlation_id,
                pillar = %pillar,
                question_id = %question_id,
                error = %error,
                "answer rejected"
            );
            self.audit.emit(
                AuditEvent::new(
                    &context,
                    "answer.rejected",
                    AuditCategory::Answer,
                    AuditOutcome::Rejected,
                )
                .with_metadata("pillar", pillar.as_str())
                .with_metadata("question_id", question_id.as_str())
                .with_metadata("error", error.to_string()),
            );
            return Err(error.into());
        }

        let assessment = self.engine.recompute(&answers, Some(&record.assessment));
        let outcome = self.flow.apply_with_audit(
            record.state,
            QualificationEvent::AnswerRecorded,
            &self.transition_context(&assessment),
            &self.audit,
            &context,
        )?;

        self.repository
            .save(OpportunityRecord { answers, assessment: assessment.clone(), state: outcome.to })
            .await
            .map_err(persistence)?;

        info!(
            event_name = "answer.accepted",
            opportunity_id = %opportunity_id,
            correlation_id = %context.correlation_id,
            pillar = %pillar,
            question_id = %question_id,
            state = %outcome.to,
            "answer recorded"
        );
        self.audit.emit(
            AuditEvent::new(
                &context,
                "answer.accepted",
                AuditCategory::Answer,
                AuditOutcome::Success,
            )
            .with_metadata("pillar", pillar.as_str())
            .with_metadata("question_id", question_id.as_str())
            .with_metadata("version", assessment.version.to_string()),
        );

        Ok(assessment)
    }

    /// The stored assessment, or an empty one for an opportunity never assessed.
    pub async fn get_assessment(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Assessment, ApplicationError> {
        Ok(self.load_or_create(opportunity_id).await?.assessment)
    }

    pub async fn state(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<QualificationState, ApplicationError> {
        Ok(self.load_or_create(opportunity_id).await?.state)
    }

    /// Discards every answer and returns the opportunity to an empty draft.
    pub async fn reset_assessment(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Assessment, ApplicationError> {
        let lock = self.lock_for(opportunity_id).await;
        let _guard = lock.lock().await;

        let context = audit_context(opportunity_id);
        let record = self.load_or_create(opportunity_id).await?;

        let mut answers = record.answers.clone();
        answers.reset();
        let assessment = self.engine.recompute(&answers, Some(&record.assessment));
        let outcome = self.flow.apply_with_audit(
            record.state,
            QualificationEvent::ResetRequested,
            &self.transition_context(&assessment),
            &self.audit,
            &context,
        )?;

        self.repository
            .save(OpportunityRecord { answers, assessment: assessment.clone(), state: outcome.to })
            .await
            .map_err(persistence)?;

        info!(
            event_name = "assessment.reset",
            opportunity_id = %opportunity_id,
            correlation_id = %context.correlation_id,
            discarded_answers = record.answers.len(),
            "assessment reset"
        );
        self.audit.emit(
            AuditEvent::new(
                &context,
                "assessment.reset",
                AuditCategory::Assessment,
                AuditOutcome::Success,
            )
            .with_metadata("discarded_answers", record.answers.len().to_string()),
        );

        Ok(assessment)
    }

    pub async fn export_assessment(
        &self,
        opportunity_id: &OpportunityId,
        format: ExportFormat,
    ) -> Result<String, ApplicationError> {
        let assessment = self.get_assessment(opportunity_id).await?;
        let rendered = self.engine.export(&assessment, format)?;

        self.audit.emit(
            AuditEvent::new(
                &audit_context(opportunity_id),
                "assessment.exported",
                AuditCategory::Export,
                AuditOutcome::Success,
            )
            .with_metadata("format", format.as_str()),
        );
        Ok(rendered)
    }

    /// Restores an opportunity from an exported JSON document.
    ///
    /// Answers are re-validated against the current framework and the
    /// assessment is recomputed rather than trusted.
    pub async fn import_assessment(&self, raw: &str) -> Result<Assessment, ApplicationError> {
        let imported = export::import_json(raw)?;
        let opportunity_id = imported.opportunity_id.clone();

        let lock = self.lock_for(&opportunity_id).await;
        let _guard = lock.lock().await;

        let answers = AnswerStore::restore(
            opportunity_id.clone(),
            self.engine.framework(),
            imported.answers.clone(),
        )?;
        let previous = self.repository.find_by_id(&opportunity_id).await.map_err(persistence)?;
        let assessment =
            self.engine.recompute(&answers, previous.as_ref().map(|record| &record.assessment));
        let state = if self.transition_context(&assessment).meets_threshold() {
            QualificationState::Completed
        } else {
            QualificationState::Draft
        };

        self.repository
            .save(OpportunityRecord { answers, assessment: assessment.clone(), state })
            .await
            .map_err(persistence)?;

        self.audit.emit(
            AuditEvent::new(
                &audit_context(&opportunity_id),
                "assessment.imported",
                AuditCategory::Export,
                AuditOutcome::Success,
            )
            .with_metadata("answers", assessment.answers.len().to_string()),
        );
        Ok(assessment)
    }

    /// Full, unranked insight set.
    pub fn generate_insights(&self, assessment: &Assessment) -> Vec<Insight> {
        self.engine.generate_insights(assessment)
    }

    pub fn ranked_insights(&self, assessment: &Assessment, limit: Option<usize>) -> Vec<Insight> {
        self.engine.ranked_insights(assessment, limit)
    }

    pub fn coaching_prompts<'a>(
        &self,
        answers: impl IntoIterator<Item = &'a Answer>,
    ) -> Vec<CoachingPrompt> {
        self.engine.coaching_prompts(answers)
    }

    pub async fn list_opportunities(&self) -> Result<Vec<OpportunityId>, ApplicationError> {
        self.repository.list_ids().await.map_err(persistence)
    }

    /// Entries nobody holds or awaits are dropped on each call, so the map stays
    /// bounded by the opportunities currently being written plus the last one.
    async fn lock_for(&self, opportunity_id: &OpportunityId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(opportunity_id.clone()).or_default().clone()
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn load_or_create(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<OpportunityRecord, ApplicationError> {
        let existing = self.repository.find_by_id(opportunity_id).await.map_err(persistence)?;
        Ok(existing.unwrap_or_else(|| OpportunityRecord {
            answers: AnswerStore::create(opportunity_id.clone()),
            assessment: self.engine.empty(opportunity_id.clone()),
            state: self.flow.initial_state(),
        }))
    }

    fn transition_context(&self, assessment: &Assessment) -> QualificationContext {
        let policy = self.engine.policy();
        QualificationContext {
            completion_percentage: assessment.completion_percentage,
            completion_threshold_pct: policy.completion_threshold_pct,
            lock_completed: policy.lock_completed,
        }
    }
}

fn audit_context(opportunity_id: &OpportunityId) -> AuditContext {
    AuditContext::new(Some(opportunity_id.clone()), Uuid::new_v4().to_string(), ACTOR)
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

#[cfg(test)]
mod tests {
    use meddpicc_core::audit::InMemoryAuditSink;
    use meddpicc_core::domain::answer::{AnswerSubmission, ConfidenceLevel};
    use meddpicc_core::domain::assessment::{OpportunityId, RiskLevel};
    use meddpicc_core::errors::{ApplicationError, DomainError, ValidationError};
    use meddpicc_core::export::ExportFormat;
    use meddpicc_core::flows::{QualificationState, QualificationTransitionError};
    use meddpicc_core::framework::Framework;
    use meddpicc_core::qualification::{AssessmentEngine, ScoringPolicy};

    use super::QualificationService;
    use crate::repositories::InMemoryAssessmentRepository;

    type AuditedService = QualificationService<InMemoryAssessmentRepository, InMemoryAuditSink>;

    fn audited_service() -> (AuditedService, InMemoryAuditSink) {
        let sink = InMemoryAuditSink::default();
        let service = QualificationService::with_audit_sink(
            AssessmentEngine::default(),
            InMemoryAssessmentRepository::default(),
            sink.clone(),
        );
        (service, sink)
    }

    #[tokio::test]
    async fn unknown_opportunity_reads_as_empty_assessment() {
        let (service, _) = audited_service();
        let assessment =
            service.get_assessment(&OpportunityId::new("OPP-NEW")).await.expect("assessment");

        assert_eq!(assessment.total_score, 0);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.version, 0);
        assert!(service.list_opportunities().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn idle_opportunity_locks_are_released() {
        let (service, _) = audited_service();

        for id in ["OPP-1", "OPP-2", "OPP-3", "OPP-4"] {
            service
                .submit_answer(
                    &OpportunityId::new(id),
                    AnswerSubmission::new(
                        "metrics",
                        "metrics_quantified",
                        "yes",
                        ConfidenceLevel::High,
                    ),
                )
                .await
                .expect("answer accepted");
        }
        service.reset_assessment(&OpportunityId::new("OPP-1")).await.expect("reset");

        assert_eq!(service.tracked_locks().await, 1);
        assert_eq!(service.list_opportunities().await.expect("list").len(), 4);
    }

    #[tokio::test]
    async fn accepted_answer_is_persisted_and_audited() {
        let (service, sink) = audited_service();
        let opportunity = OpportunityId::new("OPP-1");

        let assessment = service
            .submit_answer(
                &opportunity,
                AnswerSubmission::new(
                    "metrics",
                    "metrics_quantified",
                    "yes",
                    ConfidenceLevel::High,
                ),
            )
            .await
            .expect("answer accepted");

        assert_eq!(assessment.total_score, 8);
        assert_eq!(assessment.version, 1);
        assert_eq!(service.get_assessment(&opportunity).await.expect("stored"), assessment);
        assert_eq!(sink.events_of_type("answer.accepted").len(), 1);
        assert_eq!(sink.events_of_type("qualification.transition_applied").len(), 1);
    }

    #[tokio::test]
    async fn rejected_answer_leaves_assessment_untouched() {
        let (service, sink) = audited_service();
        let opportunity = OpportunityId::new("OPP-1");
        let before = service
            .submit_answer(
                &opportunity,
                AnswerSubmission::new(
                    "champion",
                    "champion_identified",
                    "yes",
                    ConfidenceLevel::High,
                ),
            )
            .await
            .expect("answer accepted");

        let error = service
            .submit_answer(
                &opportunity,
                AnswerSubmission::new(
                    "champion",
                    "champion_identified",
                    "definitely",
                    ConfidenceLevel::High,
                ),
            )
            .await
            .expect_err("unknown option");

        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Validation(ValidationError::UnknownOption { .. }))
        ));
        assert_eq!(service.get_assessment(&opportunity).await.expect("stored"), before);
        assert_eq!(sink.events_of_type("answer.rejected").len(), 1);
    }

    #[tokio::test]
    async fn locked_completed_assessment_rejects_new_answers() {
        let policy = ScoringPolicy {
            completion_threshold_pct: 10,
            lock_completed: true,
            ..ScoringPolicy::default()
        };
        let service = QualificationService::new(
            AssessmentEngine::new(Framework::meddpicc(), policy),
            InMemoryAssessmentRepository::default(),
        );
        let opportunity = OpportunityId::new("OPP-LOCK");
        let questions =
            ["champion_identified", "champion_power", "champion_tested", "champion_selling"];

        for question in questions {
            service
                .submit_answer(
                    &opportunity,
                    AnswerSubmission::new("champion", question, "yes", ConfidenceLevel::High),
                )
                .await
                .expect("draft answers accepted");
        }
        assert_eq!(
            service.state(&opportunity).await.expect("state"),
            QualificationState::Completed
        );
        let before = service.get_assessment(&opportunity).await.expect("stored");

        let error = service
            .submit_answer(
                &opportunity,
                AnswerSubmission::new("champion", "champion_access", "yes", ConfidenceLevel::High),
            )
            .await
            .expect_err("locked");

        assert_eq!(
            error,
            ApplicationError::from(QualificationTransitionError::CompletedAssessmentLocked)
        );
        assert_eq!(service.get_assessment(&opportunity).await.expect("stored"), before);
    }

    #[tokio::test]
    async fn reset_discards_answers_and_returns_to_draft() {
        let (service, sink) = audited_service();
        let opportunity = OpportunityId::new("OPP-1");
        service
            .submit_answer(
                &opportunity,
                AnswerSubmission::new(
                    "competition",
                    "comp_identified",
                    "yes",
                    ConfidenceLevel::Medium,
                ),
            )
            .await
            .expect("answer accepted");

        let reset = service.reset_assessment(&opportunity).await.expect("reset");

        assert!(reset.answers.is_empty());
        assert_eq!(reset.total_score, 0);
        assert_eq!(reset.version, 2);
        assert_eq!(service.state(&opportunity).await.expect("state"), QualificationState::Draft);
        assert_eq!(sink.events_of_type("assessment.reset").len(), 1);
    }

    #[tokio::test]
    async fn exported_json_imports_into_fresh_service() {
        let (service, _) = audited_service();
        let opportunity = OpportunityId::new("OPP-EXPORT");
        let exported_assessment = service
            .submit_answer(
                &opportunity,
                AnswerSubmission::new("economic_buyer", "eb_met", "partial", ConfidenceLevel::Low)
                    .with_notes("met via champion"),
            )
            .await
            .expect("answer accepted");
        let raw =
            service.export_assessment(&opportunity, ExportFormat::Json).await.expect("export");

        let (fresh, sink) = audited_service();
        let imported = fresh.import_assessment(&raw).await.expect("import");

        assert!(imported.same_evaluation(&exported_assessment));
        assert_eq!(sink.events_of_type("assessment.imported").len(), 1);
    }
}
