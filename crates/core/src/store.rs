//! In-memory answer store for a single opportunity.
//!
//! Holds at most one live answer per `(pillar, question)`; a later upsert replaces
//! the earlier one. Every write is validated against the framework before the
//! store is touched, so a rejected submission leaves prior answers intact.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::answer::{Answer, AnswerSubmission};
use crate::domain::assessment::OpportunityId;
use crate::errors::ValidationError;
use crate::framework::{Framework, PillarId, QuestionId};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnswerKey {
    pub pillar: PillarId,
    pub question_id: QuestionId,
}

impl AnswerKey {
    pub fn new(pillar: PillarId, question_id: QuestionId) -> Self {
        Self { pillar, question_id }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerStore {
    opportunity_id: OpportunityId,
    answers: BTreeMap<AnswerKey, Answer>,
}

impl AnswerStore {
    pub fn create(opportunity_id: OpportunityId) -> Self {
        Self { opportunity_id, answers: BTreeMap::new() }
    }

    /// Rebuilds a store from previously exported answers.
    ///
    /// Scores are re-resolved from the framework so a stale or tampered score
    /// never survives the round trip; the stored timestamps are kept.
    pub fn restore(
        opportunity_id: OpportunityId,
        framework: &Framework,
        answers: impl IntoIterator<Item = Answer>,
    ) -> Result<Self, ValidationError> {
        let mut store = Self::create(opportunity_id);
        for answer in answers {
            let option = framework.resolve_option(
                &answer.pillar,
                &answer.question_id,
                &answer.answer_value,
            )?;
            let answer = Answer { score: option.score, ..answer };
            store.answers.insert(
                AnswerKey::new(answer.pillar.clone(), answer.question_id.clone()),
                answer,
            );
        }
        Ok(store)
    }

    pub fn opportunity_id(&self) -> &OpportunityId {
        &self.opportunity_id
    }

    /// Inserts or replaces the answer for the submission's question (last write wins).
    pub fn upsert(
        &mut self,
        framework: &Framework,
        submission: AnswerSubmission,
        at: DateTime<Utc>,
    ) -> Result<&Answer, ValidationError> {
        let option = framework.resolve_option(
            &submission.pillar,
            &submission.question_id,
            &submission.value,
        )?;
        let score = option.score;

        let key = AnswerKey::new(submission.pillar.clone(), submission.question_id.clone());
        let answer = Answer {
            pillar: submission.pillar,
            question_id: submission.question_id,
            answer_value: submission.value,
            score,
            confidence_level: submission.confidence_level,
            evidence_notes: submission.evidence_notes.filter(|notes| !notes.trim().is_empty()),
            timestamp: at,
        };

        let slot = match self.answers.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(answer);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(answer),
        };
        Ok(slot)
    }

    pub fn get(&self, pillar: &PillarId, question_id: &QuestionId) -> Option<&Answer> {
        self.answers.get(&AnswerKey::new(pillar.clone(), question_id.clone()))
    }

    /// Answers ordered by `(pillar, question)` id.
    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.values()
    }

    pub fn answers_for<'a>(&'a self, pillar: &'a PillarId) -> impl Iterator<Item = &'a Answer> {
        self.answers.values().filter(move |answer| &answer.pillar == pillar)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Discards every answer, returning the store to its freshly created state.
    pub fn reset(&mut self) {
        self.answers.clear();
    }
}
