use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::survey::QuestionType;

/// The stored answer for one step of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub run_id: Uuid,
    pub step_id: Uuid,
    pub question_type: QuestionType,
    pub value: Option<ResponseValue>,
    /// Set only for single-choice answers that reference a concrete choice.
    pub choice_id: Option<Uuid>,
    pub is_skipped: bool,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

/// Typed answer payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ResponseValue {
    Text(String),
    Number(f64),
    Date(jiff::civil::Date),
    Choice(SelectedChoice),
    Choices(Vec<SelectedChoice>),
}

/// A selected choice as submitted. `label`/`value` are whatever the client
/// echoed back alongside the id and are only used for display fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedChoice {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A validated answer that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDraft {
    pub question_type: QuestionType,
    pub value: Option<ResponseValue>,
    pub choice_id: Option<Uuid>,
    pub is_skipped: bool,
}

/// All responses of one run, keyed by step. At most one response per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSet {
    by_step: BTreeMap<Uuid, Response>,
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the response for `step_id`.
    ///
    /// Overwrites keep the original response id and `created_at`.
    pub fn upsert(
        &mut self,
        run_id: Uuid,
        step_id: Uuid,
        draft: ResponseDraft,
        now: jiff::Timestamp,
    ) -> &Response {
        let entry = self.by_step.entry(step_id).or_insert_with(|| Response {
            id: Uuid::new_v4(),
            run_id,
            step_id,
            question_type: draft.question_type,
            value: None,
            choice_id: None,
            is_skipped: false,
            created_at: now,
            updated_at: now,
        });
        entry.question_type = draft.question_type;
        entry.value = draft.value;
        entry.choice_id = draft.choice_id;
        entry.is_skipped = draft.is_skipped;
        entry.updated_at = now;
        entry
    }

    pub fn get(&self, step_id: Uuid) -> Option<&Response> {
        self.by_step.get(&step_id)
    }

    pub fn len(&self) -> usize {
        self.by_step.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_step.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Response> {
        self.by_step.values()
    }
}
