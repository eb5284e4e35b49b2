//! Step navigation.
//!
//! Default ordering follows `Step::order` (gaps allowed). A single-choice
//! answer whose choice carries `optional_next_step` overrides the default
//! for that submission only.

use praxis_core::models::response::{ResponseDraft, ResponseValue};
use praxis_core::models::survey::{QuestionType, Step, Survey};
use serde::Serialize;
use uuid::Uuid;

use crate::error::SurveyError;

/// Where a step sits in its survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepPosition {
    pub next_step_id: Option<Uuid>,
    pub previous_step_id: Option<Uuid>,
    /// Zero-based rank in order.
    pub index: usize,
    pub total: usize,
    /// Integer percent, 100 on the last step.
    pub progress: u8,
}

/// The step that follows `current`, taking a submitted answer into account.
///
/// `None` means the survey is finished.
pub fn next_step(
    survey: &Survey,
    current: Uuid,
    answer: Option<&ResponseDraft>,
) -> Result<Option<Uuid>, SurveyError> {
    let step = lookup(survey, current)?;

    if let Some(target) = answer.and_then(|a| branch_target(step, a)) {
        if survey.step(target).is_none() {
            return Err(SurveyError::Integrity(format!(
                "branch target {target} from step {current} is not part of survey {}",
                survey.id
            )));
        }
        return Ok(Some(target));
    }

    Ok(survey
        .steps
        .iter()
        .filter(|s| s.order > step.order)
        .min_by_key(|s| s.order)
        .map(|s| s.id))
}

pub fn previous_step(survey: &Survey, current: Uuid) -> Result<Option<Uuid>, SurveyError> {
    let step = lookup(survey, current)?;
    Ok(survey
        .steps
        .iter()
        .filter(|s| s.order < step.order)
        .max_by_key(|s| s.order)
        .map(|s| s.id))
}

/// Default neighbours plus progress for displaying `current`.
pub fn position(survey: &Survey, current: Uuid) -> Result<StepPosition, SurveyError> {
    let ordered = survey.ordered_steps();
    let index = ordered
        .iter()
        .position(|s| s.id == current)
        .ok_or_else(|| not_in_survey(survey, current))?;
    let total = ordered.len();
    let progress = if total <= 1 {
        100
    } else {
        ((index as f64 / (total - 1) as f64) * 100.0).round() as u8
    };

    Ok(StepPosition {
        next_step_id: next_step(survey, current, None)?,
        previous_step_id: previous_step(survey, current)?,
        index,
        total,
        progress,
    })
}

fn branch_target(step: &Step, answer: &ResponseDraft) -> Option<Uuid> {
    if answer.is_skipped || answer.question_type != QuestionType::SingleChoice {
        return None;
    }
    let choice_id = answer.choice_id.or(match &answer.value {
        Some(ResponseValue::Choice(selected)) => Some(selected.id),
        _ => None,
    })?;
    step.question()?.choice(choice_id)?.optional_next_step
}

fn lookup(survey: &Survey, id: Uuid) -> Result<&Step, SurveyError> {
    survey.step(id).ok_or_else(|| not_in_survey(survey, id))
}

fn not_in_survey(survey: &Survey, step_id: Uuid) -> SurveyError {
    SurveyError::Integrity(format!(
        "step {step_id} is not part of survey {}",
        survey.id
    ))
}
