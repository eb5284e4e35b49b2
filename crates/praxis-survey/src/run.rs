//! Run state machine.
//!
//! Pending is the only open state. Every operation returns a new run plus
//! the events it produced; callers persist the run and act on the events
//! themselves (e.g. dispatching the completion pipeline exactly when
//! [`RunEvent::CompletionTriggered`] is present).

use praxis_core::models::run::{RunStatus, SurveyRun};
use praxis_core::models::survey::Survey;
use uuid::Uuid;

use crate::error::{SurveyError, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started { run_id: Uuid, survey_id: Uuid },
    StepAdvanced { run_id: Uuid, step_id: Uuid },
    CompletionTriggered { run_id: Uuid },
    Aborted { run_id: Uuid },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub run: SurveyRun,
    pub events: Vec<RunEvent>,
}

impl Transition {
    fn unchanged(run: &SurveyRun) -> Self {
        Self {
            run: run.clone(),
            events: Vec::new(),
        }
    }

    pub fn triggers_completion(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, RunEvent::CompletionTriggered { .. }))
    }
}

/// Open a new run positioned on the first step.
pub fn start(
    survey: &Survey,
    subject_hash: impl Into<String>,
    now: jiff::Timestamp,
) -> Result<Transition, SurveyError> {
    if !survey.is_active {
        return Err(ValidationErrors::single("survey_id", "The survey is not active.").into());
    }
    let first = survey.first_step().ok_or_else(|| {
        SurveyError::Integrity(format!("survey {} has no steps", survey.id))
    })?;

    let run = SurveyRun {
        id: Uuid::new_v4(),
        survey_id: survey.id,
        subject_hash: subject_hash.into(),
        status: RunStatus::Pending,
        started_at: now,
        finished_at: None,
        current_step_id: Some(first.id),
    };
    let events = vec![RunEvent::Started {
        run_id: run.id,
        survey_id: survey.id,
    }];
    Ok(Transition { run, events })
}

/// Move the run to `next_step_id`.
pub fn advance(run: &SurveyRun, next_step_id: Uuid) -> Result<Transition, SurveyError> {
    ensure_open(run)?;
    let mut next = run.clone();
    next.current_step_id = Some(next_step_id);
    Ok(Transition {
        run: next,
        events: vec![RunEvent::StepAdvanced {
            run_id: run.id,
            step_id: next_step_id,
        }],
    })
}

/// Change status. Same-status transitions are no-ops without events, and a
/// closed run cannot move to any other status.
pub fn transition(
    run: &SurveyRun,
    status: RunStatus,
    finished_at: Option<jiff::Timestamp>,
    now: jiff::Timestamp,
) -> Result<Transition, SurveyError> {
    if run.status == status {
        return Ok(Transition::unchanged(run));
    }
    ensure_open(run)?;

    let finished = finished_at.unwrap_or(now);
    if finished < run.started_at {
        return Err(ValidationErrors::single(
            "finished_at",
            "finished_at must not be earlier than started_at.",
        )
        .into());
    }

    let mut next = run.clone();
    next.status = status;
    next.finished_at = Some(finished);
    let event = match status {
        RunStatus::Completed => RunEvent::CompletionTriggered { run_id: run.id },
        RunStatus::Aborted => RunEvent::Aborted { run_id: run.id },
        // Pending -> Pending is handled above.
        RunStatus::Pending => return Ok(Transition::unchanged(run)),
    };
    Ok(Transition {
        run: next,
        events: vec![event],
    })
}

/// Fails with `RunClosed` unless the run is still pending.
pub fn ensure_open(run: &SurveyRun) -> Result<(), SurveyError> {
    if run.status.is_terminal() {
        return Err(SurveyError::RunClosed {
            run_id: run.id,
            status: run.status,
        });
    }
    Ok(())
}
