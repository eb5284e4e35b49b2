//! Survey run orchestration.
//!
//! Every mutation of a run is a read-modify-write of its single run record
//! under a version precondition. A lost race re-reads and re-applies the
//! whole operation, so the last submission for a step wins and a status
//! change is observed exactly once by whoever wins the write.

use std::sync::Arc;

use praxis_analysis::worker::CompletionDispatch;
use praxis_audit::events::{AuditAction, AuditEvent};
use praxis_core::models::analysis::AnalysisStatus;
use praxis_core::models::response::Response;
use praxis_core::models::run::{RunRecord, RunStatus, SurveyRun};
use praxis_core::models::survey::{Step, Survey};
use praxis_core::subject::SubjectHasher;
use praxis_storage::records::RecordStore;
use praxis_survey::answer::{self, Submission};
use praxis_survey::error::SurveyError;
use praxis_survey::import::{self, ImportFormat};
use praxis_survey::navigation::{self, StepPosition};
use praxis_survey::run;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ServiceError;

/// Attempts per compare-and-swap write before giving up.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Where a submission leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Next(Uuid),
    /// No step follows; the run is ready to be completed.
    Finished,
}

/// Everything needed to render one step of a run.
#[derive(Debug, Clone)]
pub struct StepView {
    pub run: SurveyRun,
    pub step: Step,
    pub position: StepPosition,
    pub response: Option<Response>,
}

pub struct SurveyService {
    records: RecordStore,
    hasher: SubjectHasher,
    dispatch: Arc<dyn CompletionDispatch>,
}

impl SurveyService {
    pub fn new(
        records: RecordStore,
        hasher: SubjectHasher,
        dispatch: Arc<dyn CompletionDispatch>,
    ) -> Self {
        Self {
            records,
            hasher,
            dispatch,
        }
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Validate an import document and store the survey for `practice_id`.
    pub async fn import_survey(
        &self,
        text: &str,
        format: ImportFormat,
        practice_id: &str,
    ) -> Result<Survey, ServiceError> {
        let practice_hash = self.hasher.hash(practice_id);
        let survey = import::import_survey(text, format, &practice_hash, jiff::Timestamp::now())?;
        self.records.put_survey(&survey).await?;

        AuditEvent::survey(AuditAction::SurveyImported, survey.id)
            .with_subject(practice_hash)
            .with_details(json!({ "version": survey.version, "steps": survey.steps.len() }))
            .emit();
        info!(survey_id = %survey.id, steps = survey.steps.len(), "survey imported");
        Ok(survey)
    }

    /// Open a run of `survey_id` for `patient_id`.
    pub async fn start_run(
        &self,
        survey_id: Uuid,
        patient_id: &str,
    ) -> Result<SurveyRun, ServiceError> {
        let survey = self.records.get_survey(survey_id).await?;
        let subject_hash = self.hasher.hash(patient_id);
        let started = run::start(&survey, subject_hash, jiff::Timestamp::now())?;
        self.records
            .create_run(&RunRecord::new(started.run.clone()))
            .await?;

        AuditEvent::run(AuditAction::RunStarted, started.run.id)
            .with_subject(started.run.subject_hash.as_str())
            .with_details(json!({ "survey_id": survey_id }))
            .emit();
        info!(run_id = %started.run.id, survey_id = %survey_id, "survey run started");
        Ok(started.run)
    }

    pub async fn step_view(&self, run_id: Uuid, step_id: Uuid) -> Result<StepView, ServiceError> {
        let (record, _) = self.records.get_run(run_id).await?;
        let survey = self.records.get_survey(record.run.survey_id).await?;
        let step = step_in(&survey, step_id)?.clone();
        let position = navigation::position(&survey, step_id)?;
        let response = record.responses.get(step_id).cloned();

        Ok(StepView {
            run: record.run,
            step,
            position,
            response,
        })
    }

    /// Validate and record one step submission, then move the run on.
    ///
    /// The response upsert and the current-step update land in one write.
    pub async fn submit_step(
        &self,
        run_id: Uuid,
        step_id: Uuid,
        payload: &Value,
    ) -> Result<StepOutcome, ServiceError> {
        let submission = Submission::from_json(payload)?;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (mut record, version) = self.records.get_run(run_id).await?;
            run::ensure_open(&record.run)?;
            let survey = self.records.get_survey(record.run.survey_id).await?;
            let step = step_in(&survey, step_id)?;

            let today = jiff::Zoned::now().date();
            let answer = answer::validate_answer(step, &submission, today)?;
            let next = navigation::next_step(&survey, step_id, answer.draft())?;

            if let Some(draft) = answer.draft() {
                record
                    .responses
                    .upsert(run_id, step_id, draft.clone(), jiff::Timestamp::now());
            }
            if let Some(next_id) = next {
                record.run = run::advance(&record.run, next_id)?.run;
            }

            match self.records.put_run_if_match(&record, &version).await {
                Ok(_) => {
                    AuditEvent::run(AuditAction::StepSubmitted, run_id)
                        .with_subject(record.run.subject_hash.as_str())
                        .with_details(json!({
                            "step_id": step_id,
                            "skipped": submission.skipped,
                        }))
                        .emit();
                    return Ok(match next {
                        Some(next_id) => StepOutcome::Next(next_id),
                        None => StepOutcome::Finished,
                    });
                }
                Err(e) if e.is_conflict() => {
                    warn!(run_id = %run_id, step_id = %step_id, attempt, "run record changed during submission; retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Contention {
            run_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    /// Move a run to `status`.
    ///
    /// The completion pipeline is dispatched only by the caller whose write
    /// took the run from Pending to Completed. A dispatch failure is logged
    /// and does not undo the status change.
    pub async fn update_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        finished_at: Option<jiff::Timestamp>,
    ) -> Result<SurveyRun, ServiceError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (mut record, version) = self.records.get_run(run_id).await?;
            let previous = record.run.status;
            let transition = run::transition(&record.run, status, finished_at, jiff::Timestamp::now())?;
            if transition.events.is_empty() {
                return Ok(transition.run);
            }

            record.run = transition.run.clone();
            match self.records.put_run_if_match(&record, &version).await {
                Ok(_) => {
                    AuditEvent::run(AuditAction::RunStatusChanged, run_id)
                        .with_subject(record.run.subject_hash.as_str())
                        .with_details(json!({
                            "from": previous.as_str(),
                            "to": status.as_str(),
                        }))
                        .emit();
                    info!(run_id = %run_id, from = %previous, to = %status, "run status changed");

                    if transition.triggers_completion()
                        && let Err(e) = self.dispatch.dispatch(run_id)
                    {
                        error!(run_id = %run_id, error = %e, "failed to dispatch completion analysis");
                    }
                    return Ok(transition.run);
                }
                Err(e) if e.is_conflict() => {
                    warn!(run_id = %run_id, attempt, "run record changed during status update; retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Contention {
            run_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    /// The run's analysis, or `NotYet` while the pipeline has not written one.
    pub async fn analysis(&self, run_id: Uuid) -> Result<AnalysisStatus, ServiceError> {
        // Surfaces NotFound for unknown runs.
        self.records.get_run(run_id).await?;
        Ok(match self.records.get_analysis(run_id).await? {
            Some(analysis) => AnalysisStatus::Ready(Box::new(analysis)),
            None => AnalysisStatus::NotYet,
        })
    }
}

fn step_in(survey: &Survey, step_id: Uuid) -> Result<&Step, SurveyError> {
    survey.step(step_id).ok_or_else(|| {
        SurveyError::Integrity(format!("step {step_id} is not part of survey {}", survey.id))
    })
}
