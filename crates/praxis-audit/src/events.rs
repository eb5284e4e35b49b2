use std::fmt;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SurveyImported,
    RunStarted,
    StepSubmitted,
    RunStatusChanged,
    AnalysisStored,
    AnalysisAbandoned,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::SurveyImported => "survey_imported",
            AuditAction::RunStarted => "run_started",
            AuditAction::StepSubmitted => "step_submitted",
            AuditAction::RunStatusChanged => "run_status_changed",
            AuditAction::AnalysisStored => "analysis_stored",
            AuditAction::AnalysisAbandoned => "analysis_abandoned",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured audit event.
///
/// `subject` is always a keyed hash (practice or patient), never a raw
/// identifier.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub resource_type: &'static str,
    pub resource_id: Uuid,
    pub subject: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, resource_type: &'static str, resource_id: Uuid) -> Self {
        Self {
            action,
            resource_type,
            resource_id,
            subject: None,
            details: None,
        }
    }

    pub fn survey(action: AuditAction, survey_id: Uuid) -> Self {
        Self::new(action, "survey", survey_id)
    }

    pub fn run(action: AuditAction, run_id: Uuid) -> Self {
        Self::new(action, "survey_run", run_id)
    }

    pub fn with_subject(mut self, subject_hash: impl Into<String>) -> Self {
        self.subject = Some(subject_hash.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Emit this audit event via tracing.
    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        info!(
            audit.action = %self.action,
            audit.resource_type = self.resource_type,
            audit.resource_id = %self.resource_id,
            audit.subject = self.subject.as_deref().unwrap_or("-"),
            audit.details = %details,
            "audit event"
        );
    }
}
