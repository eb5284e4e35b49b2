use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

use super::response::ResponseSet;

/// One administration of a survey to one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRun {
    pub id: Uuid,
    pub survey_id: Uuid,
    /// Keyed hash of the patient identifier. The raw id never reaches a run.
    pub subject_hash: String,
    pub status: RunStatus,
    pub started_at: jiff::Timestamp,
    pub finished_at: Option<jiff::Timestamp>,
    pub current_step_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "completed" => Ok(RunStatus::Completed),
            "aborted" => Ok(RunStatus::Aborted),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// A run and its responses, stored and updated as one object so a step
/// submission is a single conditional write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: SurveyRun,
    #[serde(default)]
    pub responses: ResponseSet,
}

impl RunRecord {
    pub fn new(run: SurveyRun) -> Self {
        Self {
            run,
            responses: ResponseSet::new(),
        }
    }
}
