use praxis_analysis::error::AnalysisError;
use praxis_core::error::CoreError;
use praxis_literature::error::LiteratureError;
use praxis_storage::error::StorageError;
use praxis_survey::error::{SurveyError, ValidationErrors};
use thiserror::Error;
use uuid::Uuid;

/// Caller-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Closed,
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Survey(#[from] SurveyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Literature(#[from] LiteratureError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("run {run_id} kept changing underneath; gave up after {attempts} attempts")]
    Contention { run_id: Uuid, attempts: u32 },
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Survey(SurveyError::Validation(errors))
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Survey(SurveyError::Validation(_)) => ErrorKind::Validation,
            ServiceError::Survey(SurveyError::RunClosed { .. }) => ErrorKind::Closed,
            ServiceError::Survey(SurveyError::Integrity(_)) => ErrorKind::NotFound,
            ServiceError::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            ServiceError::Storage(StorageError::PreconditionFailed { .. })
            | ServiceError::Storage(StorageError::AlreadyExists { .. })
            | ServiceError::Contention { .. } => ErrorKind::Conflict,
            ServiceError::Analysis(AnalysisError::NotCompleted { .. }) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    /// Field-keyed messages, when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ServiceError::Survey(SurveyError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }
}
