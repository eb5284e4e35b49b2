use praxis_core::models::run::RunStatus;
use praxis_storage::error::StorageError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("search query generation failed: {0}")]
    QueryGeneration(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("run {run_id} is {status}, not completed")]
    NotCompleted { run_id: Uuid, status: RunStatus },

    #[error("attempt timed out after {0} seconds")]
    Timeout(u64),

    #[error("analysis for run {run_id} abandoned after {attempts} attempts: {last_error}")]
    Abandoned {
        run_id: Uuid,
        attempts: u32,
        last_error: String,
    },

    #[error("completion worker is not running")]
    WorkerStopped,
}

impl AnalysisError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::QueryGeneration(_) | AnalysisError::Timeout(_) => true,
            AnalysisError::Storage(e) => !matches!(e, StorageError::NotFound { .. }),
            AnalysisError::NotCompleted { .. }
            | AnalysisError::Abandoned { .. }
            | AnalysisError::WorkerStopped => false,
        }
    }
}
