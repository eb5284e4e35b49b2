//! Off-request execution of the completion pipeline.
//!
//! [`WorkerHandle`] is the production [`CompletionDispatch`]: it pushes run
//! ids onto an unbounded channel drained by a background task that runs one
//! supervised pipeline per id.

use std::sync::Arc;
use std::time::Duration;

use praxis_audit::events::{AuditAction, AuditEvent};
use praxis_core::models::analysis::AiAnalysis;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::pipeline::CompletionPipeline;

/// Hands a completed run to the pipeline without waiting for it.
pub trait CompletionDispatch: Send + Sync {
    fn dispatch(&self, run_id: Uuid) -> Result<(), AnalysisError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(120),
            backoff: Duration::from_secs(5),
        }
    }
}

/// Runs the pipeline under a [`RetryPolicy`].
pub struct Supervisor {
    pipeline: Arc<CompletionPipeline>,
    policy: RetryPolicy,
}

impl Supervisor {
    pub fn new(pipeline: Arc<CompletionPipeline>, policy: RetryPolicy) -> Self {
        Self { pipeline, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Attempt the pipeline until it succeeds, fails permanently, or the
    /// attempt budget runs out. The final failure is logged and returned.
    pub async fn run(&self, run_id: Uuid) -> Result<AiAnalysis, AnalysisError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.backoff).await;
            }

            let outcome =
                tokio::time::timeout(self.policy.attempt_timeout, self.pipeline.process(run_id))
                    .await
                    .unwrap_or_else(|_| {
                        Err(AnalysisError::Timeout(self.policy.attempt_timeout.as_secs()))
                    });

            match outcome {
                Ok(analysis) => {
                    if attempt > 1 {
                        info!(run_id = %run_id, attempt, "completion analysis succeeded after retry");
                    }
                    return Ok(analysis);
                }
                Err(e) if !e.is_retryable() => {
                    error!(run_id = %run_id, attempt, error = %e, "completion analysis failed permanently");
                    abandoned(run_id, attempt, &e.to_string());
                    return Err(e);
                }
                Err(e) => {
                    warn!(run_id = %run_id, attempt, max_attempts = attempts, error = %e, "completion attempt failed");
                    last_error = e.to_string();
                }
            }
        }

        error!(run_id = %run_id, attempts, error = %last_error, "completion analysis abandoned");
        abandoned(run_id, attempts, &last_error);
        Err(AnalysisError::Abandoned {
            run_id,
            attempts,
            last_error,
        })
    }
}

fn abandoned(run_id: Uuid, attempts: u32, last_error: &str) {
    AuditEvent::run(AuditAction::AnalysisAbandoned, run_id)
        .with_details(json!({ "attempts": attempts, "error": last_error }))
        .emit();
}

/// Sender side of the completion queue.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl CompletionDispatch for WorkerHandle {
    fn dispatch(&self, run_id: Uuid) -> Result<(), AnalysisError> {
        self.tx
            .send(run_id)
            .map_err(|_| AnalysisError::WorkerStopped)?;
        info!(run_id = %run_id, "completion analysis queued");
        Ok(())
    }
}

/// Start the background worker.
///
/// The returned task finishes once every [`WorkerHandle`] is dropped and all
/// in-flight runs have settled.
pub fn spawn_worker(supervisor: Arc<Supervisor>) -> (WorkerHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Uuid>();

    let task = tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                Some(run_id) = rx.recv() => {
                    let supervisor = supervisor.clone();
                    in_flight.spawn(async move {
                        // Failures are logged by the supervisor.
                        let _ = supervisor.run(run_id).await;
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "completion task panicked");
                    }
                }
                else => break,
            }
        }
        info!("completion worker stopped");
    });

    (WorkerHandle { tx }, task)
}
