mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FixedLiterature, ScriptedLlm};
use praxis_analysis::error::AnalysisError;
use praxis_analysis::pipeline::{CompletionPipeline, PipelineSettings};
use praxis_analysis::worker::{CompletionDispatch, RetryPolicy, Supervisor, spawn_worker};
use praxis_core::models::run::RunStatus;
use praxis_storage::records::RecordStore;

fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        attempt_timeout: Duration::from_secs(5),
        backoff: Duration::from_millis(1),
    }
}

fn supervisor(records: RecordStore, llm: Arc<ScriptedLlm>) -> Supervisor {
    let literature = Arc::new(FixedLiterature::articles(1, vec![common::article("1", "A")]));
    let pipeline = CompletionPipeline::new(records, llm, literature, PipelineSettings::new("m"));
    Supervisor::new(Arc::new(pipeline), quick_policy())
}

#[test]
fn default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.attempt_timeout, Duration::from_secs(120));
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let survey = common::survey();
    let record = common::answered_run(&survey, RunStatus::Completed);
    let (records, _memory) = common::seeded_store(&survey, &record).await;
    let llm = Arc::new(ScriptedLlm::new(vec![Err("throttled"), Ok("q"), Ok("summary")]));

    let analysis = supervisor(records.clone(), llm.clone())
        .run(record.run.id)
        .await
        .unwrap();

    assert_eq!(analysis.summary, "summary");
    assert_eq!(llm.calls(), 3);
    assert!(records.get_analysis(record.run.id).await.unwrap().is_some());
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let survey = common::survey();
    let record = common::answered_run(&survey, RunStatus::Completed);
    let (records, _memory) = common::seeded_store(&survey, &record).await;
    let llm = Arc::new(ScriptedLlm::new(vec![]));

    let err = supervisor(records.clone(), llm.clone())
        .run(record.run.id)
        .await
        .unwrap_err();

    match err {
        AnalysisError::Abandoned {
            run_id,
            attempts,
            last_error,
        } => {
            assert_eq!(run_id, record.run.id);
            assert_eq!(attempts, 3);
            assert!(last_error.contains("script exhausted"));
        }
        other => panic!("expected Abandoned, got {other:?}"),
    }
    assert_eq!(llm.calls(), 3);
    assert!(records.get_analysis(record.run.id).await.unwrap().is_none());
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let survey = common::survey();
    let record = common::answered_run(&survey, RunStatus::Pending);
    let (records, _memory) = common::seeded_store(&survey, &record).await;
    let llm = Arc::new(ScriptedLlm::new(vec![]));

    let err = supervisor(records, llm.clone())
        .run(record.run.id)
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::NotCompleted { .. }));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn missing_run_is_not_retried() {
    let survey = common::survey();
    let record = common::answered_run(&survey, RunStatus::Completed);
    let (records, _memory) = common::seeded_store(&survey, &record).await;

    let err = supervisor(records, Arc::new(ScriptedLlm::new(vec![])))
        .run(uuid::Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Storage(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn worker_drains_queue_before_stopping() {
    let survey = common::survey();
    let record = common::answered_run(&survey, RunStatus::Completed);
    let (records, _memory) = common::seeded_store(&survey, &record).await;
    let llm = Arc::new(ScriptedLlm::new(vec![Ok("q"), Ok("summary")]));

    let (handle, task) = spawn_worker(Arc::new(supervisor(records.clone(), llm.clone())));
    handle.dispatch(record.run.id).unwrap();
    drop(handle);
    task.await.unwrap();

    let stored = records.get_analysis(record.run.id).await.unwrap().unwrap();
    assert_eq!(stored.summary, "summary");
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn dispatch_fails_once_worker_is_gone() {
    let survey = common::survey();
    let record = common::answered_run(&survey, RunStatus::Completed);
    let (records, _memory) = common::seeded_store(&survey, &record).await;

    let (handle, task) = spawn_worker(Arc::new(supervisor(
        records,
        Arc::new(ScriptedLlm::new(vec![])),
    )));
    task.abort();
    let _ = task.await;

    let err = handle.dispatch(record.run.id).unwrap_err();
    assert!(matches!(err, AnalysisError::WorkerStopped));
}
