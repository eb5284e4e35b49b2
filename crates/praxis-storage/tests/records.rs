use std::sync::Arc;

use praxis_core::models::run::{RunRecord, RunStatus, SurveyRun};
use praxis_core::models::survey::{Step, StepKind, Survey};
use praxis_storage::error::StorageError;
use praxis_storage::memory::MemoryObjectStore;
use praxis_storage::records::RecordStore;
use praxis_storage::store::ObjectStore;
use uuid::Uuid;

fn ts() -> jiff::Timestamp {
    "2026-02-01T08:00:00Z".parse().unwrap()
}

fn survey() -> Survey {
    let id = Uuid::new_v4();
    Survey {
        id,
        name: "Storage".to_string(),
        description: None,
        version: 1,
        is_active: true,
        practice_hash: "hash".to_string(),
        steps: vec![Step {
            id: Uuid::new_v4(),
            survey_id: id,
            order: 1,
            title: None,
            content: None,
            kind: StepKind::Dialog,
        }],
        created_at: ts(),
    }
}

fn record(survey: &Survey) -> RunRecord {
    RunRecord::new(SurveyRun {
        id: Uuid::new_v4(),
        survey_id: survey.id,
        subject_hash: "subject".to_string(),
        status: RunStatus::Pending,
        started_at: ts(),
        finished_at: None,
        current_step_id: Some(survey.steps[0].id),
    })
}

#[tokio::test]
async fn surveys_round_trip_and_are_immutable() {
    let store = RecordStore::new(Arc::new(MemoryObjectStore::new()));
    let s = survey();
    store.put_survey(&s).await.unwrap();

    let loaded = store.get_survey(s.id).await.unwrap();
    assert_eq!(loaded.name, "Storage");
    assert_eq!(loaded.steps[0].id, s.steps[0].id);

    assert!(matches!(
        store.put_survey(&s).await,
        Err(StorageError::AlreadyExists { .. })
    ));
}

#[tokio::test]
async fn stale_run_versions_are_rejected() {
    let store = RecordStore::new(Arc::new(MemoryObjectStore::new()));
    let s = survey();
    let rec = record(&s);
    let v1 = store.create_run(&rec).await.unwrap();

    let (mut loaded, version) = store.get_run(rec.run.id).await.unwrap();
    assert_eq!(version, v1);
    loaded.run.status = RunStatus::Completed;
    let v2 = store.put_run_if_match(&loaded, &version).await.unwrap();
    assert_ne!(v1, v2);

    let err = store.put_run_if_match(&loaded, &v1).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn missing_analysis_reads_as_none() {
    let store = RecordStore::new(Arc::new(MemoryObjectStore::new()));
    assert_eq!(store.get_analysis(Uuid::new_v4()).await.unwrap(), None);
    assert!(matches!(
        store.get_run(Uuid::new_v4()).await,
        Err(StorageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn memory_store_conditional_writes() {
    let mem = MemoryObjectStore::new();
    let v1 = mem.put_if_absent("k", b"one".to_vec()).await.unwrap();
    assert!(mem.put_if_absent("k", b"two".to_vec()).await.is_err());

    let v2 = mem.put_if_match("k", b"two".to_vec(), &v1).await.unwrap();
    assert!(matches!(
        mem.put_if_match("k", b"three".to_vec(), &v1).await,
        Err(StorageError::PreconditionFailed { .. })
    ));
    let got = mem.get("k").await.unwrap();
    assert_eq!(got.body, b"two");
    assert_eq!(got.version, v2);
    assert_eq!(mem.keys().await, vec!["k".to_string()]);
}
