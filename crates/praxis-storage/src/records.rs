use std::sync::Arc;

use praxis_core::keys;
use praxis_core::models::analysis::AiAnalysis;
use praxis_core::models::run::RunRecord;
use praxis_core::models::survey::Survey;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::store::ObjectStore;

/// Load a JSON record. Returns the deserialized value and its version.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<(T, String), StorageError> {
    let object = store.get(key).await?;
    let value: T = serde_json::from_slice(&object.body)?;
    Ok((value, object.version))
}

/// Save a JSON record unconditionally. Returns the new version.
pub async fn save_json<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(key, body).await
}

/// Save a JSON record only if it is still at `expected_version`.
pub async fn save_json_if_match<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
    expected_version: &str,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put_if_match(key, body, expected_version).await
}

/// Save a JSON record only if nothing exists at `key` yet.
pub async fn save_json_if_absent<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put_if_absent(key, body).await
}

/// Domain-level access to surveys, run records and analyses.
#[derive(Clone)]
pub struct RecordStore {
    store: Arc<dyn ObjectStore>,
}

impl RecordStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Surveys are immutable, so a second write for the same id is refused.
    pub async fn put_survey(&self, survey: &Survey) -> Result<(), StorageError> {
        let key = keys::survey(survey.id);
        save_json_if_absent(self.store.as_ref(), &key, survey).await?;
        debug!(survey_id = %survey.id, key = %key, "survey stored");
        Ok(())
    }

    pub async fn get_survey(&self, id: Uuid) -> Result<Survey, StorageError> {
        let (survey, _) = load_json(self.store.as_ref(), &keys::survey(id)).await?;
        Ok(survey)
    }

    /// Store a new run record. Returns its version.
    pub async fn create_run(&self, record: &RunRecord) -> Result<String, StorageError> {
        save_json_if_absent(self.store.as_ref(), &keys::run(record.run.id), record).await
    }

    pub async fn get_run(&self, id: Uuid) -> Result<(RunRecord, String), StorageError> {
        load_json(self.store.as_ref(), &keys::run(id)).await
    }

    /// Compare-and-swap write of a run record.
    pub async fn put_run_if_match(
        &self,
        record: &RunRecord,
        expected_version: &str,
    ) -> Result<String, StorageError> {
        save_json_if_match(
            self.store.as_ref(),
            &keys::run(record.run.id),
            record,
            expected_version,
        )
        .await
    }

    /// Write (or replace) the analysis for a run.
    pub async fn put_analysis(
        &self,
        run_id: Uuid,
        analysis: &AiAnalysis,
    ) -> Result<(), StorageError> {
        save_json(self.store.as_ref(), &keys::run_analysis(run_id), analysis).await?;
        Ok(())
    }

    /// `None` until the pipeline has written an analysis.
    pub async fn get_analysis(&self, run_id: Uuid) -> Result<Option<AiAnalysis>, StorageError> {
        match load_json(self.store.as_ref(), &keys::run_analysis(run_id)).await {
            Ok((analysis, _)) => Ok(Some(analysis)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
