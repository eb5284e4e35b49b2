use std::sync::Arc;

use praxis_analysis::pipeline::{CompletionPipeline, PipelineSettings};
use praxis_analysis::worker::{RetryPolicy, Supervisor, spawn_worker};
use praxis_bedrock::completion::{BedrockCompletion, TextCompletion};
use praxis_core::subject::SubjectHasher;
use praxis_literature::client::PubMedClient;
use praxis_literature::source::LiteratureSource;
use praxis_storage::memory::MemoryObjectStore;
use praxis_storage::records::RecordStore;
use praxis_storage::store::{ObjectStore, S3ObjectStore};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{PraxisConfig, StorageBackend};
use crate::error::ServiceError;
use crate::service::SurveyService;

/// Shared application state: the survey service plus the completion worker
/// it dispatches to.
pub struct AppState {
    pub service: SurveyService,
    pub supervisor: Arc<Supervisor>,
    worker: JoinHandle<()>,
}

impl AppState {
    /// Wire every component from config. Must be called inside a tokio
    /// runtime; the completion worker is spawned here.
    pub async fn from_config(config: &PraxisConfig) -> Result<Self, ServiceError> {
        let store: Arc<dyn ObjectStore> = match &config.storage {
            StorageBackend::S3 { bucket } => {
                let client = praxis_storage::client::build_client(&config.region).await;
                Arc::new(S3ObjectStore::new(client, bucket.as_str()))
            }
            StorageBackend::Memory => {
                warn!("using in-memory storage; nothing will be persisted");
                Arc::new(MemoryObjectStore::new())
            }
        };
        let llm = Arc::new(BedrockCompletion::from_region(&config.region).await);
        let literature = Arc::new(PubMedClient::new(config.pubmed_settings())?);
        let hasher = SubjectHasher::new(config.subject_key.as_bytes())?;
        let settings = PipelineSettings {
            model_id: config.model_id.clone(),
            max_results: config.literature.max_results,
        };

        info!(region = %config.region, model_id = %config.model_id, "application state built");
        Ok(Self::with_components(
            store,
            llm,
            literature,
            hasher,
            settings,
            config.retry_policy(),
        ))
    }

    pub fn with_components(
        store: Arc<dyn ObjectStore>,
        llm: Arc<dyn TextCompletion>,
        literature: Arc<dyn LiteratureSource>,
        hasher: SubjectHasher,
        settings: PipelineSettings,
        policy: RetryPolicy,
    ) -> Self {
        let records = RecordStore::new(store);
        let pipeline = CompletionPipeline::new(records.clone(), llm, literature, settings);
        let supervisor = Arc::new(Supervisor::new(Arc::new(pipeline), policy));
        let (handle, worker) = spawn_worker(supervisor.clone());
        let service = SurveyService::new(records, hasher, Arc::new(handle));

        Self {
            service,
            supervisor,
            worker,
        }
    }

    /// Stop accepting work and wait for queued analyses to settle.
    pub async fn shutdown(self) {
        drop(self.service);
        if let Err(e) = self.worker.await {
            error!(error = %e, "completion worker ended abnormally");
        }
    }
}
