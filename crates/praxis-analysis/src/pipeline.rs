use std::sync::Arc;

use praxis_audit::events::{AuditAction, AuditEvent};
use praxis_bedrock::completion::TextCompletion;
use praxis_core::models::analysis::AiAnalysis;
use praxis_core::models::run::RunStatus;
use praxis_literature::source::{self, DEFAULT_MAX_RESULTS, LiteratureSource};
use praxis_storage::records::RecordStore;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::{prompt, query, synthesis};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model_id: String,
    pub max_results: u32,
}

impl PipelineSettings {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// One pass of the completion pipeline for one run.
///
/// Reads the run record and survey, and writes exactly one object: the
/// run's analysis. Run status and current step are never touched, so a
/// retried or late pass cannot corrupt survey state.
pub struct CompletionPipeline {
    records: RecordStore,
    llm: Arc<dyn TextCompletion>,
    literature: Arc<dyn LiteratureSource>,
    settings: PipelineSettings,
}

impl CompletionPipeline {
    pub fn new(
        records: RecordStore,
        llm: Arc<dyn TextCompletion>,
        literature: Arc<dyn LiteratureSource>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            records,
            llm,
            literature,
            settings,
        }
    }

    pub async fn process(&self, run_id: Uuid) -> Result<AiAnalysis, AnalysisError> {
        let (record, _) = self.records.get_run(run_id).await?;
        if record.run.status != RunStatus::Completed {
            return Err(AnalysisError::NotCompleted {
                run_id,
                status: record.run.status,
            });
        }
        let survey = self.records.get_survey(record.run.survey_id).await?;

        info!(run_id = %run_id, survey_id = %survey.id, responses = record.responses.len(), "processing survey completion");

        let prompt = prompt::build_prompt(&survey, &record.responses);
        let (search_query, query_usage) =
            query::generate_search_query(self.llm.as_ref(), &self.settings.model_id, &prompt)
                .await?;

        let literature = source::search_with_summaries(
            self.literature.as_ref(),
            &search_query,
            self.settings.max_results,
        )
        .await;

        let synthesis = synthesis::synthesize(
            self.llm.as_ref(),
            &self.settings.model_id,
            &prompt,
            &literature,
        )
        .await;

        let analysis = AiAnalysis {
            prompt,
            search_query,
            literature,
            summary: synthesis.summary,
            summary_status: synthesis.status,
            usage: query_usage + synthesis.usage,
            processed_at: jiff::Timestamp::now(),
        };
        self.records.put_analysis(run_id, &analysis).await?;

        AuditEvent::run(AuditAction::AnalysisStored, run_id)
            .with_subject(record.run.subject_hash.as_str())
            .with_details(json!({
                "articles": analysis.literature.articles.len(),
                "degraded": analysis.is_degraded(),
            }))
            .emit();
        info!(
            run_id = %run_id,
            articles = analysis.literature.articles.len(),
            degraded = analysis.is_degraded(),
            cost_usd = analysis.usage.cost_usd,
            "survey completion processed"
        );
        Ok(analysis)
    }
}
