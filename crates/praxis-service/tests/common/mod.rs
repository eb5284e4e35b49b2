#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use praxis_analysis::error::AnalysisError;
use praxis_analysis::worker::CompletionDispatch;
use praxis_bedrock::completion::{BoxFuture, Completion, CompletionRequest, TextCompletion};
use praxis_bedrock::error::BedrockError;
use praxis_core::models::analysis::Article;
use praxis_core::models::token_count::TokenUsage;
use praxis_core::subject::SubjectHasher;
use praxis_literature::error::LiteratureError;
use praxis_literature::pubmed::SearchHits;
use praxis_literature::source::LiteratureSource;
use praxis_service::service::SurveyService;
use praxis_storage::memory::MemoryObjectStore;
use praxis_storage::records::RecordStore;
use uuid::Uuid;

/// Dialog, then a free-text question, then a single-choice question.
pub const SLEEP_SURVEY: &str = r#"
name: Sleep intake
description: Screening for sleep complaints
steps:
  - order: 1
    step_type: dialog
    title: Welcome
    content: A few questions about your sleep.
  - order: 2
    step_type: question
    question_type: text
    title: Describe your sleep
    options:
      optional: false
      max_length: 500
  - order: 3
    step_type: question
    question_type: single_choice
    title: Do you snore?
    choices:
      - label: Yes, loudly
        value: "yes"
      - label: "No"
        value: "no"
"#;

pub fn hasher() -> SubjectHasher {
    SubjectHasher::new(b"test-subject-key").unwrap()
}

/// Records every dispatched run id.
#[derive(Default)]
pub struct RecordingDispatch {
    pub runs: Mutex<Vec<Uuid>>,
}

impl RecordingDispatch {
    pub fn count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

impl CompletionDispatch for RecordingDispatch {
    fn dispatch(&self, run_id: Uuid) -> Result<(), AnalysisError> {
        self.runs.lock().unwrap().push(run_id);
        Ok(())
    }
}

/// Service over a fresh in-memory store with a recording dispatcher.
pub fn service() -> (SurveyService, Arc<MemoryObjectStore>, Arc<RecordingDispatch>) {
    let memory = Arc::new(MemoryObjectStore::new());
    let dispatch = Arc::new(RecordingDispatch::default());
    let service = SurveyService::new(
        RecordStore::new(memory.clone()),
        hasher(),
        dispatch.clone(),
    );
    (service, memory, dispatch)
}

/// Answers the query prompt and the synthesis prompt with fixed text.
#[derive(Default)]
pub struct CannedLlm {
    pub calls: AtomicUsize,
}

impl TextCompletion for CannedLlm {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<Completion, BedrockError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = if request.user_prompt.starts_with("## Patient/Situation") {
            "## Key Takeaways\n- Snoring with night waking warrants apnea screening [PMID:1]"
        } else {
            "sleep apnea[MeSH] AND snoring"
        };
        Box::pin(async move {
            Ok(Completion {
                text: text.to_string(),
                usage: TokenUsage::default(),
            })
        })
    }
}

pub struct OneArticle;

impl LiteratureSource for OneArticle {
    fn search<'a>(
        &'a self,
        _query: &'a str,
        _max_results: u32,
    ) -> BoxFuture<'a, Result<SearchHits, LiteratureError>> {
        Box::pin(async {
            Ok(SearchHits {
                count: 1,
                pmids: vec!["1".to_string()],
            })
        })
    }

    fn summarize<'a>(
        &'a self,
        _pmids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Article>, LiteratureError>> {
        Box::pin(async {
            Ok(vec![Article {
                pmid: "1".to_string(),
                title: "Snoring and apnea".to_string(),
                authors: "Smith J".to_string(),
                journal: "Sleep".to_string(),
                pub_date: "2023".to_string(),
                doi: None,
                url: "https://pubmed.ncbi.nlm.nih.gov/1/".to_string(),
                study: vec!["Cohort Study".to_string()],
            }])
        })
    }
}
