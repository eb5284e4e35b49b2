#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use praxis_bedrock::completion::{BoxFuture, Completion, CompletionRequest, TextCompletion};
use praxis_bedrock::error::BedrockError;
use praxis_core::models::analysis::Article;
use praxis_core::models::response::{ResponseDraft, ResponseValue, SelectedChoice};
use praxis_core::models::run::{RunRecord, RunStatus, SurveyRun};
use praxis_core::models::survey::{
    Choice, ChoiceOptions, Question, QuestionType, Step, StepKind, Survey, TextOptions,
};
use praxis_core::models::token_count::{TokenCount, TokenUsage};
use praxis_literature::error::LiteratureError;
use praxis_literature::pubmed::SearchHits;
use praxis_literature::source::LiteratureSource;
use praxis_storage::memory::MemoryObjectStore;
use praxis_storage::records::RecordStore;
use uuid::Uuid;

/// Model that replays scripted replies in order; `Err` entries fail the call.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl TextCompletion for ScriptedLlm {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<Completion, BedrockError>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        Box::pin(async move {
            next.map(|text| Completion {
                text,
                usage: TokenUsage {
                    tokens: TokenCount {
                        input: 100,
                        output: 10,
                    },
                    cost_usd: 0.001,
                },
            })
            .map_err(BedrockError::Invocation)
        })
    }
}

/// Literature source with fixed results; counts searches.
pub struct FixedLiterature {
    pub outcome: Result<(u64, Vec<Article>), String>,
    pub searches: AtomicUsize,
}

impl FixedLiterature {
    pub fn articles(count: u64, articles: Vec<Article>) -> Self {
        Self {
            outcome: Ok((count, articles)),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            searches: AtomicUsize::new(0),
        }
    }
}

impl LiteratureSource for FixedLiterature {
    fn search<'a>(
        &'a self,
        _query: &'a str,
        _max_results: u32,
    ) -> BoxFuture<'a, Result<SearchHits, LiteratureError>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let result = match &self.outcome {
            Ok((count, articles)) => Ok(SearchHits {
                count: *count,
                pmids: articles.iter().map(|a| a.pmid.clone()).collect(),
            }),
            Err(message) => Err(LiteratureError::Http(message.clone())),
        };
        Box::pin(async move { result })
    }

    fn summarize<'a>(
        &'a self,
        _pmids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Article>, LiteratureError>> {
        let result = match &self.outcome {
            Ok((_, articles)) => Ok(articles.clone()),
            Err(message) => Err(LiteratureError::Http(message.clone())),
        };
        Box::pin(async move { result })
    }
}

pub fn article(pmid: &str, title: &str) -> Article {
    Article {
        pmid: pmid.to_string(),
        title: title.to_string(),
        authors: "Smith J, Doe A".to_string(),
        journal: "Sleep Med".to_string(),
        pub_date: "2024 Jan".to_string(),
        doi: None,
        url: format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"),
        study: vec!["Randomized Controlled Trial".to_string()],
    }
}

pub fn ts(raw: &str) -> jiff::Timestamp {
    raw.parse().unwrap()
}

/// Dialog, then a text question, then a single-choice question.
pub fn survey() -> Survey {
    let id = Uuid::new_v4();
    let text_id = Uuid::new_v4();
    let choice_step_id = Uuid::new_v4();
    Survey {
        id,
        name: "Sleep intake".to_string(),
        description: Some("Screening for sleep complaints".to_string()),
        version: 1,
        is_active: true,
        practice_hash: "practice".to_string(),
        steps: vec![
            Step {
                id: Uuid::new_v4(),
                survey_id: id,
                order: 1,
                title: Some("Welcome".to_string()),
                content: None,
                kind: StepKind::Dialog,
            },
            Step {
                id: text_id,
                survey_id: id,
                order: 2,
                title: Some("Describe your sleep".to_string()),
                content: Some("Last two weeks".to_string()),
                kind: StepKind::Question {
                    question: Question::Text {
                        options: TextOptions::default(),
                    },
                },
            },
            Step {
                id: choice_step_id,
                survey_id: id,
                order: 3,
                title: Some("Do you snore?".to_string()),
                content: None,
                kind: StepKind::Question {
                    question: Question::SingleChoice {
                        options: ChoiceOptions::default(),
                        choices: vec![
                            Choice {
                                id: Uuid::new_v4(),
                                step_id: choice_step_id,
                                label: "Yes, loudly".to_string(),
                                value: "yes".to_string(),
                                order: Some(1),
                                optional_next_step: None,
                            },
                            Choice {
                                id: Uuid::new_v4(),
                                step_id: choice_step_id,
                                label: "No".to_string(),
                                value: "no".to_string(),
                                order: Some(2),
                                optional_next_step: None,
                            },
                        ],
                    },
                },
            },
        ],
        created_at: ts("2026-01-01T00:00:00Z"),
    }
}

/// A run with both questions answered, in `status`.
pub fn answered_run(survey: &Survey, status: RunStatus) -> RunRecord {
    let run = SurveyRun {
        id: Uuid::new_v4(),
        survey_id: survey.id,
        subject_hash: "subject".to_string(),
        status,
        started_at: ts("2026-01-02T00:00:00Z"),
        finished_at: status.is_terminal().then(|| ts("2026-01-02T00:10:00Z")),
        current_step_id: Some(survey.steps[2].id),
    };
    let mut record = RunRecord::new(run);
    let now = ts("2026-01-02T00:05:00Z");
    record.responses.upsert(
        record.run.id,
        survey.steps[1].id,
        ResponseDraft {
            question_type: QuestionType::Text,
            value: Some(ResponseValue::Text("I wake up at 3am every night".to_string())),
            choice_id: None,
            is_skipped: false,
        },
        now,
    );
    let yes = survey.steps[2].question().unwrap().choices()[0].id;
    record.responses.upsert(
        record.run.id,
        survey.steps[2].id,
        ResponseDraft {
            question_type: QuestionType::SingleChoice,
            value: Some(ResponseValue::Choice(SelectedChoice {
                id: yes,
                label: None,
                value: None,
            })),
            choice_id: Some(yes),
            is_skipped: false,
        },
        now,
    );
    record
}

/// Memory-backed record store seeded with `survey` and `record`.
pub async fn seeded_store(survey: &Survey, record: &RunRecord) -> (RecordStore, Arc<MemoryObjectStore>) {
    let memory = Arc::new(MemoryObjectStore::new());
    let records = RecordStore::new(memory.clone());
    records.put_survey(survey).await.unwrap();
    records.create_run(record).await.unwrap();
    (records, memory)
}
