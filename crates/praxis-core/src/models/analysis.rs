use serde::{Deserialize, Serialize};

use super::token_count::TokenUsage;

/// The persisted result of the completion pipeline for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub prompt: String,
    pub search_query: String,
    pub literature: LiteratureResults,
    /// Markdown evidence summary, or a fixed note when degraded.
    pub summary: String,
    pub summary_status: SummaryStatus,
    #[serde(default)]
    pub usage: TokenUsage,
    pub processed_at: jiff::Timestamp,
}

impl AiAnalysis {
    /// True when the literature lookup failed or no model-written summary
    /// could be produced.
    pub fn is_degraded(&self) -> bool {
        self.literature.error.is_some() || self.summary_status != SummaryStatus::Generated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Generated,
    NoRecords,
    Failed,
}

/// Literature search bundle as returned by the search + summary calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiteratureResults {
    pub query: String,
    /// Total hits reported by the search endpoint, not the number fetched.
    pub count: u64,
    pub pmids: Vec<String>,
    pub articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LiteratureResults {
    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: 0,
            pmids: Vec::new(),
            articles: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub pub_date: String,
    pub doi: Option<String>,
    pub url: String,
    /// Publication type tags, e.g. "Randomized Controlled Trial".
    #[serde(default)]
    pub study: Vec<String>,
}

/// What a reader of a run sees of its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "analysis", rename_all = "snake_case")]
pub enum AnalysisStatus {
    NotYet,
    Ready(Box<AiAnalysis>),
}
