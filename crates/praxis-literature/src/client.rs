use std::time::Duration;

use praxis_core::models::analysis::Article;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LiteratureError;
use crate::pubmed::{self, SearchHits};
use crate::source::{BoxFuture, LiteratureSource};

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Connection settings for [`PubMedClient`].
#[derive(Debug, Clone)]
pub struct PubMedSettings {
    pub base_url: String,
    /// Optional NCBI key; raises the rate limit.
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Extra attempts after the first failed one.
    pub retries: u32,
    pub retry_backoff: Duration,
}

impl Default for PubMedSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// [`LiteratureSource`] over the E-utilities HTTP API.
pub struct PubMedClient {
    http: reqwest::Client,
    settings: PubMedSettings,
}

impl PubMedClient {
    pub fn new(settings: PubMedSettings) -> Result<Self, LiteratureError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("praxis/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LiteratureError::Http(e.to_string()))?;
        Ok(Self { http, settings })
    }

    fn url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, LiteratureError> {
        let mut all: Vec<(&str, String)> = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
        ];
        all.extend(params.iter().cloned());
        if let Some(key) = self.settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            all.push(("api_key", key.to_string()));
        }
        let base = format!("{}/{endpoint}", self.settings.base_url.trim_end_matches('/'));
        Url::parse_with_params(&base, &all).map_err(|e| LiteratureError::InvalidUrl(e.to_string()))
    }

    /// GET with a fixed-backoff retry. Retries transport errors, 429 and 5xx.
    async fn get_json(&self, endpoint: &str, url: Url) -> Result<Value, LiteratureError> {
        let mut last_error = LiteratureError::Http("no attempt made".to_string());

        for attempt in 0..=self.settings.retries {
            if attempt > 0 {
                tokio::time::sleep(self.settings.retry_backoff).await;
            }
            debug!(endpoint, attempt, "calling e-utilities");

            let response = match self.http.get(url.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(endpoint, attempt, error = %e, "e-utilities request failed");
                    last_error = LiteratureError::Http(e.to_string());
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return response.json::<Value>().await.map_err(|e| LiteratureError::Parse {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                });
            }

            warn!(endpoint, attempt, status = status.as_u16(), "e-utilities returned an error status");
            last_error = LiteratureError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            };
            if !is_retryable(status) {
                break;
            }
        }

        Err(last_error)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl LiteratureSource for PubMedClient {
    fn search<'a>(
        &'a self,
        query: &'a str,
        max_results: u32,
    ) -> BoxFuture<'a, Result<SearchHits, LiteratureError>> {
        Box::pin(async move {
            let url = self.url(
                "esearch.fcgi",
                &[
                    ("term", query.to_string()),
                    ("retmax", max_results.to_string()),
                    ("sort", "relevance".to_string()),
                ],
            )?;
            let body = self.get_json("esearch", url).await?;
            pubmed::parse_search(&body)
        })
    }

    fn summarize<'a>(
        &'a self,
        pmids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Article>, LiteratureError>> {
        Box::pin(async move {
            if pmids.is_empty() {
                return Ok(Vec::new());
            }
            let url = self.url("esummary.fcgi", &[("id", pmids.join(","))])?;
            let body = self.get_json("esummary", url).await?;
            Ok(pubmed::parse_summaries(&body, pmids))
        })
    }
}
