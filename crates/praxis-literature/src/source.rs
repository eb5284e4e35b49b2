use std::future::Future;
use std::pin::Pin;

use praxis_core::models::analysis::{Article, LiteratureResults};
use tracing::{info, warn};

use crate::error::LiteratureError;
use crate::pubmed::SearchHits;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default number of records fetched per search.
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// A searchable literature index.
pub trait LiteratureSource: Send + Sync {
    /// Run `query`, returning at most `max_results` ids ranked by relevance.
    fn search<'a>(
        &'a self,
        query: &'a str,
        max_results: u32,
    ) -> BoxFuture<'a, Result<SearchHits, LiteratureError>>;

    /// Fetch summary records for `pmids`.
    fn summarize<'a>(
        &'a self,
        pmids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Article>, LiteratureError>>;
}

/// Search then summarize. Never fails.
///
/// A failed search yields empty results carrying the error message. A failed
/// summary call after a good search keeps the ids and count with no
/// articles, and also carries the error message.
pub async fn search_with_summaries(
    source: &dyn LiteratureSource,
    query: &str,
    max_results: u32,
) -> LiteratureResults {
    let hits = match source.search(query, max_results).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!(query, error = %e, "literature search failed");
            return LiteratureResults::failed(query, e.to_string());
        }
    };

    let (articles, error) = if hits.pmids.is_empty() {
        (Vec::new(), None)
    } else {
        match source.summarize(&hits.pmids).await {
            Ok(articles) => (articles, None),
            Err(e) => {
                warn!(query, error = %e, "literature summaries failed; keeping ids only");
                (Vec::new(), Some(e.to_string()))
            }
        }
    };

    info!(
        query,
        count = hits.count,
        fetched = hits.pmids.len(),
        articles = articles.len(),
        "literature lookup complete"
    );

    LiteratureResults {
        query: query.to_string(),
        count: hits.count,
        pmids: hits.pmids,
        articles,
        error,
    }
}
