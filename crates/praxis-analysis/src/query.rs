use praxis_bedrock::completion::{CompletionRequest, TextCompletion};
use praxis_core::models::token_count::TokenUsage;
use tracing::info;

use crate::error::AnalysisError;

pub const QUERY_SYSTEM_PROMPT: &str = "You are a medical research assistant specialized in creating effective PubMed search queries. \
Analyze patient survey responses and generate a precise PubMed search query. \
Prefer MeSH terms and controlled vocabulary when obvious; include Boolean operators; avoid overly broad terms; \
no explanations, just the query.";

/// Ask the model for a PubMed query. Surrounding quotes or backticks are
/// stripped; an empty reply is an error.
pub async fn generate_search_query(
    llm: &dyn TextCompletion,
    model_id: &str,
    prompt: &str,
) -> Result<(String, TokenUsage), AnalysisError> {
    let request = CompletionRequest {
        model_id: model_id.to_string(),
        system_prompt: QUERY_SYSTEM_PROMPT.to_string(),
        user_prompt: prompt.to_string(),
    };
    let completion = llm
        .complete(&request)
        .await
        .map_err(|e| AnalysisError::QueryGeneration(e.to_string()))?;

    let query = clean_query(&completion.text);
    if query.is_empty() {
        return Err(AnalysisError::QueryGeneration(
            "model returned an empty query".to_string(),
        ));
    }
    info!(query = %query, "search query generated");
    Ok((query, completion.usage))
}

/// Trim whitespace and a wrapping code fence, backticks or quotes. Quotes
/// that are part of phrase terms are kept.
pub fn clean_query(raw: &str) -> String {
    let mut query = raw.trim();
    if let Some(inner) = query.strip_prefix("```") {
        let inner = inner.strip_suffix("```").unwrap_or(inner);
        // Drop a language tag on the opening fence line.
        query = match inner.split_once('\n') {
            Some((tag, rest)) if !tag.trim().contains(' ') => rest,
            _ => inner,
        }
        .trim();
    }
    for mark in ['`', '"', '\''] {
        if let Some(inner) = query
            .strip_prefix(mark)
            .and_then(|q| q.strip_suffix(mark))
            && !inner.contains(mark)
        {
            query = inner.trim();
        }
    }
    query.to_string()
}
