//! E-utilities response parsing. Pure functions over JSON bodies.

use std::sync::LazyLock;

use praxis_core::models::analysis::Article;
use regex::Regex;
use serde_json::Value;

use crate::error::LiteratureError;

pub const PUBMED_ARTICLE_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

static DOI: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)10\.\d{4,9}/\S+").ok());

/// Hits from an `esearch` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    /// Total matches reported, which may exceed `pmids.len()`.
    pub count: u64,
    pub pmids: Vec<String>,
}

/// Parse an `esearch.fcgi?retmode=json` body.
pub fn parse_search(body: &Value) -> Result<SearchHits, LiteratureError> {
    let result = body.get("esearchresult").ok_or_else(|| LiteratureError::Parse {
        endpoint: "esearch".to_string(),
        message: "missing esearchresult".to_string(),
    })?;

    // E-utilities encodes the count as a string.
    let count = match result.get("count") {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    };
    let pmids = result
        .get("idlist")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(id_string).collect())
        .unwrap_or_default();

    Ok(SearchHits { count, pmids })
}

/// Parse an `esummary.fcgi?retmode=json` body into articles, in `pmids`
/// order. Ids without a summary record are dropped.
pub fn parse_summaries(body: &Value, pmids: &[String]) -> Vec<Article> {
    let Some(result) = body.get("result") else {
        return Vec::new();
    };
    pmids
        .iter()
        .filter_map(|pmid| {
            let record = result.get(pmid.as_str())?;
            record.is_object().then(|| article(pmid, record))
        })
        .collect()
}

fn article(pmid: &str, record: &Value) -> Article {
    let text = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let authors = record
        .get("authors")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|a| {
                    a.get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown author")
                        .to_string()
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let study = record
        .get("pubtype")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Article {
        pmid: pmid.to_string(),
        title: text("title").unwrap_or("No title available").to_string(),
        authors: format_authors(&authors),
        journal: text("fulljournalname")
            .or_else(|| text("source"))
            .unwrap_or("Unknown journal")
            .to_string(),
        pub_date: text("pubdate").unwrap_or("Unknown date").to_string(),
        doi: text("elocationid").and_then(extract_doi),
        url: article_url(pmid),
        study,
    }
}

/// First three names, then ", et al." when there are more.
pub fn format_authors(names: &[String]) -> String {
    if names.is_empty() {
        return "No authors listed".to_string();
    }
    let shown = names
        .iter()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > 3 {
        format!("{shown}, et al.")
    } else {
        shown
    }
}

/// Pull a DOI out of an NLM `elocationid`, which may also hold page info.
pub fn extract_doi(elocation: &str) -> Option<String> {
    DOI.as_ref()?
        .find(elocation)
        .map(|m| m.as_str().to_string())
}

pub fn article_url(pmid: &str) -> String {
    format!("{PUBMED_ARTICLE_BASE}/{pmid}/")
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
