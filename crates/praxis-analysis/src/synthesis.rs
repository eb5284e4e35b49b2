//! Evidence synthesis over retrieved literature.
//!
//! Never fails outright: no records yields a fixed note, and a model error
//! or empty reply yields a placeholder summary flagged as failed.

use praxis_bedrock::completion::{CompletionRequest, TextCompletion};
use praxis_core::models::analysis::{Article, LiteratureResults, SummaryStatus};
use praxis_core::models::token_count::TokenUsage;
use tracing::{error, warn};

pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a clinically rigorous medical evidence synthesizer. Your job is to:
1) Read patient context and goals.
2) Review the PubMed records provided (title, authors, journal, pub date, PMID).
3) Produce a careful, **concise Markdown** synthesis with:
   - \"Key Takeaways\" (3-7 bullets, patient-oriented, uncertainty-aware).
   - \"Evidence Map\" as a table with columns: Study (link title to PubMed), Year, Design, N, Population, Key Finding, Limitations, PMID.
   - \"Clinical Considerations\" (what to discuss with patient; monitoring; red flags).
   - \"Gaps & Limitations\" (conflicts, sample sizes, bias, generalizability).
Citations: When referencing a finding, append **[PMID:#######]**. Prefer higher-quality evidence when ranking.
Be conservative; flag observational/low-quality findings appropriately. No hallucinations; only use provided records.";

pub const EMPTY_SUMMARY: &str = "_No summary generated._";

#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub summary: String,
    pub status: SummaryStatus,
    pub usage: TokenUsage,
}

pub async fn synthesize(
    llm: &dyn TextCompletion,
    model_id: &str,
    prompt: &str,
    literature: &LiteratureResults,
) -> Synthesis {
    if literature.articles.is_empty() {
        return Synthesis {
            summary: fallback_summary(&literature.query, literature.count),
            status: SummaryStatus::NoRecords,
            usage: TokenUsage::default(),
        };
    }

    let request = CompletionRequest {
        model_id: model_id.to_string(),
        system_prompt: SYNTHESIS_SYSTEM_PROMPT.to_string(),
        user_prompt: synthesis_user_prompt(prompt, literature),
    };

    match llm.complete(&request).await {
        Ok(completion) => {
            let text = completion.text.trim();
            if text.is_empty() {
                warn!("evidence synthesis returned an empty reply");
                Synthesis {
                    summary: EMPTY_SUMMARY.to_string(),
                    status: SummaryStatus::Failed,
                    usage: completion.usage,
                }
            } else {
                Synthesis {
                    summary: text.to_string(),
                    status: SummaryStatus::Generated,
                    usage: completion.usage,
                }
            }
        }
        Err(e) => {
            error!(error = %e, "evidence synthesis degraded to placeholder");
            Synthesis {
                summary: failed_summary(&e.to_string()),
                status: SummaryStatus::Failed,
                usage: TokenUsage::default(),
            }
        }
    }
}

pub fn failed_summary(message: &str) -> String {
    format!("_Summary generation failed: {message}_")
}

/// Markdown shown when the search returned no usable records.
pub fn fallback_summary(query: &str, count: u64) -> String {
    format!(
        "### Evidence Summary\n\n\
         No relevant PubMed records were retrieved for this case at the moment.\n\
         **Query used:** `{query}`\n\
         **Total results reported by PubMed:** {count}\n\n\
         Consider broadening the search terms or removing restrictive filters \
         (e.g., age group, language, publication year)."
    )
}

pub fn synthesis_user_prompt(prompt: &str, literature: &LiteratureResults) -> String {
    format!(
        "## Patient/Situation\n{prompt}\n\n## Retrieved PubMed Records ({} total; top shown below)\n{}",
        literature.count,
        format_articles(&literature.articles)
    )
}

/// One compact bullet per article.
pub fn format_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|a| {
            let design = if a.study.is_empty() {
                "n/a".to_string()
            } else {
                a.study.join(", ")
            };
            format!(
                "- **{}** ({}, {}) - {}. Design: {}. PMID: {}. {}",
                a.title, a.journal, a.pub_date, a.authors, design, a.pmid, a.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
