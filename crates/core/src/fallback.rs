use crate::prompts::FALLBACK_PREAMBLE;
use crate::summarizer::KeywordSummarizer;
use crate::traits::WebSearchModel;
use crate::BackendError;

/// Maximum number of keyword terms forwarded to the web-search model.
const SHORT_QUERY_TERMS: usize = 10;

/// Terminal path when no retrieved document survived grading: one
/// web-search completion over a keyword-shortened query, wrapped in a fixed
/// preamble so the caller can tell the answer was not grounded in the
/// corpus. Never produces provenance metadata.
pub struct FallbackResponder<W: WebSearchModel> {
    model: W,
    summarizer: KeywordSummarizer,
}

impl<W: WebSearchModel + Send + Sync> FallbackResponder<W> {
    pub fn new(model: W) -> Self {
        Self {
            model,
            summarizer: KeywordSummarizer::new(),
        }
    }

    pub fn ensure_configured(&self) -> Result<(), BackendError> {
        self.model.ensure_configured()
    }

    pub async fn respond(&self, query: &str) -> Result<String, BackendError> {
        let short_query = self.summarizer.summarize(query, SHORT_QUERY_TERMS);
        let found = self.model.search_complete(&short_query).await?;
        Ok(format!("{FALLBACK_PREAMBLE}{found}"))
    }
}
