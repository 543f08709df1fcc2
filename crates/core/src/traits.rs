use crate::{BackendError, Document};
use async_trait::async_trait;

/// Similarity search over the indexed corpus. An empty result is a valid
/// answer, not an error.
#[async_trait]
pub trait DocumentStore {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Document>, BackendError>;
}

/// A system+human completion capability. The grader, rewriter and answer
/// generator all speak through this seam.
#[async_trait]
pub trait ChatModel {
    async fn complete(&self, system: &str, human: &str) -> Result<String, BackendError>;

    /// Cheap pre-flight check so the workflow can abort before retrieval
    /// when credentials or endpoints are unusable.
    fn ensure_configured(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// A web-search-capable completion taking a single user message. Only the
/// fallback path uses this.
#[async_trait]
pub trait WebSearchModel {
    async fn search_complete(&self, message: &str) -> Result<String, BackendError>;

    fn ensure_configured(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
