use crate::prompts::{rewrite_human_message, QUERY_REWRITER_PROMPT};
use crate::traits::ChatModel;
use crate::BackendError;

/// Reformulates a user question into a short, keyword-dense search query.
/// The model output is trimmed and otherwise accepted as-is; there is no
/// validation or retry loop.
pub struct QueryRewriter<M: ChatModel> {
    model: M,
}

impl<M: ChatModel + Send + Sync> QueryRewriter<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn ensure_configured(&self) -> Result<(), BackendError> {
        self.model.ensure_configured()
    }

    pub async fn rewrite(&self, query: &str) -> Result<String, BackendError> {
        let rewritten = self
            .model
            .complete(QUERY_REWRITER_PROMPT, &rewrite_human_message(query))
            .await?;

        Ok(rewritten.trim().to_string())
    }
}
