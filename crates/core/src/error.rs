use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("empty completion from {0}")]
    EmptyCompletion(String),

    #[error("missing credentials for {0}")]
    MissingCredentials(String),
}

/// Grading failures keep the malformed-verdict case separate from transport
/// failures so the workflow can exclude a single document without giving up
/// on the whole invocation.
#[derive(Debug, Error)]
pub enum GradeError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("unparseable relevance verdict: {raw}")]
    Verdict { raw: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("document retrieval failed: {0}")]
    Retrieval(#[source] BackendError),

    #[error("{stage} model call failed: {source}")]
    ModelCall {
        stage: &'static str,
        #[source]
        source: BackendError,
    },
}

impl PipelineError {
    /// True for failures the caller is expected to soften into a generic
    /// "could not understand the question" reply instead of crashing.
    pub fn is_model_failure(&self) -> bool {
        matches!(self, PipelineError::ModelCall { .. })
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown session: {0}")]
    UnknownSession(String),
}
