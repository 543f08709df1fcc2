pub mod error;
pub mod fallback;
pub mod gateways;
pub mod generator;
pub mod grader;
pub mod limiter;
pub mod models;
pub mod prompts;
pub mod rewriter;
pub mod sessions;
pub mod stores;
pub mod summarizer;
pub mod traits;
pub mod workflow;

pub use error::{BackendError, GradeError, PipelineError, SessionError};
pub use fallback::FallbackResponder;
pub use gateways::{GeminiChat, GroqWebSearch, GEMINI_API_BASE, GROQ_API_BASE};
pub use generator::{collect_metadata, AnswerGenerator, GeneratedAnswer};
pub use grader::{decode_verdict, RelevanceGrader};
pub use limiter::FixedIntervalLimiter;
pub use models::{
    AnswerMetadata, BinaryScore, Document, GradeVerdict, OrderedSet, PipelineAnswer,
    PipelineOptions, WorkflowState,
};
pub use rewriter::QueryRewriter;
pub use sessions::{ChatMessage, ChatSession, ChatSessionStore, MessageRole, SessionSummary};
pub use stores::ChromaStore;
pub use summarizer::KeywordSummarizer;
pub use traits::{ChatModel, DocumentStore, WebSearchModel};
pub use workflow::CorrectiveWorkflow;
