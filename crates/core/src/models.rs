use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// One retrieved text chunk with its store metadata. Produced read-only by
/// the document store; the workflow filters collections of these but never
/// rewrites an individual document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String-typed metadata lookup; non-string scalars return `None`.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BinaryScore {
    Yes,
    No,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GradeVerdict {
    pub binary_score: BinaryScore,
}

impl GradeVerdict {
    pub fn is_relevant(&self) -> bool {
        self.binary_score == BinaryScore::Yes
    }
}

/// Provenance attached to a grounded answer. Both collections preserve
/// first-seen order and hold no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerMetadata {
    pub sources: Vec<String>,
    #[serde(rename = "university_name")]
    pub university_names: Vec<String>,
}

/// Terminal output of one workflow invocation. `metadata` is present only
/// when the answer was grounded in surviving documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineAnswer {
    pub response: String,
    pub metadata: Option<AnswerMetadata>,
}

/// Mutable record threaded through the stages of a single invocation.
/// Created at `run` entry, dropped at `run` exit; nothing survives across
/// invocations.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub query: String,
    pub candidate_documents: Vec<Document>,
    pub filtered_documents: Vec<Document>,
    pub response: String,
    pub response_metadata: Option<AnswerMetadata>,
}

impl WorkflowState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            candidate_documents: Vec::new(),
            filtered_documents: Vec::new(),
            response: String::new(),
            response_metadata: None,
        }
    }
}

/// Insertion-ordered string set: a vector for order, a hash set for
/// membership.
#[derive(Debug, Default)]
pub struct OrderedSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the value was not present before.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.seen.contains(&value) {
            return false;
        }
        self.seen.insert(value.clone());
        self.items.push(value);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Candidates requested from the document store per invocation.
    pub top_k: usize,
    /// Minimum spacing between consecutive grading calls.
    pub grade_interval: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            grade_interval: Duration::from_secs(6),
        }
    }
}
