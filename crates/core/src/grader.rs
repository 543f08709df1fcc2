use crate::limiter::FixedIntervalLimiter;
use crate::prompts::{grade_human_message, GRADE_DOCUMENTS_PROMPT};
use crate::traits::ChatModel;
use crate::{BinaryScore, Document, GradeError, GradeVerdict};
use serde_json::Value;
use std::time::Duration;

/// Grades one retrieved document at a time against the user question.
/// Calls go through a fixed-interval limiter: the external grading
/// capability is throughput-limited and consecutive calls must be spaced.
pub struct RelevanceGrader<M: ChatModel> {
    model: M,
    limiter: FixedIntervalLimiter,
}

impl<M: ChatModel + Send + Sync> RelevanceGrader<M> {
    pub fn new(model: M, grade_interval: Duration) -> Self {
        Self {
            model,
            limiter: FixedIntervalLimiter::new(grade_interval),
        }
    }

    pub fn ensure_configured(&self) -> Result<(), crate::BackendError> {
        self.model.ensure_configured()
    }

    pub async fn grade(&self, document: &Document, query: &str) -> Result<GradeVerdict, GradeError> {
        self.limiter.acquire().await;

        let raw = self
            .model
            .complete(GRADE_DOCUMENTS_PROMPT, &grade_human_message(&document.text, query))
            .await?;

        decode_verdict(&raw)
    }
}

/// Fallible decode of the model's structured output. Tolerates code fences
/// and casing; anything that does not contain a yes/no `binary_score` is a
/// `GradeError::Verdict`, never a silent default.
pub fn decode_verdict(raw: &str) -> Result<GradeVerdict, GradeError> {
    let stripped = strip_code_fence(raw);

    let parsed: Value = serde_json::from_str(stripped).map_err(|_| GradeError::Verdict {
        raw: raw.to_string(),
    })?;

    let score = parsed
        .get("binary_score")
        .and_then(Value::as_str)
        .ok_or_else(|| GradeError::Verdict {
            raw: raw.to_string(),
        })?;

    match score.trim().to_lowercase().as_str() {
        "yes" => Ok(GradeVerdict {
            binary_score: BinaryScore::Yes,
        }),
        "no" => Ok(GradeVerdict {
            binary_score: BinaryScore::No,
        }),
        _ => Err(GradeError::Verdict {
            raw: raw.to_string(),
        }),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
