use crate::error::SessionError;
use crate::summarizer::KeywordSummarizer;
use crate::AnswerMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnswerMetadata>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Filesystem-backed chat persistence: one JSON document per session under
/// the store root. The core pipeline never touches this; callers persist
/// exchanges themselves after each `run`.
pub struct ChatSessionStore {
    root: PathBuf,
    summarizer: KeywordSummarizer,
}

impl ChatSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            summarizer: KeywordSummarizer::new(),
        })
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.root.join(format!("{session_id}.json"))
    }

    fn save(&self, session: &ChatSession) -> Result<(), SessionError> {
        let serialized = serde_json::to_string_pretty(session)?;
        fs::write(self.session_path(&session.id), serialized)?;
        Ok(())
    }

    pub fn create_session(&self, name: &str) -> Result<ChatSession, SessionError> {
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        self.save(&session)?;
        Ok(session)
    }

    pub fn load_session(&self, session_id: &str) -> Result<ChatSession, SessionError> {
        let path = self.session_path(session_id);
        let raw = fs::read_to_string(&path).map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                SessionError::UnknownSession(session_id.to_string())
            } else {
                SessionError::Io(error)
            }
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        metadata: Option<AnswerMetadata>,
    ) -> Result<(), SessionError> {
        let mut session = self.load_session(session_id)?;
        session.messages.push(ChatMessage {
            role,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        });
        self.save(&session)
    }

    /// Derives a short lowercase title from message content and stores it
    /// as the session name.
    pub fn rename_from_content(
        &self,
        session_id: &str,
        content: &str,
    ) -> Result<String, SessionError> {
        let name = self.summarizer.summarize(content, 5).to_lowercase();
        let mut session = self.load_session(session_id)?;
        session.name = name.clone();
        self.save(&session)?;
        Ok(name)
    }

    /// All stored sessions, most recently created first. Unreadable files
    /// are skipped.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let mut summaries = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if !is_json {
                continue;
            }

            match fs::read_to_string(&path)
                .map_err(SessionError::Io)
                .and_then(|raw| serde_json::from_str::<ChatSession>(&raw).map_err(Into::into))
            {
                Ok(session) => summaries.push(SessionSummary {
                    id: session.id,
                    name: session.name,
                    created_at: session.created_at,
                    message_count: session.messages.len(),
                }),
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable session file");
                }
            }
        }

        summaries.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(summaries)
    }
}
