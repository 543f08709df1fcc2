use chrono::Utc;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uni_rag_core::{
    ChatSessionStore, ChromaStore, CorrectiveWorkflow, GeminiChat, GroqWebSearch, MessageRole,
    PipelineAnswer, PipelineOptions, GEMINI_API_BASE, GROQ_API_BASE,
};

/// Shown instead of crashing when a model call fails mid-pipeline.
const DEGRADED_REPLY: &str = "I can't understand the question.";

#[derive(Parser)]
#[command(name = "uni-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Chroma base URL
    #[arg(long, default_value = "http://localhost:8000")]
    chroma_url: String,

    /// Chroma collection holding the university chunks
    #[arg(long, default_value = "egyptian_public_universities")]
    chroma_collection: String,

    /// Gemini API base URL
    #[arg(long, default_value = GEMINI_API_BASE)]
    gemini_url: String,

    /// Gemini model used for grading, rewriting and generation
    #[arg(long, default_value = "gemini-2.5-flash")]
    gemini_model: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    gemini_api_key: String,

    /// Groq API base URL
    #[arg(long, default_value = GROQ_API_BASE)]
    groq_url: String,

    /// Groq model used for the web-search fallback
    #[arg(long, default_value = "groq/compound")]
    groq_model: String,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", default_value = "", hide_env_values = true)]
    groq_api_key: String,

    /// Directory holding chat session files
    #[arg(long, default_value = "data/sessions")]
    session_dir: String,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question and persist the exchange to a chat session.
    Ask {
        /// The question to answer
        #[arg(long)]
        query: String,
        /// Number of candidate documents to retrieve.
        #[arg(long, default_value = "5")]
        top_k: usize,
        /// Seconds between consecutive relevance-grading calls.
        #[arg(long, default_value = "6")]
        grade_interval_secs: u64,
        /// Existing session to append to; a new session titled from the
        /// query is created when omitted.
        #[arg(long)]
        session: Option<String>,
    },
    /// List stored chat sessions, most recent first.
    Sessions,
    /// Print one session's transcript.
    History {
        #[arg(long)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "uni-rag boot"
    );

    let sessions = ChatSessionStore::new(&cli.session_dir)?;

    match cli.command {
        Command::Ask {
            query,
            top_k,
            grade_interval_secs,
            session,
        } => {
            let store = ChromaStore::new(&cli.chroma_url, &cli.chroma_collection);
            let filter_model =
                GeminiChat::new(&cli.gemini_url, &cli.gemini_model, &cli.gemini_api_key)
                    .with_temperature(0.7)
                    .with_json_output();
            let basic_model =
                GeminiChat::new(&cli.gemini_url, &cli.gemini_model, &cli.gemini_api_key);
            let web_model = GroqWebSearch::new(&cli.groq_url, &cli.groq_model, &cli.groq_api_key);

            let workflow = CorrectiveWorkflow::new(
                store,
                filter_model,
                basic_model,
                web_model,
                PipelineOptions {
                    top_k,
                    grade_interval: Duration::from_secs(grade_interval_secs),
                },
            );

            let session_id = match session {
                Some(id) => {
                    // Fail before any model call when the id is stale.
                    sessions.load_session(&id)?;
                    id
                }
                None => {
                    let created = sessions.create_session("new chat")?;
                    sessions.rename_from_content(&created.id, &query)?;
                    created.id
                }
            };

            let answer = match workflow.run(&query).await {
                Ok(answer) => answer,
                Err(failure) if failure.is_model_failure() => {
                    error!(%failure, "model call failed, degrading to generic reply");
                    PipelineAnswer {
                        response: DEGRADED_REPLY.to_string(),
                        metadata: None,
                    }
                }
                Err(failure) => return Err(anyhow::anyhow!(failure.to_string())),
            };

            sessions.append_message(&session_id, MessageRole::User, &query, None)?;
            sessions.append_message(
                &session_id,
                MessageRole::Assistant,
                &answer.response,
                answer.metadata.clone(),
            )?;

            println!("{}", answer.response);
            if let Some(metadata) = &answer.metadata {
                for university in &metadata.university_names {
                    println!("university: {university}");
                }
                for source in &metadata.sources {
                    println!("source: {source}");
                }
            }
            println!("session: {session_id}");
        }

        Command::Sessions => {
            for summary in sessions.list_sessions()? {
                println!(
                    "[{}] {} \"{}\" ({} messages)",
                    summary.created_at.to_rfc3339(),
                    summary.id,
                    summary.name,
                    summary.message_count
                );
            }
        }

        Command::History { session } => {
            let loaded = sessions.load_session(&session)?;
            println!("session: {} \"{}\"", loaded.id, loaded.name);
            for message in loaded.messages {
                let role = match message.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                };
                println!("[{}] {role}: {}", message.created_at.to_rfc3339(), message.content);
                if let Some(metadata) = &message.metadata {
                    for university in &metadata.university_names {
                        println!("  university: {university}");
                    }
                    for source in &metadata.sources {
                        println!("  source: {source}");
                    }
                }
            }
        }
    }

    Ok(())
}
