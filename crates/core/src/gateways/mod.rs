mod gemini;
mod groq;

pub use gemini::{GeminiChat, GEMINI_API_BASE};
pub use groq::{GroqWebSearch, GROQ_API_BASE};
