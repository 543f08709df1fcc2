//! Prompt text for the three model call kinds plus the fallback preamble.

pub const GRADE_DOCUMENTS_PROMPT: &str = "\
You are a grader assessing the relevance of a retrieved document to a user question.
If the document contains keywords or semantic content related to the question, grade it as relevant.
Respond with a JSON object of the form {\"binary_score\": \"yes\"} or {\"binary_score\": \"no\"}.
Output only the JSON object, nothing else.";

pub const QUERY_REWRITER_PROMPT: &str = "\
You are a query rewriter that converts user questions into short, direct search queries.
Rules:
- Output only the rewritten query text (no explanations or extra sentences)
- Keep it under 15 words
- Focus on clarity and relevant keywords only";

/// Prepended to every fallback answer so the caller can tell web-sourced
/// text from grounded text.
pub const FALLBACK_PREAMBLE: &str = "I couldn't get any data from the documents I had, \
so I searched the internet and this is what I found:\n\n";

pub fn grade_human_message(document: &str, query: &str) -> String {
    format!("Retrieved document: \n\n {document} \n\n User question: {query}")
}

pub fn rewrite_human_message(query: &str) -> String {
    format!("Here is the initial question: \n\n {query} \n Formulate an improved question.")
}

/// System prompt for grounded generation: the model may only use the
/// supplied excerpts, never outside knowledge.
pub fn augmented_prompt(context: &str) -> String {
    format!(
        "You are an expert on Egyptian public universities.\n\
         Use the following document excerpts to answer the user query.\n\
         Do not make assumptions; only provide information present in the documents.\n\
         \n\
         Document Context:\n\
         {context}\n\
         \n\
         Instructions:\n\
         - Answer clearly and concisely.\n\
         - Include any relevant details like faculty names, contact info, admission requirements, or location if available in the context.\n\
         - Keep your answer in a readable paragraph format."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augmented_prompt_embeds_context() {
        let prompt = augmented_prompt("Cairo University was founded in 1908.");
        assert!(prompt.contains("Cairo University was founded in 1908."));
        assert!(prompt.contains("only provide information present in the documents"));
    }

    #[test]
    fn grade_message_carries_document_and_query() {
        let message = grade_human_message("chunk text", "tuition fees?");
        assert!(message.contains("chunk text"));
        assert!(message.contains("tuition fees?"));
    }
}
