use regex::Regex;
use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by", "can",
    "could", "did", "do", "does", "for", "from", "had", "has", "have", "how", "i", "if", "in",
    "into", "is", "it", "its", "me", "much", "my", "no", "not", "of", "on", "or", "our", "out",
    "over", "please", "so", "some", "tell", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "to", "under", "was", "we", "were", "what", "when",
    "where", "which", "who", "why", "will", "with", "would", "you", "your",
];

/// Extracts the most salient terms of a text, used to shorten fallback web
/// queries and to title chat sessions. Deterministic: terms are ranked by
/// frequency with first-appearance tie-breaking, then emitted in original
/// text order so the result still reads like a phrase.
pub struct KeywordSummarizer {
    token_re: Regex,
}

impl Default for KeywordSummarizer {
    fn default() -> Self {
        Self {
            token_re: Regex::new(r"[a-z0-9][a-z0-9'-]*").expect("static token pattern"),
        }
    }
}

impl KeywordSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summarize(&self, text: &str, max_terms: usize) -> String {
        let lowered = text.to_lowercase();

        let mut order = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in self.token_re.find_iter(&lowered).map(|m| m.as_str()) {
            if token.len() < 3 || STOPWORDS.contains(&token) {
                continue;
            }
            if !counts.contains_key(token) {
                order.push(token);
            }
            *counts.entry(token).or_insert(0) += 1;
        }

        if order.is_empty() {
            return truncate_words(text, max_terms.max(1));
        }

        let mut ranked: Vec<&str> = order.clone();
        ranked.sort_by(|left, right| {
            counts[right].cmp(&counts[left]).then_with(|| {
                let left_pos = order.iter().position(|t| t == left);
                let right_pos = order.iter().position(|t| t == right);
                left_pos.cmp(&right_pos)
            })
        });
        ranked.truncate(max_terms.max(1));

        // Emit kept terms in the order they appeared in the text.
        order
            .iter()
            .filter(|token| ranked.contains(token))
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::KeywordSummarizer;

    #[test]
    fn drops_stopwords_and_keeps_keywords() {
        let summarizer = KeywordSummarizer::new();
        let summary = summarizer.summarize(
            "Can you tell me what the admission requirements are for Cairo University?",
            5,
        );
        assert_eq!(summary, "admission requirements cairo university");
    }

    #[test]
    fn repeated_terms_outrank_singletons() {
        let summarizer = KeywordSummarizer::new();
        let summary = summarizer.summarize(
            "engineering faculty engineering department history building",
            2,
        );
        assert!(summary.contains("engineering"));
        assert_eq!(summary.split_whitespace().count(), 2);
    }

    #[test]
    fn is_deterministic() {
        let summarizer = KeywordSummarizer::new();
        let text = "Where is the faculty of medicine at Alexandria University located?";
        assert_eq!(summarizer.summarize(text, 4), summarizer.summarize(text, 4));
    }

    #[test]
    fn falls_back_to_truncation_when_nothing_survives() {
        let summarizer = KeywordSummarizer::new();
        assert_eq!(summarizer.summarize("is it in me", 3), "is it in");
        assert_eq!(summarizer.summarize("", 3), "");
    }
}
