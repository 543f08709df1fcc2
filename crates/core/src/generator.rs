use crate::prompts::augmented_prompt;
use crate::traits::ChatModel;
use crate::{AnswerMetadata, BackendError, Document, OrderedSet};

#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub response: String,
    pub metadata: AnswerMetadata,
}

/// Produces a grounded answer from the surviving documents. The augmented
/// prompt carries every survivor's text; the answer must come from that
/// context alone.
pub struct AnswerGenerator<M: ChatModel> {
    model: M,
}

impl<M: ChatModel + Send + Sync> AnswerGenerator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Callers guarantee `documents` is non-empty; the workflow's Decide
    /// branch routes empty survivor sets to the fallback path instead.
    pub async fn generate(
        &self,
        query: &str,
        documents: &[Document],
    ) -> Result<GeneratedAnswer, BackendError> {
        let context = documents
            .iter()
            .map(|document| document.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let response = self.model.complete(&augmented_prompt(&context), query).await?;

        Ok(GeneratedAnswer {
            response,
            metadata: collect_metadata(documents),
        })
    }
}

/// Provenance extraction: `source` and `university_name` values in
/// first-seen order, duplicates removed.
pub fn collect_metadata(documents: &[Document]) -> AnswerMetadata {
    let mut sources = OrderedSet::new();
    let mut universities = OrderedSet::new();

    for document in documents {
        if let Some(source) = document.metadata_str("source") {
            sources.insert(source);
        }
        if let Some(university) = document.metadata_str("university_name") {
            universities.insert(university);
        }
    }

    AnswerMetadata {
        sources: sources.into_vec(),
        university_names: universities.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingModel {
        seen_system: Mutex<String>,
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn complete(&self, system: &str, _human: &str) -> Result<String, BackendError> {
            *self.seen_system.lock().unwrap() = system.to_string();
            Ok("Cairo University was founded in 1908.".to_string())
        }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new("Cairo University, founded 1908, is in Giza.")
                .with_metadata("source", "https://cu.edu.eg/about")
                .with_metadata("university_name", "Cairo University"),
            Document::new("Admission office phone: 0123.")
                .with_metadata("source", "https://cu.edu.eg/admissions")
                .with_metadata("university_name", "Cairo University"),
            Document::new("Ain Shams University is in Cairo.")
                .with_metadata("source", "https://cu.edu.eg/about")
                .with_metadata("university_name", "Ain Shams University"),
        ]
    }

    #[test]
    fn metadata_is_ordered_and_deduplicated() {
        let metadata = collect_metadata(&docs());

        assert_eq!(
            metadata.sources,
            vec!["https://cu.edu.eg/about", "https://cu.edu.eg/admissions"]
        );
        assert_eq!(
            metadata.university_names,
            vec!["Cairo University", "Ain Shams University"]
        );
    }

    #[test]
    fn documents_without_provenance_contribute_nothing() {
        let metadata = collect_metadata(&[Document::new("no metadata here")]);
        assert!(metadata.sources.is_empty());
        assert!(metadata.university_names.is_empty());
    }

    #[tokio::test]
    async fn generate_embeds_all_survivor_texts_in_prompt() {
        let model = RecordingModel {
            seen_system: Mutex::new(String::new()),
        };
        let generator = AnswerGenerator::new(model);

        let answer = generator
            .generate("when was Cairo University founded?", &docs())
            .await
            .unwrap();

        assert_eq!(answer.response, "Cairo University was founded in 1908.");
        assert_eq!(answer.metadata.university_names.len(), 2);

        let system = generator.model.seen_system.lock().unwrap();
        assert!(system.contains("Cairo University, founded 1908, is in Giza."));
        assert!(system.contains("Admission office phone: 0123."));
        assert!(system.contains("Ain Shams University is in Cairo."));
        // Survivor texts are separated by blank lines.
        assert!(system.contains("Giza.\n\nAdmission office"));
    }
}
