use crate::traits::DocumentStore;
use crate::{BackendError, Document};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Chroma REST client. Embeddings live server-side; this client only issues
/// text queries and maps the hits back into documents.
pub struct ChromaStore {
    client: Client,
    endpoint: String,
    collection: String,
}

impl ChromaStore {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for ChromaStore {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Document>, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.endpoint, self.collection
            ))
            .json(&json!({
                "query_texts": [query],
                "n_results": top_k,
                "include": ["documents", "metadatas"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parse_query_response(&parsed))
    }
}

/// Chroma answers one result list per input query; with a single query text
/// the hits live at `documents[0]` / `metadatas[0]`.
fn parse_query_response(parsed: &Value) -> Vec<Document> {
    let texts = parsed
        .pointer("/documents/0")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let metadatas = parsed
        .pointer("/metadatas/0")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut documents = Vec::new();
    for (position, text) in texts.iter().enumerate() {
        let Some(text) = text.as_str() else {
            continue;
        };

        let mut document = Document::new(text);
        if let Some(metadata) = metadatas.get(position).and_then(Value::as_object) {
            for (key, value) in metadata {
                document.metadata.insert(key.clone(), value.clone());
            }
        }
        documents.push(document);
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::parse_query_response;
    use serde_json::json;

    #[test]
    fn hits_map_to_documents_with_metadata() {
        let parsed = json!({
            "ids": [["1", "2"]],
            "documents": [["Cairo University info", "Helwan University info"]],
            "metadatas": [[
                {"source": "https://cu.edu.eg", "university_name": "Cairo University"},
                null
            ]]
        });

        let documents = parse_query_response(&parsed);
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].text, "Cairo University info");
        assert_eq!(documents[0].metadata_str("source"), Some("https://cu.edu.eg"));
        assert!(documents[1].metadata.is_empty());
    }

    #[test]
    fn missing_result_arrays_mean_no_documents() {
        assert!(parse_query_response(&json!({})).is_empty());
        assert!(parse_query_response(&json!({"documents": [[]]})).is_empty());
    }
}
