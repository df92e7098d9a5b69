use crate::openai::OpenAiClient;
use crate::StoreError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1_536;

#[async_trait]
pub trait Embedder {
    fn dimensions(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let payload = self.client.post_json("embeddings", &body).await?;
        let response: EmbeddingResponse = serde_json::from_value(payload)?;

        let embedding = response
            .data
            .into_iter()
            .min_by_key(|item| item.index)
            .map(|item| item.embedding)
            .ok_or_else(|| StoreError::BackendResponse {
                backend: "openai".to_string(),
                details: "embedding response had no data".to_string(),
            })?;

        if embedding.len() != self.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::{Embedder, OpenAiEmbedder, DEFAULT_EMBEDDING_MODEL};
    use crate::openai::OpenAiClient;
    use crate::StoreError;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedding_body(dimensions: usize) -> serde_json::Value {
        json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": vec![0.25_f32; dimensions] }],
            "model": DEFAULT_EMBEDDING_MODEL,
            "usage": { "prompt_tokens": 4, "total_tokens": 4 },
        })
    }

    fn embedder(server: &MockServer, dimensions: usize) -> OpenAiEmbedder {
        let client = OpenAiClient::new(&server.uri(), "sk-test").unwrap();
        OpenAiEmbedder::new(client, DEFAULT_EMBEDDING_MODEL, dimensions)
    }

    #[tokio::test]
    async fn embed_sends_model_and_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": DEFAULT_EMBEDDING_MODEL,
                "input": "claim_id: C-1",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(1_536)))
            .expect(1)
            .mount(&server)
            .await;

        let vector = embedder(&server, 1_536).embed("claim_id: C-1").await.unwrap();
        assert_eq!(vector.len(), 1_536);
        assert!(vector.iter().all(|value| (value - 0.25).abs() < 1e-6));
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(3)))
            .mount(&server)
            .await;

        let error = embedder(&server, 1_536).embed("text").await.unwrap_err();
        assert!(matches!(
            error,
            StoreError::DimensionMismatch {
                expected: 1_536,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn empty_data_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let error = embedder(&server, 4).embed("text").await.unwrap_err();
        assert!(matches!(error, StoreError::BackendResponse { .. }));
    }

    #[tokio::test]
    async fn api_failure_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided.", "code": "invalid_api_key" }
            })))
            .mount(&server)
            .await;

        let error = embedder(&server, 4).embed("text").await.unwrap_err();
        match error {
            StoreError::BackendResponse { backend, details } => {
                assert_eq!(backend, "openai");
                assert!(details.starts_with("401"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
