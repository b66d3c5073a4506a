use async_trait::async_trait;

use crate::embedding::{BackendError, EmbeddingBackend};
use crate::llm_client::LlmClient;

/// Primary backend: the OpenAI-compatible `/embeddings` endpoint.
pub struct RemoteEmbeddingBackend {
    llm: LlmClient,
    model: String,
}

impl RemoteEmbeddingBackend {
    pub fn new(llm: LlmClient, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for RemoteEmbeddingBackend {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let vector = self.llm.embed(&self.model, text).await?;
        if vector.is_empty() {
            return Err(BackendError::EmptyVector);
        }
        Ok(vector)
    }
}
