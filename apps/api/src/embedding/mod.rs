//! Embedding Provider — text → vector, with a remote primary backend, a local
//! fallback backend and a content-addressed disk cache in front of both.
//!
//! Backends are chosen at startup and injected; every backend call returns a
//! typed `BackendError` so the fallback decision lives in `EmbeddingProvider`.

pub mod cache;
pub mod local;
pub mod provider;
pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm_client::LlmError;

pub use cache::EmbeddingCache;
pub use provider::EmbeddingProvider;

/// A vector tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub model: String,
    pub vector: Vec<f32>,
}

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("remote embedding call failed: {0}")]
    Remote(#[from] LlmError),

    #[error("local embedding model failed: {0}")]
    Local(String),

    #[error("backend returned an empty vector")]
    EmptyVector,
}

/// Failure of the provider as a whole, after fallback.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("cannot embed empty text")]
    EmptyText,

    #[error("no embedding method available: {0}")]
    Unavailable(#[source] BackendError),

    #[error("no configured backend serves model '{0}'")]
    UnknownModel(String),
}

/// One way of turning text into a vector.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Identifier of the model behind this backend; part of every cache key.
    fn model_id(&self) -> &str;

    /// Embeds a single non-empty text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;
}
