//! Local fallback backends. Both run in-process with no network access.
//!
//! With the `local-embeddings` feature the fallback is all-MiniLM-L6-v2 via
//! fastembed (ONNX). Without it, a hashed bag-of-words embedder stands in: it is
//! deterministic and gives overlapping vocabularies a positive cosine similarity.

use std::sync::Arc;

use async_trait::async_trait;
use fxhash::hash64;
use tracing::info;

use crate::embedding::{BackendError, EmbeddingBackend};

pub const HASHED_BOW_MODEL: &str = "hashed-bow-384";
const HASHED_BOW_DIM: usize = 384;

/// Builds the local backend once at startup. The returned handle is shared by reference.
pub fn build_local_backend() -> anyhow::Result<Arc<dyn EmbeddingBackend>> {
    #[cfg(feature = "local-embeddings")]
    {
        let backend = fastembed_backend::FastEmbedBackend::load()?;
        info!("Local embedding model loaded: {}", backend.model_id());
        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "local-embeddings"))]
    {
        info!("Local embedding fallback: {HASHED_BOW_MODEL}");
        Ok(Arc::new(HashedBowBackend::default()))
    }
}

/// Feature-hashed bag of words: lowercase alphanumeric tokens, sublinear term
/// frequency, L2-normalised. All components are non-negative.
pub struct HashedBowBackend {
    dim: usize,
}

impl Default for HashedBowBackend {
    fn default() -> Self {
        Self {
            dim: HASHED_BOW_DIM,
        }
    }
}

impl HashedBowBackend {
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut counts = vec![0u32; self.dim];
        for token in tokens(text) {
            let bucket = (hash64(token.as_bytes()) % self.dim as u64) as usize;
            counts[bucket] += 1;
        }

        let mut vector: Vec<f32> = counts
            .into_iter()
            .map(|c| if c == 0 { 0.0 } else { 1.0 + (c as f32).ln() })
            .collect();

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingBackend for HashedBowBackend {
    fn model_id(&self) -> &str {
        HASHED_BOW_MODEL
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        Ok(self.embed_sync(text))
    }
}

// `+` and `#` stay inside tokens so "c++" and "c#" survive.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(feature = "local-embeddings")]
mod fastembed_backend {
    use std::sync::Arc;

    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    use crate::embedding::{BackendError, EmbeddingBackend};

    pub const MINILM_MODEL: &str = "all-MiniLM-L6-v2";

    pub struct FastEmbedBackend {
        model: Arc<TextEmbedding>,
    }

    impl FastEmbedBackend {
        pub fn load() -> anyhow::Result<Self> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
            )?;
            Ok(Self {
                model: Arc::new(model),
            })
        }
    }

    #[async_trait]
    impl EmbeddingBackend for FastEmbedBackend {
        fn model_id(&self) -> &str {
            MINILM_MODEL
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
            let model = Arc::clone(&self.model);
            let input = text.to_string();
            let mut batch = tokio::task::spawn_blocking(move || model.embed(vec![input], None))
                .await
                .map_err(|e| BackendError::Local(e.to_string()))?
                .map_err(|e| BackendError::Local(e.to_string()))?;
            batch.pop().ok_or(BackendError::EmptyVector)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::cosine_similarity;

    #[test]
    fn test_hashed_bow_is_deterministic() {
        let backend = HashedBowBackend::default();
        assert_eq!(
            backend.embed_sync("Go, Kubernetes, Docker"),
            backend.embed_sync("Go, Kubernetes, Docker")
        );
    }

    #[test]
    fn test_hashed_bow_is_unit_length() {
        let v = HashedBowBackend::default().embed_sync("Senior Rust engineer");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert_eq!(v.len(), 384);
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn test_hashed_bow_ignores_case_and_punctuation() {
        let backend = HashedBowBackend::default();
        assert_eq!(
            backend.embed_sync("Kubernetes, GO."),
            backend.embed_sync("kubernetes go")
        );
    }

    #[test]
    fn test_shared_vocabulary_gives_positive_similarity() {
        let backend = HashedBowBackend::default();
        let jd = backend.embed_sync("Senior backend engineer with Go and Kubernetes experience");
        let resume = backend.embed_sync("5 years Go, Kubernetes, Docker");
        assert!(cosine_similarity(&jd, &resume) > 0.0);
    }

    #[test]
    fn test_tokens_keep_language_symbols() {
        let toks: Vec<String> = tokens("C++ and C# (SQL)").collect();
        assert_eq!(toks, vec!["c++", "and", "c#", "sql"]);
    }

    #[tokio::test]
    async fn test_build_local_backend_reports_model() {
        let backend = build_local_backend().unwrap();
        assert!(!backend.model_id().is_empty());
    }
}
