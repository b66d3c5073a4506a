use std::sync::Arc;

use tracing::{debug, warn};

use crate::embedding::{
    BackendError, Embedding, EmbeddingBackend, EmbeddingCache, EmbeddingError,
};

/// Cache-fronted embedding source with an optional remote primary and an
/// always-present local fallback.
///
/// Lookup order for a text:
/// 1. primary model's cache entry, then the primary backend (if configured)
/// 2. fallback model's cache entry, then the fallback backend
///
/// Each vector is cached under the model that produced it. A primary failure is
/// logged and absorbed; a fallback failure is returned as `EmbeddingError::Unavailable`.
pub struct EmbeddingProvider {
    cache: EmbeddingCache,
    primary: Option<Arc<dyn EmbeddingBackend>>,
    fallback: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingProvider {
    pub fn new(
        cache: EmbeddingCache,
        primary: Option<Arc<dyn EmbeddingBackend>>,
        fallback: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            cache,
            primary,
            fallback,
        }
    }

    /// True when a remote primary backend is configured.
    pub fn has_remote(&self) -> bool {
        self.primary.is_some()
    }

    pub fn primary_model(&self) -> Option<&str> {
        self.primary.as_ref().map(|b| b.model_id())
    }

    pub fn fallback_model(&self) -> &str {
        self.fallback.model_id()
    }

    /// Embeds `text`, consulting the cache before each backend.
    pub async fn get_embedding(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        if let Some(primary) = &self.primary {
            match self.cached_or_embed(primary.as_ref(), text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) => warn!(
                    "Primary embedding backend '{}' failed, using local fallback: {e}",
                    primary.model_id()
                ),
            }
        }

        self.cached_or_embed(self.fallback.as_ref(), text)
            .await
            .map_err(EmbeddingError::Unavailable)
    }

    /// Embeds `text` with the backend serving `model` only, without falling
    /// back. Used to bring a second text onto the model of an earlier vector.
    pub async fn get_embedding_from(
        &self,
        model: &str,
        text: &str,
    ) -> Result<Embedding, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let backend = self
            .primary
            .iter()
            .chain(std::iter::once(&self.fallback))
            .find(|b| b.model_id() == model)
            .ok_or_else(|| EmbeddingError::UnknownModel(model.to_string()))?;

        self.cached_or_embed(backend.as_ref(), text)
            .await
            .map_err(EmbeddingError::Unavailable)
    }

    async fn cached_or_embed(
        &self,
        backend: &dyn EmbeddingBackend,
        text: &str,
    ) -> Result<Embedding, BackendError> {
        let model = backend.model_id();

        if let Some(vector) = self.cache.load(model, text).await {
            return Ok(Embedding {
                model: model.to_string(),
                vector,
            });
        }

        let vector = backend.embed(text).await?;
        if vector.is_empty() {
            return Err(BackendError::EmptyVector);
        }
        debug!("Embedded {} chars with '{model}' (dim {})", text.len(), vector.len());

        // A failed write only costs a recomputation next time.
        if let Err(e) = self.cache.store(model, text, &vector).await {
            warn!("Failed to write embedding cache entry for '{model}': {e}");
        }

        Ok(Embedding {
            model: model.to_string(),
            vector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::CountingBackend;
    use tempfile::TempDir;

    fn provider(
        dir: &TempDir,
        primary: Option<Arc<CountingBackend>>,
        fallback: Arc<CountingBackend>,
    ) -> EmbeddingProvider {
        EmbeddingProvider::new(
            EmbeddingCache::open(dir.path()).unwrap(),
            primary.map(|p| p as Arc<dyn EmbeddingBackend>),
            fallback,
        )
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let primary = Arc::new(CountingBackend::new("remote-model"));
        let fallback = Arc::new(CountingBackend::new("local-model"));
        let provider = provider(&dir, Some(primary.clone()), fallback.clone());

        let first = provider.get_embedding("Rust, Tokio, Axum").await.unwrap();
        let second = provider.get_embedding("Rust, Tokio, Axum").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.model, "remote-model");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_and_caches_under_fallback_model() {
        let dir = TempDir::new().unwrap();
        let primary = Arc::new(CountingBackend::failing("remote-model"));
        let fallback = Arc::new(CountingBackend::new("local-model"));
        let provider = provider(&dir, Some(primary.clone()), fallback.clone());

        let embedding = provider.get_embedding("Go and Kubernetes").await.unwrap();

        assert_eq!(embedding.model, "local-model");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);

        let cache = EmbeddingCache::open(dir.path()).unwrap();
        assert!(cache.load("local-model", "Go and Kubernetes").await.is_some());
        assert!(cache.load("remote-model", "Go and Kubernetes").await.is_none());
    }

    #[tokio::test]
    async fn test_primary_vector_not_cached_under_fallback_model() {
        let dir = TempDir::new().unwrap();
        let primary = Arc::new(CountingBackend::new("remote-model"));
        let fallback = Arc::new(CountingBackend::new("local-model"));
        let provider = provider(&dir, Some(primary), fallback);

        provider.get_embedding("Python").await.unwrap();

        let cache = EmbeddingCache::open(dir.path()).unwrap();
        assert!(cache.load("remote-model", "Python").await.is_some());
        assert!(cache.load("local-model", "Python").await.is_none());
    }

    #[tokio::test]
    async fn test_total_failure_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let primary = Arc::new(CountingBackend::failing("remote-model"));
        let fallback = Arc::new(CountingBackend::failing("local-model"));
        let provider = provider(&dir, Some(primary), fallback);

        let err = provider.get_embedding("anything").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_local_only_mode_hits_cache_on_repeat() {
        let dir = TempDir::new().unwrap();
        let fallback = Arc::new(CountingBackend::new("local-model"));
        let provider = provider(&dir, None, fallback.clone());

        assert!(!provider.has_remote());
        let first = provider.get_embedding("SQL").await.unwrap();
        let second = provider.get_embedding("SQL").await.unwrap();

        assert_eq!(first.vector, second.vector);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_never_reaches_a_backend() {
        let dir = TempDir::new().unwrap();
        let fallback = Arc::new(CountingBackend::new("local-model"));
        let provider = provider(&dir, None, fallback.clone());

        let err = provider.get_embedding("   \n").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyText));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_survives_provider_restart() {
        let dir = TempDir::new().unwrap();
        let first_run = Arc::new(CountingBackend::new("local-model"));
        let v1 = provider(&dir, None, first_run.clone())
            .get_embedding("Docker")
            .await
            .unwrap();

        let second_run = Arc::new(CountingBackend::new("local-model"));
        let v2 = provider(&dir, None, second_run.clone())
            .get_embedding("Docker")
            .await
            .unwrap();

        assert_eq!(v1, v2);
        assert_eq!(second_run.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_embedding_from_targets_one_model_without_fallback() {
        let dir = TempDir::new().unwrap();
        let primary = Arc::new(CountingBackend::new("remote-model").fail_on("Go"));
        let fallback = Arc::new(CountingBackend::new("local-model"));
        let provider = provider(&dir, Some(primary.clone()), fallback.clone());

        let local = provider.get_embedding_from("local-model", "Go").await.unwrap();
        assert_eq!(local.model, "local-model");
        assert_eq!(primary.calls(), 0);

        let err = provider.get_embedding_from("remote-model", "Go").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable(_)));
        assert_eq!(fallback.calls(), 1);

        let err = provider.get_embedding_from("other", "Go").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::UnknownModel(m) if m == "other"));
    }
}
