//! Content-addressed on-disk embedding cache.
//!
//! One file per (model, text) pair, named `<sha256(model|text)>.f32` and holding
//! the vector as little-endian `f32`s. Entries are never evicted, so the
//! directory grows without bound.
//!
//! Writes land in a temp file inside the cache directory and are renamed into
//! place. Two writers racing on one key both write identical bytes and the last
//! rename wins; writers on different keys never touch the same file.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

const CACHE_FILE_EXTENSION: &str = "f32";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache write task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    dir: PathBuf,
}

impl EmbeddingCache {
    /// Opens (creating if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lowercase hex SHA-256 of `model + "|" + text`.
    pub fn cache_key(model: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b"|");
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{CACHE_FILE_EXTENSION}"))
    }

    /// Returns the cached vector, or `None` on a miss. Unreadable or corrupt
    /// entries count as misses.
    pub async fn load(&self, model: &str, text: &str) -> Option<Vec<f32>> {
        let key = Self::cache_key(model, text);
        let path = self.path_for(&key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Embedding cache miss: model={model} key={key}");
                return None;
            }
            Err(e) => {
                warn!("Failed to read embedding cache entry {}: {e}", path.display());
                return None;
            }
        };

        match decode_vector(&bytes) {
            Some(vector) => {
                debug!("Embedding cache hit: model={model} key={key}");
                Some(vector)
            }
            None => {
                warn!(
                    "Ignoring corrupt embedding cache entry {} ({} bytes)",
                    path.display(),
                    bytes.len()
                );
                None
            }
        }
    }

    /// Persists a vector under the key for (model, text).
    pub async fn store(&self, model: &str, text: &str, vector: &[f32]) -> Result<(), CacheError> {
        let path = self.path_for(&Self::cache_key(model, text));
        let dir = self.dir.clone();
        let bytes = encode_vector(vector);

        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await??;

        Ok(())
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}
