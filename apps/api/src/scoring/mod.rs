//! Scorer — cosine similarity between resume and JD embeddings, scaled to 0–100
//! and ranked.

pub mod export;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::embedding::{Embedding, EmbeddingError, EmbeddingProvider};
use crate::models::document::Document;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("job description has no text to score against")]
    EmptyJobDescription,

    #[error("failed to embed '{filename}': {source}")]
    Embedding {
        filename: String,
        #[source]
        source: EmbeddingError,
    },

    /// Neither text could be re-embedded under the other's model.
    #[error("'{filename}' was embedded with '{resume_model}' but the job description with '{jd_model}'")]
    ModelMismatch {
        filename: String,
        resume_model: String,
        jd_model: String,
    },

    #[error("'{filename}' has a {resume_dim}-dim '{model}' vector but the job description has {jd_dim}")]
    DimensionMismatch {
        filename: String,
        model: String,
        resume_dim: usize,
        jd_dim: usize,
    },
}

/// One ranked resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub filename: String,
    pub score: f64, // 0 – 100, two decimals
    pub text: String,
}

/// Badge bucket for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    High,
    Medium,
    Low,
}

impl MatchBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 75.0 {
            MatchBand::High
        } else if score >= 50.0 {
            MatchBand::Medium
        } else {
            MatchBand::Low
        }
    }
}

/// Aggregate figures over a ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub total: usize,
    pub top_score: f64,
    /// Mean score rounded down to a whole number.
    pub average_score: f64,
}

impl ScoreMetrics {
    pub fn from_results(results: &[ScoreResult]) -> Self {
        let total = results.len();
        let top_score = results.first().map(|r| r.score).unwrap_or(0.0);
        let sum: f64 = results.iter().map(|r| r.score).sum();
        Self {
            total,
            top_score,
            average_score: (sum / total.max(1) as f64).floor(),
        }
    }
}

/// Cosine of the angle between two vectors. Zero-magnitude or
/// different-length inputs give 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Similarity × 100, rounded to two decimal places. Never `-0.0`.
pub fn similarity_to_score(similarity: f32) -> f64 {
    let score = (similarity as f64 * 100.0 * 100.0).round() / 100.0;
    if score == 0.0 {
        0.0
    } else {
        score
    }
}

/// Sorts by score descending. `sort_by` is stable, so ties keep input order.
pub fn rank(results: &mut [ScoreResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[derive(Clone)]
pub struct Scorer {
    provider: Arc<EmbeddingProvider>,
    /// Delay after each remote-scored resume; 0 disables it.
    pacing: Duration,
}

impl Scorer {
    pub fn new(provider: Arc<EmbeddingProvider>, pacing: Duration) -> Self {
        Self { provider, pacing }
    }

    /// Scores a single resume against a JD.
    pub async fn score(&self, resume_text: &str, jd_text: &str) -> Result<f64, ScoringError> {
        if jd_text.trim().is_empty() {
            return Err(ScoringError::EmptyJobDescription);
        }
        if resume_text.trim().is_empty() {
            return Ok(0.0);
        }
        let mut jds = JdEmbeddings::new(self.embed("job description", jd_text).await?);
        self.score_against("resume", resume_text, jd_text, &mut jds)
            .await
    }

    /// Scores every resume against the JD and returns them ranked.
    ///
    /// The JD is embedded once. Blank resumes score 0.0 without an embedding
    /// call. Any embedding failure fails the whole batch.
    pub async fn batch_score(
        &self,
        resumes: &[Document],
        jd_text: &str,
    ) -> Result<Vec<ScoreResult>, ScoringError> {
        if jd_text.trim().is_empty() {
            return Err(ScoringError::EmptyJobDescription);
        }

        let mut jds = JdEmbeddings::new(self.embed("job description", jd_text).await?);
        let pace = self.provider.has_remote() && !self.pacing.is_zero();

        let mut results = Vec::with_capacity(resumes.len());
        for doc in resumes {
            if doc.is_blank() {
                debug!("'{}' has no text, scoring 0", doc.filename);
                results.push(ScoreResult {
                    filename: doc.filename.clone(),
                    score: 0.0,
                    text: doc.text.clone(),
                });
                continue;
            }

            let score = self
                .score_against(&doc.filename, &doc.text, jd_text, &mut jds)
                .await?;
            results.push(ScoreResult {
                filename: doc.filename.clone(),
                score,
                text: doc.text.clone(),
            });

            if pace {
                tokio::time::sleep(self.pacing).await;
            }
        }

        rank(&mut results);
        info!(
            "Scored {} resumes with '{}' (top: {})",
            results.len(),
            jds.first_model,
            results.first().map(|r| r.score).unwrap_or(0.0)
        );
        Ok(results)
    }

    /// Scores one resume, comparing vectors from the same model only.
    ///
    /// When the primary fails for some texts but not others, the resume and the
    /// JD come back from different models. The JD is then embedded under the
    /// resume's model (once per model per batch); failing that, the resume is
    /// embedded under a model the JD already has.
    async fn score_against(
        &self,
        filename: &str,
        text: &str,
        jd_text: &str,
        jds: &mut JdEmbeddings,
    ) -> Result<f64, ScoringError> {
        let resume = self.embed(filename, text).await?;

        if !jds.by_model.contains_key(&resume.model) {
            match self.provider.get_embedding_from(&resume.model, jd_text).await {
                Ok(jd) => {
                    debug!("Re-embedded job description with '{}' for '{filename}'", jd.model);
                    jds.by_model.insert(jd.model.clone(), jd);
                }
                Err(e) => warn!(
                    "Could not embed job description with '{}' for '{filename}': {e}",
                    resume.model
                ),
            }
        }
        if let Some(jd) = jds.by_model.get(&resume.model) {
            return compare(filename, &resume, jd);
        }

        for (model, jd) in &jds.by_model {
            match self.provider.get_embedding_from(model, text).await {
                Ok(resume) => return compare(filename, &resume, jd),
                Err(e) => warn!("Could not re-embed '{filename}' with '{model}': {e}"),
            }
        }

        Err(ScoringError::ModelMismatch {
            filename: filename.to_string(),
            resume_model: resume.model,
            jd_model: jds.first_model.clone(),
        })
    }

    async fn embed(&self, filename: &str, text: &str) -> Result<Embedding, ScoringError> {
        self.provider
            .get_embedding(text)
            .await
            .map_err(|source| ScoringError::Embedding {
                filename: filename.to_string(),
                source,
            })
    }
}

/// The JD's vector under each model seen so far in one scoring run.
struct JdEmbeddings {
    first_model: String,
    by_model: HashMap<String, Embedding>,
}

impl JdEmbeddings {
    fn new(jd: Embedding) -> Self {
        Self {
            first_model: jd.model.clone(),
            by_model: HashMap::from([(jd.model.clone(), jd)]),
        }
    }
}

fn compare(filename: &str, resume: &Embedding, jd: &Embedding) -> Result<f64, ScoringError> {
    if resume.vector.len() != jd.vector.len() {
        return Err(ScoringError::DimensionMismatch {
            filename: filename.to_string(),
            model: resume.model.clone(),
            resume_dim: resume.vector.len(),
            jd_dim: jd.vector.len(),
        });
    }
    Ok(similarity_to_score(cosine_similarity(
        &resume.vector,
        &jd.vector,
    )))
}
