use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::document::Document;
use crate::scoring::{MatchBand, ScoreMetrics, ScoreResult};

const JD_PREVIEW_CHARS: usize = 2000;
const RESUME_PREVIEW_CHARS: usize = 300;

/// One scoring run, kept in memory so summaries and downloads can refer back to it.
#[derive(Debug, Clone)]
pub struct Screening {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub job_description: Document,
    /// Ranked, best first.
    pub results: Vec<ScoreResult>,
    pub metrics: ScoreMetrics,
    pub warnings: Vec<String>,
}

impl Screening {
    pub fn new(job_description: Document, results: Vec<ScoreResult>, warnings: Vec<String>) -> Self {
        let metrics = ScoreMetrics::from_results(&results);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            job_description,
            results,
            metrics,
            warnings,
        }
    }

    pub fn result(&self, filename: &str) -> Option<&ScoreResult> {
        self.results.iter().find(|r| r.filename == filename)
    }
}

#[derive(Debug, Serialize)]
pub struct JobDescriptionView {
    pub filename: String,
    pub chars: usize,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct CandidateView {
    pub filename: String,
    pub score: f64,
    pub match_band: MatchBand,
    pub preview: String,
    pub chars: usize,
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScreeningResponse {
    pub screening_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub job_description: JobDescriptionView,
    pub metrics: ScoreMetrics,
    pub candidates: Vec<CandidateView>,
    pub warnings: Vec<String>,
}

impl From<&Screening> for ScreeningResponse {
    fn from(s: &Screening) -> Self {
        ScreeningResponse {
            screening_id: s.id,
            created_at: s.created_at,
            job_description: JobDescriptionView {
                filename: s.job_description.filename.clone(),
                chars: s.job_description.text.chars().count(),
                preview: truncate_chars(&s.job_description.text, JD_PREVIEW_CHARS),
            },
            metrics: s.metrics.clone(),
            candidates: s.results.iter().map(CandidateView::from).collect(),
            warnings: s.warnings.clone(),
        }
    }
}

impl From<&ScoreResult> for CandidateView {
    fn from(r: &ScoreResult) -> Self {
        let chars = r.text.chars().count();
        let mut preview = truncate_chars(&r.text, RESUME_PREVIEW_CHARS);
        if chars > RESUME_PREVIEW_CHARS {
            preview.push_str("...");
        }
        CandidateView {
            filename: r.filename.clone(),
            score: r.score,
            match_band: MatchBand::for_score(r.score),
            preview,
            chars,
            warning: r
                .text
                .trim()
                .is_empty()
                .then(|| empty_text_warning(&r.filename)),
        }
    }
}

pub fn empty_text_warning(filename: &str) -> String {
    format!("No text could be extracted from '{filename}' (scanned PDF or unsupported format?)")
}

/// First `max` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
