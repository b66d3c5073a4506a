// Screening API: upload, extract, score, rank, and follow-up downloads/summaries.
// Scoring goes through scoring::Scorer, summaries through summary::SummaryGenerator.

pub mod handlers;
pub mod store;
