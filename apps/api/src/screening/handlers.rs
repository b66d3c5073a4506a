//! Axum route handlers for the Screening API.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{extract_text_blocking, DocumentKind};
use crate::models::document::{upsert_document, Document};
use crate::models::screening::{empty_text_warning, truncate_chars, Screening, ScreeningResponse};
use crate::scoring::export::results_to_csv;
use crate::scoring::ScoreResult;
use crate::state::AppState;
use crate::summary::SummaryOutcome;

const JD_FIELD: &str = "job_description";
const RESUMES_FIELD: &str = "resumes";
const EXTRACT_FIELD: &str = "file";
const EXTRACT_PREVIEW_CHARS: usize = 2000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub filename: String,
    pub kind: DocumentKind,
    pub chars: usize,
    pub preview: String,
    pub text: String,
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub jd_text: String,
    pub resumes: Vec<Document>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub results: Vec<ScoreResult>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub jd_text: String,
    pub resume_text: String,
}

struct Upload {
    filename: String,
    bytes: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/extract
///
/// Extracts text from one uploaded file, for previewing a JD before scoring.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let mut upload = None;
    while let Some((field, file)) = next_upload(&mut multipart).await? {
        if field == EXTRACT_FIELD {
            upload = Some(file);
        }
    }
    let upload =
        upload.ok_or_else(|| AppError::Validation(format!("Missing '{EXTRACT_FIELD}' file")))?;

    let kind = DocumentKind::from_filename(&upload.filename);
    let text = extract_text_blocking(upload.filename.clone(), upload.bytes).await;
    let warning = text
        .trim()
        .is_empty()
        .then(|| empty_text_warning(&upload.filename));

    Ok(Json(ExtractResponse {
        chars: text.chars().count(),
        preview: truncate_chars(&text, EXTRACT_PREVIEW_CHARS),
        filename: upload.filename,
        kind,
        text,
        warning,
    }))
}

/// POST /api/v1/screenings
///
/// Multipart upload of one `job_description` and one or more `resumes`.
/// Extracts, scores, ranks, and stores the result for follow-up requests.
pub async fn handle_create_screening(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningResponse>, AppError> {
    let mut jd_upload = None;
    let mut resume_uploads = Vec::new();
    while let Some((field, file)) = next_upload(&mut multipart).await? {
        match field.as_str() {
            JD_FIELD => jd_upload = Some(file),
            RESUMES_FIELD => resume_uploads.push(file),
            _ => {}
        }
    }

    let jd_upload = match jd_upload {
        Some(jd) if !resume_uploads.is_empty() => jd,
        _ => return Err(AppError::Validation("Upload JD + at least 1 resume".to_string())),
    };

    let mut warnings = Vec::new();

    let jd_text = extract_text_blocking(jd_upload.filename.clone(), jd_upload.bytes).await;
    let jd = Document::new(jd_upload.filename, jd_text);
    if jd.is_blank() {
        return Err(AppError::UnprocessableEntity(format!(
            "Job description '{}' parsed as empty (scanned PDF?); use a text JD",
            jd.filename
        )));
    }

    let mut resumes: Vec<Document> = Vec::with_capacity(resume_uploads.len());
    for upload in resume_uploads {
        let text = extract_text_blocking(upload.filename.clone(), upload.bytes).await;
        upsert_document(&mut resumes, Document::new(upload.filename, text));
    }
    warnings.extend(
        resumes
            .iter()
            .filter(|d| d.is_blank())
            .map(|d| empty_text_warning(&d.filename)),
    );

    let results = state.scorer.batch_score(&resumes, &jd.text).await?;
    let screening = state
        .screenings
        .insert(Screening::new(jd, results, warnings))
        .await;

    info!(
        "Screening {} ranked {} resumes (top score {})",
        screening.id, screening.metrics.total, screening.metrics.top_score
    );

    Ok(Json(ScreeningResponse::from(screening.as_ref())))
}

/// GET /api/v1/screenings/:id
pub async fn handle_get_screening(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScreeningResponse>, AppError> {
    let screening = find_screening(&state, id).await?;
    Ok(Json(ScreeningResponse::from(screening.as_ref())))
}

/// GET /api/v1/screenings/:id/results.csv
pub async fn handle_results_csv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let screening = find_screening(&state, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"results.csv\"".to_string(),
            ),
        ],
        results_to_csv(&screening.results),
    ))
}

/// GET /api/v1/screenings/:id/resumes/:filename
///
/// The extracted text of one resume as a `<filename>.txt` download.
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path((id, filename)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let screening = find_screening(&state, id).await?;
    let result = find_result(&screening, &filename)?;
    let download_name = format!("{}.txt", result.filename).replace('"', "'");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{download_name}\""),
            ),
        ],
        result.text.clone(),
    ))
}

/// POST /api/v1/screenings/:id/resumes/:filename/summary
pub async fn handle_screening_summary(
    State(state): State<AppState>,
    Path((id, filename)): Path<(Uuid, String)>,
) -> Result<Json<SummaryOutcome>, AppError> {
    let screening = find_screening(&state, id).await?;
    let result = find_result(&screening, &filename)?;
    let outcome = state
        .summarizer
        .generate_summary(&screening.job_description.text, &result.text)
        .await;
    Ok(Json(outcome))
}

/// POST /api/v1/score
///
/// Scores already-extracted texts. Nothing is stored. Repeated filenames are
/// merged the same way as repeated uploads.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let mut resumes: Vec<Document> = Vec::with_capacity(request.resumes.len());
    for doc in request.resumes {
        upsert_document(&mut resumes, doc);
    }

    let results = match resumes.as_slice() {
        [] => return Err(AppError::Validation("resumes cannot be empty".to_string())),
        [only] => {
            let score = state.scorer.score(&only.text, &request.jd_text).await?;
            vec![ScoreResult {
                filename: only.filename.clone(),
                score,
                text: only.text.clone(),
            }]
        }
        many => state.scorer.batch_score(many, &request.jd_text).await?,
    };
    Ok(Json(ScoreResponse { results }))
}

/// POST /api/v1/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryOutcome>, AppError> {
    let outcome = state
        .summarizer
        .generate_summary(&request.jd_text, &request.resume_text)
        .await;
    Ok(Json(outcome))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads the next file part as (field name, upload). Parts without a filename are skipped.
async fn next_upload(multipart: &mut Multipart) -> Result<Option<(String, Upload)>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(filename) = field.file_name().map(base_name) else {
            continue;
        };
        let bytes = field.bytes().await?;
        return Ok(Some((name, Upload { filename, bytes })));
    }
    Ok(None)
}

/// Drops any client-side directory components and control characters from an
/// uploaded filename. The result ends up in a `Content-Disposition` header.
fn base_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

async fn find_screening(
    state: &AppState,
    id: Uuid,
) -> Result<std::sync::Arc<Screening>, AppError> {
    state
        .screenings
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Screening {id} not found")))
}

fn find_result<'a>(screening: &'a Screening, filename: &str) -> Result<&'a ScoreResult, AppError> {
    screening.result(filename).ok_or_else(|| {
        AppError::NotFound(format!(
            "Resume '{filename}' not found in screening {}",
            screening.id
        ))
    })
}
