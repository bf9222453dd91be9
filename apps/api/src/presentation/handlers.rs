use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::presentation::card::ResumeCard;
use crate::presentation::score_circle::{self, ScoreSize};
use crate::records::RecordStore;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ScoreQuery {
    #[serde(default)]
    pub size: ScoreSize,
}

#[derive(Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeCard>,
}

#[derive(Serialize)]
pub struct WipeResponse {
    pub deleted: usize,
}

async fn find_record(records: &RecordStore, id: Uuid) -> Result<ResumeRecord, AppError> {
    records
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let records = state.records.list_all().await?;
    let resumes = records.iter().map(ResumeCard::from_record).collect();
    Ok(Json(ResumeListResponse { resumes }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    Ok(Json(find_record(&state.records, id).await?))
}

/// GET /api/v1/resumes/:id/image
pub async fn handle_get_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_record(&state.records, id).await?;
    let bytes = state.content.read(&record.image_ref).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// GET /api/v1/resumes/:id/score.svg?size=small|medium|large
pub async fn handle_score_svg(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ScoreQuery>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_record(&state.records, id).await?;
    let score = record.overall_score().ok_or_else(|| {
        AppError::UnprocessableEntity(format!("Resume {id} has no score yet"))
    })?;
    let svg = score_circle::render(i64::from(score), query.size).to_svg();
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// DELETE /api/v1/resumes
pub async fn handle_wipe(State(state): State<AppState>) -> Result<Json<WipeResponse>, AppError> {
    let deleted = state.records.delete_all().await?;
    Ok(Json(WipeResponse { deleted }))
}
