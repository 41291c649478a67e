//! `/api/downloads/media/{id}` handlers.

use axum::extract::{Path, State};
use axum::Json;

use medifetch_core::{AppError, MediaId};

use crate::dto::{MediaPatchRequest, MediaResponse, SuccessResponse};
use crate::error::HttpError;
use crate::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MediaResponse>, HttpError> {
    let media = state.service.get_media_details(MediaId(id)).await?;
    Ok(Json(MediaResponse { media }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MediaPatchRequest>,
) -> Result<Json<SuccessResponse>, HttpError> {
    if let Some(field) = req.immutable_field_attempted() {
        return Err(HttpError(AppError::immutable_field(field)));
    }
    state.service.update_media_metadata(MediaId(id), req.fields).await?;
    Ok(Json(SuccessResponse::ok()))
}
