//! `/api/downloads` handlers.

use axum::extract::{Path, Query, State};
use axum::Json;

use medifetch_core::DownloadId;

use crate::dto::{
    DownloadStatusResponse, EnqueueRequest, EnqueueResponse, ListDownloadsQuery,
    ListDownloadsResponse, LogsQuery, LogsResponse, MoveResponse, SuccessResponse,
};
use crate::error::HttpError;
use crate::state::AppState;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_LOG_LIMIT: u32 = 50;

pub async fn enqueue(
    State(state): State<AppState>,
    Json(req): Json<EnqueueRequest>,
) -> Result<(axum::http::StatusCode, Json<EnqueueResponse>), HttpError> {
    let result = state.service.enqueue(&req.url).await?;
    Ok((axum::http::StatusCode::CREATED, Json(result.into())))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DownloadStatusResponse>, HttpError> {
    let view = state.service.get_download_status(DownloadId(id)).await?;
    Ok(Json(view.into()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListDownloadsQuery>,
) -> Result<Json<ListDownloadsResponse>, HttpError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let page_result = state.service.list_downloads(query.status, page, page_size).await?;
    Ok(Json(page_result.into()))
}

pub async fn logs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, HttpError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let page_result = state.service.get_download_logs(DownloadId(id), page, limit).await?;
    Ok(Json(page_result.into()))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, HttpError> {
    state.service.cancel_download(DownloadId(id)).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, HttpError> {
    state.service.retry_download(DownloadId(id)).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn move_to_destination(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MoveResponse>, HttpError> {
    let result = state.service.move_to_destination(DownloadId(id)).await?;
    Ok(Json(MoveResponse {
        success: true,
        dest_path: result.dest_path,
    }))
}
