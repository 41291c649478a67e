//! Shared row <-> domain-type conversions.

use chrono::{DateTime, Utc};
use medifetch_core::{
    Download, DownloadId, DownloadLog, DownloadStatus, EventType, Media, MediaId, MediaKind,
    Provider, Track,
};
use sqlx::{Row, sqlite::SqliteRow};

use medifetch_core::AppError;

pub fn parse_status(s: &str) -> Result<DownloadStatus, AppError> {
    match s {
        "pending" => Ok(DownloadStatus::Pending),
        "in_progress" => Ok(DownloadStatus::InProgress),
        "completed" => Ok(DownloadStatus::Completed),
        "failed" => Ok(DownloadStatus::Failed),
        "cancelled" => Ok(DownloadStatus::Cancelled),
        other => Err(AppError::internal(format!("unknown status in row: {other}"))),
    }
}

pub fn parse_provider(s: &str) -> Result<Provider, AppError> {
    match s {
        "a" => Ok(Provider::A),
        "m" => Ok(Provider::M),
        other => Err(AppError::internal(format!("unknown provider in row: {other}"))),
    }
}

pub fn parse_kind(s: &str) -> Result<MediaKind, AppError> {
    match s {
        "track" => Ok(MediaKind::Track),
        "album" => Ok(MediaKind::Album),
        other => Err(AppError::internal(format!("unknown media kind in row: {other}"))),
    }
}

pub fn parse_event_type(s: &str) -> Result<EventType, AppError> {
    match s {
        "download:enqueued" => Ok(EventType::DownloadEnqueued),
        "download:started" => Ok(EventType::DownloadStarted),
        "download:progress" => Ok(EventType::DownloadProgress),
        "download:completed" => Ok(EventType::DownloadCompleted),
        "download:failed" => Ok(EventType::DownloadFailed),
        "download:cancelled" => Ok(EventType::DownloadCancelled),
        "download:stalled" => Ok(EventType::DownloadStalled),
        "storage:low" => Ok(EventType::StorageLow),
        "metadata:fetching" => Ok(EventType::MetadataFetching),
        "metadata:found" => Ok(EventType::MetadataFound),
        other => Err(AppError::internal(format!("unknown event type in row: {other}"))),
    }
}

pub fn map_download_row(row: &SqliteRow) -> Result<Download, AppError> {
    let status: String = row.try_get("status").map_err(sqlx_err)?;
    let media_id: Option<i64> = row.try_get("media_id").map_err(sqlx_err)?;
    let process_id: Option<i64> = row.try_get("process_id").map_err(sqlx_err)?;

    Ok(Download {
        id: DownloadId(row.try_get("id").map_err(sqlx_err)?),
        url: row.try_get("url").map_err(sqlx_err)?,
        normalized_url: row.try_get("normalized_url").map_err(sqlx_err)?,
        media_id: media_id.map(MediaId),
        status: parse_status(&status)?,
        progress: row.try_get("progress").map_err(sqlx_err)?,
        error_message: row.try_get("error_message").map_err(sqlx_err)?,
        file_path: row.try_get("file_path").map_err(sqlx_err)?,
        #[allow(clippy::cast_sign_loss)]
        process_id: process_id.map(|p| p as u32),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(sqlx_err)?,
        started_at: row
            .try_get::<Option<DateTime<Utc>>, _>("started_at")
            .map_err(sqlx_err)?,
        finished_at: row
            .try_get::<Option<DateTime<Utc>>, _>("finished_at")
            .map_err(sqlx_err)?,
    })
}

pub fn map_media_row(row: &SqliteRow) -> Result<Media, AppError> {
    let provider: String = row.try_get("provider").map_err(sqlx_err)?;
    let kind: String = row.try_get("kind").map_err(sqlx_err)?;
    let tracks_json: Option<String> = row.try_get("tracks").map_err(sqlx_err)?;
    let tracks = tracks_json
        .as_deref()
        .map(serde_json::from_str::<Vec<Track>>)
        .transpose()
        .map_err(|e| AppError::internal(format!("corrupt tracks json: {e}")))?;

    Ok(Media {
        id: MediaId(row.try_get("id").map_err(sqlx_err)?),
        title: row.try_get("title").map_err(sqlx_err)?,
        artist: row.try_get("artist").map_err(sqlx_err)?,
        album: row.try_get("album").map_err(sqlx_err)?,
        album_artist: row.try_get("album_artist").map_err(sqlx_err)?,
        year: row.try_get("year").map_err(sqlx_err)?,
        cover_url: row.try_get("cover_url").map_err(sqlx_err)?,
        duration: row
            .try_get::<Option<i64>, _>("duration")
            .map_err(sqlx_err)?
            .map(|d| d as u32),
        provider: parse_provider(&provider)?,
        provider_id: row.try_get("provider_id").map_err(sqlx_err)?,
        kind: parse_kind(&kind)?,
        tracks,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(sqlx_err)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(sqlx_err)?,
    })
}

pub fn map_log_row(row: &SqliteRow) -> Result<DownloadLog, AppError> {
    let event_type: String = row.try_get("event_type").map_err(sqlx_err)?;
    let metadata: Option<String> = row.try_get("metadata").map_err(sqlx_err)?;
    let metadata = metadata
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(|e| AppError::internal(format!("corrupt log metadata json: {e}")))?;

    Ok(DownloadLog {
        id: row.try_get("id").map_err(sqlx_err)?,
        download_id: DownloadId(row.try_get("download_id").map_err(sqlx_err)?),
        event_type: parse_event_type(&event_type)?,
        message: row.try_get("message").map_err(sqlx_err)?,
        metadata,
        timestamp: row.try_get::<DateTime<Utc>, _>("timestamp").map_err(sqlx_err)?,
    })
}

pub fn sqlx_err(err: sqlx::Error) -> AppError {
    AppError::internal(format!("database error: {err}"))
}
