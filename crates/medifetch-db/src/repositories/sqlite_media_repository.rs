//! `SQLite` implementation of the `MediaRepository` port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use medifetch_core::{AppError, Media, MediaFields, MediaId, NewMedia, Provider};

use super::row_mappers::{map_media_row, sqlx_err};

/// `SQLite` implementation of the `MediaRepository` port.
pub struct SqliteMediaRepository {
    pool: SqlitePool,
}

impl SqliteMediaRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl medifetch_core::MediaRepository for SqliteMediaRepository {
    async fn find_by_id(&self, id: MediaId) -> Result<Option<Media>, AppError> {
        let row = sqlx::query("SELECT * FROM media WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_err)?;
        row.as_ref().map(map_media_row).transpose()
    }

    async fn find_by_provider_and_provider_id(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<Media>, AppError> {
        if provider_id.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query("SELECT * FROM media WHERE provider = ? AND provider_id = ?")
            .bind(provider.as_str())
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_err)?;
        row.as_ref().map(map_media_row).transpose()
    }

    async fn find_all(&self, page: u32, page_size: u32) -> Result<Vec<Media>, AppError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = sqlx::query("SELECT * FROM media ORDER BY created_at DESC LIMIT ? OFFSET ?")
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(sqlx_err)?;
        rows.iter().map(map_media_row).collect()
    }

    async fn count_all(&self) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM media")
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_err)?;
        let n: i64 = row.try_get("n").map_err(sqlx_err)?;
        Ok(n as u64)
    }

    async fn find_orphaned(&self) -> Result<Vec<Media>, AppError> {
        let rows = sqlx::query(
            "SELECT * FROM media WHERE id NOT IN \
             (SELECT media_id FROM downloads WHERE media_id IS NOT NULL)",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_err)?;
        rows.iter().map(map_media_row).collect()
    }

    async fn create(&self, data: NewMedia) -> Result<Media, AppError> {
        let now = Utc::now();
        let tracks_json = data
            .tracks
            .as_ref()
            .map(|t| serde_json::to_string(t).unwrap_or_default());

        let result = sqlx::query(
            "INSERT INTO media \
             (title, artist, album, album_artist, year, cover_url, duration, \
              provider, provider_id, kind, tracks, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&data.title)
        .bind(&data.artist)
        .bind(&data.album)
        .bind(&data.album_artist)
        .bind(data.year)
        .bind(&data.cover_url)
        .bind(data.duration.map(i64::from))
        .bind(data.provider.as_str())
        .bind(&data.provider_id)
        .bind(data.kind.to_string())
        .bind(&tracks_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(sqlx_err)?;

        let id = MediaId(result.last_insert_rowid());
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("media vanished immediately after insert"))
    }

    async fn update_metadata(&self, id: MediaId, fields: MediaFields) -> Result<(), AppError> {
        if fields.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "UPDATE media SET \
             title = COALESCE(?, title), \
             artist = COALESCE(?, artist), \
             album = COALESCE(?, album), \
             album_artist = COALESCE(?, album_artist), \
             year = COALESCE(?, year), \
             updated_at = ? \
             WHERE id = ?",
        )
        .bind(&fields.title)
        .bind(&fields.artist)
        .bind(&fields.album)
        .bind(&fields.album_artist)
        .bind(fields.year)
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(sqlx_err)?;
        Ok(())
    }

    async fn delete(&self, id: MediaId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM media")
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }
}
