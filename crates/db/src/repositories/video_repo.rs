//! Repository for the `videos` table.
//!
//! Every mutation after creation is guarded by `status_id = processing`, so
//! a job that reached a terminal state is never written again.

use sqlx::PgPool;
use reel_core::types::{DbId, Timestamp, VideoId};

use crate::models::status::VideoStatus;
use crate::models::video::{NewVideo, Video};

/// Column list for `videos` queries.
const COLUMNS: &str = "\
    id, owner_id, status_id, title, video_url, thumbnail_url, duration_seconds, \
    error_text, processing_status_text, created_at, updated_at, completed_at";

pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new job in `processing` inside an open transaction.
    pub async fn create_processing(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewVideo,
        status_text: &str,
    ) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (id, owner_id, status_id, title, processing_status_text) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(input.id)
            .bind(input.owner_id)
            .bind(VideoStatus::Processing.id())
            .bind(&input.title)
            .bind(status_text)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn exists(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: VideoId,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }

    pub async fn find_by_id(pool: &PgPool, id: VideoId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update the human-readable progress line.
    pub async fn set_progress(
        pool: &PgPool,
        id: VideoId,
        status_text: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET processing_status_text = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(status_text)
        .bind(VideoStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Publish a playable URL while the job is still running.
    pub async fn publish_interim(
        pool: &PgPool,
        id: VideoId,
        video_url: &str,
        status_text: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET video_url = $2, processing_status_text = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(video_url)
        .bind(status_text)
        .bind(VideoStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a processing job to `completed` with its final URL.
    pub async fn complete(
        pool: &PgPool,
        id: VideoId,
        video_url: &str,
        thumbnail_url: Option<&str>,
        duration_seconds: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos \
             SET status_id = $2, video_url = $3, thumbnail_url = $4, duration_seconds = $5, \
                 processing_status_text = NULL, error_text = NULL, \
                 completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = $6",
        )
        .bind(id)
        .bind(VideoStatus::Completed.id())
        .bind(video_url)
        .bind(thumbnail_url)
        .bind(duration_seconds)
        .bind(VideoStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a processing job to `failed`. Any interim URL is cleared.
    pub async fn fail(pool: &PgPool, id: VideoId, error_text: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos \
             SET status_id = $2, error_text = $3, video_url = NULL, \
                 processing_status_text = NULL, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(VideoStatus::Failed.id())
        .bind(error_text)
        .bind(VideoStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fail every processing job whose claimed, unfinished task last
    /// reported progress before `stale_before`, and close those tasks.
    /// Returns the ids that were failed.
    pub async fn fail_stale(
        pool: &PgPool,
        stale_before: Timestamp,
        error_text: &str,
    ) -> Result<Vec<VideoId>, sqlx::Error> {
        let rows: Vec<(VideoId,)> = sqlx::query_as(
            "WITH stale AS ( \
                 UPDATE videos v \
                 SET status_id = $2, error_text = $3, video_url = NULL, \
                     processing_status_text = NULL, updated_at = NOW() \
                 FROM generation_tasks t \
                 WHERE t.video_id = v.id \
                   AND v.status_id = $4 \
                   AND t.claimed_at IS NOT NULL \
                   AND t.finished_at IS NULL \
                   AND COALESCE(t.heartbeat_at, t.claimed_at) < $1 \
                 RETURNING v.id \
             ) \
             UPDATE generation_tasks SET finished_at = NOW() \
             WHERE video_id IN (SELECT id FROM stale) \
             RETURNING video_id",
        )
        .bind(stale_before)
        .bind(VideoStatus::Failed.id())
        .bind(error_text)
        .bind(VideoStatus::Processing.id())
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Most recent jobs of an owner.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        limit: i64,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos WHERE owner_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(owner_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
