//! Repository for the `generation_tasks` table.

use sqlx::PgPool;
use reel_core::types::VideoId;

use crate::models::generation_task::GenerationTask;

/// Column list for `generation_tasks` queries.
const COLUMNS: &str = "video_id, payload, created_at, claimed_at, heartbeat_at, finished_at";

pub struct GenerationTaskRepo;

impl GenerationTaskRepo {
    pub async fn create(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        video_id: VideoId,
        payload: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO generation_tasks (video_id, payload) VALUES ($1, $2)")
            .bind(video_id)
            .bind(payload)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Atomically claim the oldest unclaimed task.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so several dispatchers can share
    /// the queue without double-dispatch.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<GenerationTask>, sqlx::Error> {
        let query = format!(
            "UPDATE generation_tasks \
             SET claimed_at = NOW(), heartbeat_at = NOW() \
             WHERE video_id = ( \
                 SELECT video_id FROM generation_tasks \
                 WHERE claimed_at IS NULL \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationTask>(&query)
            .fetch_optional(pool)
            .await
    }

    pub async fn heartbeat(pool: &PgPool, video_id: VideoId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generation_tasks SET heartbeat_at = NOW() \
             WHERE video_id = $1 AND finished_at IS NULL",
        )
        .bind(video_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn finish(pool: &PgPool, video_id: VideoId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generation_tasks SET finished_at = NOW() \
             WHERE video_id = $1 AND finished_at IS NULL",
        )
        .bind(video_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(pool: &PgPool, video_id: VideoId) -> Result<Option<GenerationTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_tasks WHERE video_id = $1");
        sqlx::query_as::<_, GenerationTask>(&query)
            .bind(video_id)
            .fetch_optional(pool)
            .await
    }
}
