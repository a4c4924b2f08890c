//! Repository for the `generation_details` table.

use sqlx::PgPool;
use reel_core::types::VideoId;

use crate::models::generation_detail::{GenerationDetail, NewGenerationDetail};

/// Column list for `generation_details` queries.
const COLUMNS: &str = "\
    video_id, clips, voiceover_script, voiceover_url, music_url, music_source, \
    captioned, captions_srt, caption_style, processing_started_at, \
    processing_finished_at, created_at";

pub struct GenerationDetailRepo;

impl GenerationDetailRepo {
    /// Write the detail record. A second write for the same video is a
    /// no-op; returns whether a row was inserted.
    pub async fn insert(pool: &PgPool, input: &NewGenerationDetail) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO generation_details \
                 (video_id, clips, voiceover_script, voiceover_url, music_url, music_source, \
                  captioned, captions_srt, caption_style, processing_started_at, processing_finished_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (video_id) DO NOTHING",
        )
        .bind(input.video_id)
        .bind(&input.clips)
        .bind(&input.voiceover_script)
        .bind(&input.voiceover_url)
        .bind(&input.music_url)
        .bind(&input.music_source)
        .bind(input.captioned)
        .bind(&input.captions_srt)
        .bind(&input.caption_style)
        .bind(input.processing_started_at)
        .bind(input.processing_finished_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_video(
        pool: &PgPool,
        video_id: VideoId,
    ) -> Result<Option<GenerationDetail>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_details WHERE video_id = $1");
        sqlx::query_as::<_, GenerationDetail>(&query)
            .bind(video_id)
            .fetch_optional(pool)
            .await
    }
}
