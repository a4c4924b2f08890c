//! Lookups over the `music_library` and `custom_music_uploads` tables.

use sqlx::PgPool;
use reel_core::types::DbId;

use crate::models::music::{CustomMusicUpload, LibraryTrack};

pub struct MusicRepo;

impl MusicRepo {
    /// An active library track by id.
    pub async fn find_library_track(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LibraryTrack>, sqlx::Error> {
        sqlx::query_as::<_, LibraryTrack>(
            "SELECT id, title, url, duration_seconds, mood, is_active, created_at \
             FROM music_library WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// A custom upload, only if it belongs to `owner_id`.
    pub async fn find_custom_upload(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<CustomMusicUpload>, sqlx::Error> {
        sqlx::query_as::<_, CustomMusicUpload>(
            "SELECT id, owner_id, url, duration_seconds, original_filename, created_at \
             FROM custom_music_uploads WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn add_library_track(
        pool: &PgPool,
        title: &str,
        url: &str,
        duration_seconds: Option<f64>,
    ) -> Result<LibraryTrack, sqlx::Error> {
        sqlx::query_as::<_, LibraryTrack>(
            "INSERT INTO music_library (title, url, duration_seconds) VALUES ($1, $2, $3) \
             RETURNING id, title, url, duration_seconds, mood, is_active, created_at",
        )
        .bind(title)
        .bind(url)
        .bind(duration_seconds)
        .fetch_one(pool)
        .await
    }

    pub async fn add_custom_upload(
        pool: &PgPool,
        owner_id: DbId,
        url: &str,
        duration_seconds: Option<f64>,
        original_filename: Option<&str>,
    ) -> Result<CustomMusicUpload, sqlx::Error> {
        sqlx::query_as::<_, CustomMusicUpload>(
            "INSERT INTO custom_music_uploads (owner_id, url, duration_seconds, original_filename) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, owner_id, url, duration_seconds, original_filename, created_at",
        )
        .bind(owner_id)
        .bind(url)
        .bind(duration_seconds)
        .bind(original_filename)
        .fetch_one(pool)
        .await
    }
}
