//! Background music sources.

use reel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `music_library` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LibraryTrack {
    pub id: DbId,
    pub title: String,
    pub url: String,
    pub duration_seconds: Option<f64>,
    pub mood: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// A row from the `custom_music_uploads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CustomMusicUpload {
    pub id: DbId,
    pub owner_id: DbId,
    pub url: String,
    pub duration_seconds: Option<f64>,
    pub original_filename: Option<String>,
    pub created_at: Timestamp,
}
