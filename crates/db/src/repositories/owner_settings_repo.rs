//! Repository for the `owner_settings` table.

use sqlx::PgPool;
use reel_core::types::DbId;

use crate::models::owner_settings::OwnerSettingsRow;

pub struct OwnerSettingsRepo;

impl OwnerSettingsRepo {
    pub async fn find(pool: &PgPool, owner_id: DbId) -> Result<Option<OwnerSettingsRow>, sqlx::Error> {
        sqlx::query_as::<_, OwnerSettingsRow>(
            "SELECT owner_id, settings, updated_at FROM owner_settings WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    /// Replace the owner's settings document.
    pub async fn upsert(
        pool: &PgPool,
        owner_id: DbId,
        settings: &serde_json::Value,
    ) -> Result<OwnerSettingsRow, sqlx::Error> {
        sqlx::query_as::<_, OwnerSettingsRow>(
            "INSERT INTO owner_settings (owner_id, settings) VALUES ($1, $2) \
             ON CONFLICT (owner_id) DO UPDATE SET settings = EXCLUDED.settings, updated_at = NOW() \
             RETURNING owner_id, settings, updated_at",
        )
        .bind(owner_id)
        .bind(settings)
        .fetch_one(pool)
        .await
    }
}
