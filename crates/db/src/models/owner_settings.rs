use reel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `owner_settings` table. `settings` is parsed with
/// `reel_core::settings::OwnerSettings::from_json`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OwnerSettingsRow {
    pub owner_id: DbId,
    pub settings: serde_json::Value,
    pub updated_at: Timestamp,
}
