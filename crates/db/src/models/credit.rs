use reel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `credit_balances` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreditBalance {
    pub owner_id: DbId,
    pub remaining: i32,
    pub updated_at: Timestamp,
}
