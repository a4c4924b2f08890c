//! Repository for the `credit_balances` table.

use sqlx::PgPool;
use reel_core::types::DbId;

use crate::models::credit::CreditBalance;

pub struct CreditRepo;

impl CreditRepo {
    /// Remaining credits; an owner without a row has none.
    pub async fn remaining(pool: &PgPool, owner_id: DbId) -> Result<i32, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT remaining FROM credit_balances WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map_or(0, |(r,)| r))
    }

    /// Take one credit if any remain. Returns whether a credit was taken.
    ///
    /// The `remaining > 0` guard makes concurrent debits safe: at most
    /// `remaining` of them can succeed.
    pub async fn try_debit(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE credit_balances \
             SET remaining = remaining - 1, updated_at = NOW() \
             WHERE owner_id = $1 AND remaining > 0",
        )
        .bind(owner_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Add credits, creating the balance row if needed.
    pub async fn grant(
        pool: &PgPool,
        owner_id: DbId,
        amount: i32,
    ) -> Result<CreditBalance, sqlx::Error> {
        sqlx::query_as::<_, CreditBalance>(
            "INSERT INTO credit_balances (owner_id, remaining) VALUES ($1, $2) \
             ON CONFLICT (owner_id) DO UPDATE \
             SET remaining = credit_balances.remaining + EXCLUDED.remaining, updated_at = NOW() \
             RETURNING owner_id, remaining, updated_at",
        )
        .bind(owner_id)
        .bind(amount)
        .fetch_one(pool)
        .await
    }
}
