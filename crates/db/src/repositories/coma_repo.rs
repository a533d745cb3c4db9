//! Repository for the `coma_bonus` and `daily_tests` tables.

use chrono::NaiveDate;
use sqlx::PgPool;

use deadline_core::types::DbId;

/// Provides access to coma-assistance bonuses and the once-per-day
/// unconsciousness-test gate.
pub struct ComaRepo;

impl ComaRepo {
    /// Accumulate assistance for a downed character.
    pub async fn add_bonus(pool: &PgPool, target_id: DbId, delta: i32) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO coma_bonus (target_id, bonus) VALUES ($1, $2)
             ON CONFLICT (target_id) DO UPDATE SET bonus = coma_bonus.bonus + EXCLUDED.bonus
             RETURNING bonus",
        )
        .bind(target_id)
        .bind(delta)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Read and clear the accumulated bonus in one statement; 0 when none.
    pub async fn pop_bonus(pool: &PgPool, target_id: DbId) -> Result<i32, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("DELETE FROM coma_bonus WHERE target_id = $1 RETURNING bonus")
                .bind(target_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(b,)| b).unwrap_or(0))
    }

    /// Register today's unconsciousness test. Returns `false` when one was
    /// already taken today (the insert-or-skip runs in one statement).
    pub async fn try_register_test(
        pool: &PgPool,
        character_id: DbId,
        today: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO daily_tests (character_id, last_test_on) VALUES ($1, $2)
             ON CONFLICT (character_id) DO UPDATE SET last_test_on = EXCLUDED.last_test_on
             WHERE daily_tests.last_test_on < EXCLUDED.last_test_on",
        )
        .bind(character_id)
        .bind(today)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Wipe the daily-test gate (the daily scheduler hook). Idempotent.
    pub async fn clear_tests(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM daily_tests").execute(pool).await?;
        Ok(result.rows_affected())
    }
}
