//! Repository for the `turns`, `weekly_xp`, and `mutual_mentions` tables.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use deadline_core::types::DbId;

use crate::models::journal::{TurnRecord, WeeklyXp};

/// Provides access to the turn journal and weekly XP accumulators.
pub struct JournalRepo;

impl JournalRepo {
    /// The turn a character registered on `date`, if any.
    pub async fn find_turn(
        pool: &PgPool,
        character_id: DbId,
        date: NaiveDate,
    ) -> Result<Option<TurnRecord>, sqlx::Error> {
        sqlx::query_as::<_, TurnRecord>(
            "SELECT character_id, turn_date, char_count, mentions
             FROM turns WHERE character_id = $1 AND turn_date = $2",
        )
        .bind(character_id)
        .bind(date)
        .fetch_optional(pool)
        .await
    }

    /// The most recent turn date strictly before `date`.
    pub async fn previous_turn_date(
        pool: &PgPool,
        character_id: DbId,
        date: NaiveDate,
    ) -> Result<Option<NaiveDate>, sqlx::Error> {
        let row: Option<(NaiveDate,)> = sqlx::query_as(
            "SELECT turn_date FROM turns
             WHERE character_id = $1 AND turn_date < $2
             ORDER BY turn_date DESC LIMIT 1",
        )
        .bind(character_id)
        .bind(date)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(d,)| d))
    }

    /// This week's turns for a character, oldest first.
    pub async fn turns_since(
        pool: &PgPool,
        character_id: DbId,
        since: NaiveDate,
    ) -> Result<Vec<TurnRecord>, sqlx::Error> {
        sqlx::query_as::<_, TurnRecord>(
            "SELECT character_id, turn_date, char_count, mentions
             FROM turns WHERE character_id = $1 AND turn_date >= $2
             ORDER BY turn_date",
        )
        .bind(character_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Insert one turn inside a caller-owned transaction.
    pub async fn insert_turn(
        tx: &mut Transaction<'_, Postgres>,
        record: &TurnRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO turns (character_id, turn_date, char_count, mentions)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(record.character_id)
        .bind(record.turn_date)
        .bind(record.char_count)
        .bind(&record.mentions)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// A character's weekly accumulator row.
    pub async fn week_for(
        pool: &PgPool,
        character_id: DbId,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyXp>, sqlx::Error> {
        sqlx::query_as::<_, WeeklyXp>(
            "SELECT character_id, week_start, xp_total, streak
             FROM weekly_xp WHERE character_id = $1 AND week_start = $2",
        )
        .bind(character_id)
        .bind(week_start)
        .fetch_optional(pool)
        .await
    }

    /// Add XP to a character's weekly total and record the current streak,
    /// inside a caller-owned transaction.
    pub async fn add_xp(
        tx: &mut Transaction<'_, Postgres>,
        character_id: DbId,
        week_start: NaiveDate,
        xp_delta: i32,
        streak: Option<i32>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO weekly_xp (character_id, week_start, xp_total, streak)
             VALUES ($1, $2, $3, COALESCE($4, 0))
             ON CONFLICT (character_id, week_start) DO UPDATE
             SET xp_total = weekly_xp.xp_total + EXCLUDED.xp_total,
                 streak = COALESCE($4, weekly_xp.streak)",
        )
        .bind(character_id)
        .bind(week_start)
        .bind(xp_delta)
        .bind(streak)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Record a mutual-mention award for an (ordered) pair. Returns `false`
    /// when the pair was already awarded this week.
    pub async fn try_award_mutual(
        tx: &mut Transaction<'_, Postgres>,
        week_start: NaiveDate,
        a: DbId,
        b: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let result = sqlx::query(
            "INSERT INTO mutual_mentions (week_start, character_a, character_b)
             VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(week_start)
        .bind(lo)
        .bind(hi)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Weekly standings, highest XP first.
    pub async fn ranking(
        pool: &PgPool,
        week_start: NaiveDate,
        limit: i64,
    ) -> Result<Vec<WeeklyXp>, sqlx::Error> {
        sqlx::query_as::<_, WeeklyXp>(
            "SELECT character_id, week_start, xp_total, streak
             FROM weekly_xp WHERE week_start = $1
             ORDER BY xp_total DESC, character_id LIMIT $2",
        )
        .bind(week_start)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Drop a closed week's accumulators and mention awards (the weekly
    /// scheduler hook). Idempotent.
    pub async fn delete_week(pool: &PgPool, week_start: NaiveDate) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM mutual_mentions WHERE week_start = $1")
            .bind(week_start)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM weekly_xp WHERE week_start = $1")
            .bind(week_start)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
