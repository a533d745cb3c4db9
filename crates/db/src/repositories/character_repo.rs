//! Repository for the `characters` table.

use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use deadline_core::stats::{ATTRIBUTES, SKILLS};
use deadline_core::types::DbId;

use crate::models::character::{Character, CreateCharacter, UpdateCharacter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, hp, hp_max, sp, sp_max, max_carry_weight, rerolls, \
    hunger, thirst, sleep_debt, traumas, last_meal_at, last_drink_at, last_sleep_at, \
    created_at, updated_at";

/// Provides CRUD operations for characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Insert a new character with zeroed vitals and seed every attribute
    /// and skill row at 0. Idempotent: an existing character is returned
    /// unchanged.
    pub async fn create(pool: &PgPool, input: &CreateCharacter) -> Result<Character, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("INSERT INTO characters (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(input.id)
            .bind(&input.name)
            .execute(&mut *tx)
            .await?;
        for attr in ATTRIBUTES {
            sqlx::query(
                "INSERT INTO attributes (character_id, name, value) VALUES ($1, $2, 0)
                 ON CONFLICT DO NOTHING",
            )
            .bind(input.id)
            .bind(attr.as_str())
            .execute(&mut *tx)
            .await?;
        }
        for skill in SKILLS {
            sqlx::query(
                "INSERT INTO skills (character_id, name, value) VALUES ($1, $2, 0)
                 ON CONFLICT DO NOTHING",
            )
            .bind(input.id)
            .bind(skill.as_str())
            .execute(&mut *tx)
            .await?;
        }
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        let character = sqlx::query_as::<_, Character>(&query)
            .bind(input.id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(character)
    }

    /// Find a character by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a character. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters SET
                hp = COALESCE($2, hp),
                hp_max = COALESCE($3, hp_max),
                sp = COALESCE($4, sp),
                sp_max = COALESCE($5, sp_max),
                max_carry_weight = COALESCE($6, max_carry_weight),
                rerolls = COALESCE($7, rerolls),
                hunger = COALESCE($8, hunger),
                thirst = COALESCE($9, thirst),
                sleep_debt = COALESCE($10, sleep_debt),
                traumas = COALESCE($11, traumas),
                last_meal_at = COALESCE($12, last_meal_at),
                last_drink_at = COALESCE($13, last_drink_at),
                last_sleep_at = COALESCE($14, last_sleep_at),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(input.hp)
            .bind(input.hp_max)
            .bind(input.sp)
            .bind(input.sp_max)
            .bind(input.max_carry_weight)
            .bind(input.rerolls)
            .bind(input.hunger)
            .bind(input.thirst)
            .bind(input.sleep_debt)
            .bind(&input.traumas)
            .bind(input.last_meal_at)
            .bind(input.last_drink_at)
            .bind(input.last_sleep_at)
            .fetch_optional(pool)
            .await
    }

    /// Same as [`CharacterRepo::update`] inside a caller-owned transaction.
    pub async fn update_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters SET
                hp = COALESCE($2, hp),
                hp_max = COALESCE($3, hp_max),
                sp = COALESCE($4, sp),
                sp_max = COALESCE($5, sp_max),
                max_carry_weight = COALESCE($6, max_carry_weight),
                rerolls = COALESCE($7, rerolls),
                hunger = COALESCE($8, hunger),
                thirst = COALESCE($9, thirst),
                sleep_debt = COALESCE($10, sleep_debt),
                traumas = COALESCE($11, traumas),
                last_meal_at = COALESCE($12, last_meal_at),
                last_drink_at = COALESCE($13, last_drink_at),
                last_sleep_at = COALESCE($14, last_sleep_at),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(input.hp)
            .bind(input.hp_max)
            .bind(input.sp)
            .bind(input.sp_max)
            .bind(input.max_carry_weight)
            .bind(input.rerolls)
            .bind(input.hunger)
            .bind(input.thirst)
            .bind(input.sleep_debt)
            .bind(&input.traumas)
            .bind(input.last_meal_at)
            .bind(input.last_drink_at)
            .bind(input.last_sleep_at)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Atomically shift HP by `delta`, clamped to `0..=hp_max`.
    ///
    /// The clamp runs inside the UPDATE so concurrent hits cannot lose
    /// each other. Takes any executor so callers can compose it into a
    /// larger transaction. Returns the new `(hp, hp_max)`.
    pub async fn apply_hp_delta(
        executor: impl PgExecutor<'_>,
        id: DbId,
        delta: i32,
    ) -> Result<Option<(i32, i32)>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE characters
             SET hp = LEAST(hp_max, GREATEST(0, hp + $2)), updated_at = NOW()
             WHERE id = $1
             RETURNING hp, hp_max",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(executor)
        .await
    }

    /// Atomically shift SP by `delta`, clamped to `0..=sp_max`.
    pub async fn apply_sp_delta(
        executor: impl PgExecutor<'_>,
        id: DbId,
        delta: i32,
    ) -> Result<Option<(i32, i32)>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE characters
             SET sp = LEAST(sp_max, GREATEST(0, sp + $2)), updated_at = NOW()
             WHERE id = $1
             RETURNING sp, sp_max",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(executor)
        .await
    }

    /// Append one entry to the trauma log.
    pub async fn append_trauma(
        executor: impl PgExecutor<'_>,
        id: DbId,
        trauma: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE characters
             SET traumas = CASE WHEN traumas = '' THEN $2 ELSE traumas || '; ' || $2 END,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(trauma)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Set all three need levels, clamped to `0..=100` in the statement.
    pub async fn set_need_levels(
        pool: &PgPool,
        id: DbId,
        hunger: i32,
        thirst: i32,
        sleep_debt: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE characters
             SET hunger = LEAST(100, GREATEST(0, $2)),
                 thirst = LEAST(100, GREATEST(0, $3)),
                 sleep_debt = LEAST(100, GREATEST(0, $4)),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(hunger)
        .bind(thirst)
        .bind(sleep_debt)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Shift the three need levels by deltas, clamped to `0..=100`.
    pub async fn adjust_need_levels(
        executor: impl PgExecutor<'_>,
        id: DbId,
        hunger_delta: i32,
        thirst_delta: i32,
        sleep_delta: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE characters
             SET hunger = LEAST(100, GREATEST(0, hunger + $2)),
                 thirst = LEAST(100, GREATEST(0, thirst + $3)),
                 sleep_debt = LEAST(100, GREATEST(0, sleep_debt + $4)),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(hunger_delta)
        .bind(thirst_delta)
        .bind(sleep_delta)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Spend one daily reroll. Returns `false` when none remain.
    pub async fn spend_reroll(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE characters SET rerolls = rerolls - 1 WHERE id = $1 AND rerolls > 0")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reset every character's reroll counter (the daily scheduler hook).
    pub async fn reset_all_rerolls(pool: &PgPool, rerolls: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE characters SET rerolls = $1")
            .bind(rerolls)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
