//! Repository for the `attributes` and `skills` tables.

use sqlx::{PgPool, Postgres, Transaction};

use deadline_core::types::DbId;

use crate::models::character::StatRow;

/// Provides access to a character's attribute and skill scores.
pub struct SheetRepo;

impl SheetRepo {
    /// All attribute rows for a character.
    pub async fn attributes(pool: &PgPool, id: DbId) -> Result<Vec<StatRow>, sqlx::Error> {
        sqlx::query_as::<_, StatRow>(
            "SELECT name, value FROM attributes WHERE character_id = $1 ORDER BY name",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// All skill rows for a character.
    pub async fn skills(pool: &PgPool, id: DbId) -> Result<Vec<StatRow>, sqlx::Error> {
        sqlx::query_as::<_, StatRow>(
            "SELECT name, value FROM skills WHERE character_id = $1 ORDER BY name",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// One attribute score; 0 when the row is missing.
    pub async fn attribute_value(
        pool: &PgPool,
        id: DbId,
        name: &str,
    ) -> Result<i32, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT value FROM attributes WHERE character_id = $1 AND name = $2")
                .bind(id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(v,)| v).unwrap_or(0))
    }

    /// One skill score; 0 when the row is missing.
    pub async fn skill_value(pool: &PgPool, id: DbId, name: &str) -> Result<i32, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT value FROM skills WHERE character_id = $1 AND name = $2")
                .bind(id)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(v,)| v).unwrap_or(0))
    }

    /// Upsert one attribute score inside a caller-owned transaction.
    pub async fn set_attribute(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        name: &str,
        value: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO attributes (character_id, name, value) VALUES ($1, $2, $3)
             ON CONFLICT (character_id, name) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(id)
        .bind(name)
        .bind(value)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Upsert one skill score inside a caller-owned transaction.
    pub async fn set_skill(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        name: &str,
        value: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO skills (character_id, name, value) VALUES ($1, $2, $3)
             ON CONFLICT (character_id, name) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(id)
        .bind(name)
        .bind(value)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
