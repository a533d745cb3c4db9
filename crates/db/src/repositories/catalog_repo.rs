//! Repository for the `catalog` table.

use sqlx::PgPool;

use deadline_core::normalize::normalize;

use crate::models::catalog::{CatalogItem, CreateCatalogItem};

/// Column list shared across queries.
const COLUMNS: &str = "name_key, name, weight, consumable, effect, magnitude, \
    restore_hunger, restore_thirst, weapon_class, damage_dice, ammo_loaded, \
    ammo_capacity, compatible_ammo";

/// Provides CRUD operations for catalog entries.
pub struct CatalogRepo;

impl CatalogRepo {
    /// Find an entry by free-text name (normalized match).
    pub async fn find(pool: &PgPool, name: &str) -> Result<Option<CatalogItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM catalog WHERE name_key = $1");
        sqlx::query_as::<_, CatalogItem>(&query)
            .bind(normalize(name))
            .fetch_optional(pool)
            .await
    }

    /// All entries, alphabetical by normalized name.
    pub async fn list(pool: &PgPool) -> Result<Vec<CatalogItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM catalog ORDER BY name_key");
        sqlx::query_as::<_, CatalogItem>(&query).fetch_all(pool).await
    }

    /// Insert or fully replace an entry (idempotent upsert keyed on the
    /// normalized name).
    pub async fn upsert(pool: &PgPool, input: &CreateCatalogItem) -> Result<CatalogItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO catalog
                (name_key, name, weight, consumable, effect, magnitude,
                 restore_hunger, restore_thirst, weapon_class, damage_dice,
                 ammo_loaded, ammo_capacity, compatible_ammo)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (name_key) DO UPDATE
             SET name = EXCLUDED.name,
                 weight = EXCLUDED.weight,
                 consumable = EXCLUDED.consumable,
                 effect = EXCLUDED.effect,
                 magnitude = EXCLUDED.magnitude,
                 restore_hunger = EXCLUDED.restore_hunger,
                 restore_thirst = EXCLUDED.restore_thirst,
                 weapon_class = EXCLUDED.weapon_class,
                 damage_dice = EXCLUDED.damage_dice,
                 ammo_loaded = EXCLUDED.ammo_loaded,
                 ammo_capacity = EXCLUDED.ammo_capacity,
                 compatible_ammo = EXCLUDED.compatible_ammo
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CatalogItem>(&query)
            .bind(normalize(&input.name))
            .bind(&input.name)
            .bind(input.weight)
            .bind(input.consumable)
            .bind(&input.effect)
            .bind(&input.magnitude)
            .bind(input.restore_hunger)
            .bind(input.restore_thirst)
            .bind(&input.weapon_class)
            .bind(&input.damage_dice)
            .bind(input.ammo_loaded)
            .bind(input.ammo_capacity)
            .bind(&input.compatible_ammo)
            .fetch_one(pool)
            .await
    }

    /// Delete an entry by free-text name. Returns `true` if a row went away.
    pub async fn delete(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM catalog WHERE name_key = $1")
            .bind(normalize(name))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
