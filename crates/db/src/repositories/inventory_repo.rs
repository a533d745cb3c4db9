//! Repository for the `inventory` table.
//!
//! All lookups go through the normalized `name_key`; quantity changes that
//! may remove a row run inside a transaction with the row locked, so a
//! concurrent debit of the same stack cannot lose an update.

use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use deadline_core::normalize::normalize;
use deadline_core::types::DbId;

use crate::models::inventory::{CreditItem, InventoryItem};

/// Column list shared across queries.
const COLUMNS: &str = "character_id, name_key, name, weight, quantity, ammo_current, ammo_max";

/// Provides CRUD operations for inventory entries.
pub struct InventoryRepo;

impl InventoryRepo {
    /// All entries for a character, alphabetical by normalized name.
    pub async fn list(pool: &PgPool, character_id: DbId) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM inventory WHERE character_id = $1 ORDER BY name_key");
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(character_id)
            .fetch_all(pool)
            .await
    }

    /// Find one entry by free-text name (normalized match).
    pub async fn find(
        pool: &PgPool,
        character_id: DbId,
        name: &str,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM inventory WHERE character_id = $1 AND name_key = $2");
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(character_id)
            .bind(normalize(name))
            .fetch_optional(pool)
            .await
    }

    /// Find one entry inside a transaction, locking the row.
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        character_id: DbId,
        name: &str,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inventory WHERE character_id = $1 AND name_key = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, InventoryItem>(&query)
            .bind(character_id)
            .bind(normalize(name))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Set an entry's quantity, deleting the row when it drops to zero or
    /// below. Caller owns the transaction.
    pub async fn set_quantity_or_remove(
        tx: &mut Transaction<'_, Postgres>,
        character_id: DbId,
        name: &str,
        quantity: i32,
    ) -> Result<(), sqlx::Error> {
        let key = normalize(name);
        if quantity <= 0 {
            sqlx::query("DELETE FROM inventory WHERE character_id = $1 AND name_key = $2")
                .bind(character_id)
                .bind(key)
                .execute(&mut **tx)
                .await?;
        } else {
            sqlx::query(
                "UPDATE inventory SET quantity = $3 WHERE character_id = $1 AND name_key = $2",
            )
            .bind(character_id)
            .bind(key)
            .bind(quantity)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Shift an entry's quantity by `delta` inside a caller-owned
    /// transaction, removing the row at zero. The row is locked between the
    /// read and the write.
    ///
    /// Returns the remaining quantity (0 when removed), or `None` when the
    /// item was absent.
    pub async fn adjust_quantity_tx(
        tx: &mut Transaction<'_, Postgres>,
        character_id: DbId,
        name: &str,
        delta: i32,
    ) -> Result<Option<i32>, sqlx::Error> {
        let Some(item) = Self::find_for_update(tx, character_id, name).await? else {
            return Ok(None);
        };
        let remaining = (item.quantity + delta).max(0);
        Self::set_quantity_or_remove(tx, character_id, name, remaining).await?;
        Ok(Some(remaining))
    }

    /// Shift an entry's quantity by `delta` as a standalone operation.
    pub async fn adjust_quantity(
        pool: &PgPool,
        character_id: DbId,
        name: &str,
        delta: i32,
    ) -> Result<Option<i32>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let remaining = Self::adjust_quantity_tx(&mut tx, character_id, name, delta).await?;
        tx.commit().await?;
        Ok(remaining)
    }

    /// Credit an item into an inventory inside a caller-owned transaction.
    ///
    /// Quantities accumulate; weight and ammo metadata take the incoming
    /// values (last write wins on weapon metadata).
    pub async fn credit(
        tx: &mut Transaction<'_, Postgres>,
        character_id: DbId,
        item: &CreditItem,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO inventory
                (character_id, name_key, name, weight, quantity, ammo_current, ammo_max)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (character_id, name_key) DO UPDATE
             SET quantity = inventory.quantity + EXCLUDED.quantity,
                 name = EXCLUDED.name,
                 weight = EXCLUDED.weight,
                 ammo_current = EXCLUDED.ammo_current,
                 ammo_max = EXCLUDED.ammo_max",
        )
        .bind(character_id)
        .bind(normalize(&item.name))
        .bind(&item.name)
        .bind(item.weight)
        .bind(item.quantity)
        .bind(item.ammo_current)
        .bind(item.ammo_max)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Credit an item outside any larger operation (administrative grant).
    pub async fn grant(
        pool: &PgPool,
        character_id: DbId,
        item: &CreditItem,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::credit(&mut tx, character_id, item).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Set a weapon's loaded-round count inside a caller-owned transaction.
    pub async fn set_ammo(
        tx: &mut Transaction<'_, Postgres>,
        character_id: DbId,
        name: &str,
        ammo_current: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE inventory SET ammo_current = $3 WHERE character_id = $1 AND name_key = $2",
        )
        .bind(character_id)
        .bind(normalize(name))
        .bind(ammo_current)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Spend one loaded round. The empty check runs inside the UPDATE, so
    /// the call is race-free on its own and composes into a larger
    /// transaction. Returns the remaining count, or `None` when the weapon
    /// is absent or already empty.
    pub async fn spend_round(
        executor: impl PgExecutor<'_>,
        character_id: DbId,
        name: &str,
    ) -> Result<Option<i32>, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE inventory SET ammo_current = ammo_current - 1
             WHERE character_id = $1 AND name_key = $2 AND ammo_current > 0
             RETURNING ammo_current",
        )
        .bind(character_id)
        .bind(normalize(name))
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|(n,)| n))
    }
}
