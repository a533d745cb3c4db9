//! Inventory entry model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use deadline_core::types::DbId;

/// An inventory row from the `inventory` table.
///
/// `name` preserves the display casing; `name_key` is the normalized lookup
/// key. The ammo pair is present only on loadable weapons.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryItem {
    pub character_id: DbId,
    pub name_key: String,
    pub name: String,
    pub weight: f64,
    pub quantity: i32,
    pub ammo_current: Option<i32>,
    pub ammo_max: Option<i32>,
}

impl InventoryItem {
    /// Whether this entry is a loadable weapon.
    pub fn is_loadable(&self) -> bool {
        self.ammo_max.is_some()
    }
}

/// DTO for crediting an item into an inventory (grant or transfer receipt).
#[derive(Debug, Clone, Deserialize)]
pub struct CreditItem {
    pub name: String,
    pub weight: f64,
    pub quantity: i32,
    pub ammo_current: Option<i32>,
    pub ammo_max: Option<i32>,
}
