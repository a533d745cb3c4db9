//! Character entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use deadline_core::types::{DbId, Timestamp};

/// A character row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub name: String,
    pub hp: i32,
    pub hp_max: i32,
    pub sp: i32,
    pub sp_max: i32,
    pub max_carry_weight: f64,
    pub rerolls: i32,
    pub hunger: i32,
    pub thirst: i32,
    pub sleep_debt: i32,
    /// Trauma log entries joined by `"; "`; empty when unscathed.
    pub traumas: String,
    pub last_meal_at: Timestamp,
    pub last_drink_at: Timestamp,
    pub last_sleep_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new character. Vitals start at zero until the first
/// sheet edit assigns attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCharacter {
    pub id: DbId,
    pub name: String,
}

/// DTO for updating a character. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCharacter {
    pub hp: Option<i32>,
    pub hp_max: Option<i32>,
    pub sp: Option<i32>,
    pub sp_max: Option<i32>,
    pub max_carry_weight: Option<f64>,
    pub rerolls: Option<i32>,
    pub hunger: Option<i32>,
    pub thirst: Option<i32>,
    pub sleep_debt: Option<i32>,
    pub traumas: Option<String>,
    pub last_meal_at: Option<Timestamp>,
    pub last_drink_at: Option<Timestamp>,
    pub last_sleep_at: Option<Timestamp>,
}

/// One attribute or skill row (`attributes` / `skills` tables).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatRow {
    pub name: String,
    pub value: i32,
}
