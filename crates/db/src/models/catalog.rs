//! Catalog entry model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A catalog row from the `catalog` table.
///
/// Consumable fields (`effect`, `magnitude`, `restore_*`) and weapon fields
/// (`weapon_class`, `damage_dice`, ammo columns) are orthogonal; plain items
/// leave both groups at their defaults.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CatalogItem {
    pub name_key: String,
    pub name: String,
    pub weight: f64,
    pub consumable: bool,
    pub effect: String,
    pub magnitude: String,
    pub restore_hunger: i32,
    pub restore_thirst: i32,
    pub weapon_class: Option<String>,
    pub damage_dice: Option<String>,
    pub ammo_loaded: i32,
    pub ammo_capacity: i32,
    /// Comma-separated ammo item names this weapon accepts (ranged only).
    pub compatible_ammo: String,
}

impl CatalogItem {
    /// Whether this entry is a ranged weapon that holds ammunition.
    pub fn is_ranged_weapon(&self) -> bool {
        self.weapon_class.as_deref() == Some("ranged")
    }

    /// Whether this entry is any kind of weapon.
    pub fn is_weapon(&self) -> bool {
        self.weapon_class.is_some()
    }

    /// Compatible ammo names, normalized for matching.
    pub fn compatible_ammo_keys(&self) -> Vec<String> {
        self.compatible_ammo
            .split(',')
            .map(deadline_core::normalize::normalize)
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// DTO for inserting or replacing a catalog entry.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCatalogItem {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.01))]
    pub weight: f64,
    pub consumable: bool,
    pub effect: String,
    pub magnitude: String,
    #[validate(range(min = 0))]
    pub restore_hunger: i32,
    #[validate(range(min = 0))]
    pub restore_thirst: i32,
    pub weapon_class: Option<String>,
    pub damage_dice: Option<String>,
    #[validate(range(min = 0))]
    pub ammo_loaded: i32,
    #[validate(range(min = 0))]
    pub ammo_capacity: i32,
    pub compatible_ammo: String,
}

impl CreateCatalogItem {
    /// A plain item: just a name and a weight.
    pub fn plain(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            consumable: false,
            effect: "none".to_string(),
            magnitude: "0".to_string(),
            restore_hunger: 0,
            restore_thirst: 0,
            weapon_class: None,
            damage_dice: None,
            ammo_loaded: 0,
            ammo_capacity: 0,
            compatible_ammo: String::new(),
        }
    }
}
