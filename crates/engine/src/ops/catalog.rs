//! Catalog administration and listing.

use serde::Deserialize;
use validator::Validate;

use deadline_core::dice::DiceSpec;
use deadline_core::items::{validate_magnitude, EffectKind, Magnitude, WeaponClass};
use deadline_core::CoreError;
use deadline_db::models::catalog::{CatalogItem, CreateCatalogItem};
use deadline_db::repositories::CatalogRepo;

use crate::{Actor, Engine, EngineError, EngineResult};

/// Arguments for adding a consumable item.
#[derive(Debug, Clone, Deserialize)]
pub struct AddConsumable {
    pub name: String,
    pub weight: f64,
    pub effect: EffectKind,
    /// Fixed integer or dice notation, depending on the effect.
    pub magnitude: String,
    /// Flat hunger reduction (food).
    pub restore_hunger: i32,
    /// Flat thirst reduction (drink).
    pub restore_thirst: i32,
}

/// Arguments for adding a weapon.
#[derive(Debug, Clone, Deserialize)]
pub struct AddWeapon {
    pub name: String,
    pub weight: f64,
    pub class: WeaponClass,
    /// Damage dice notation, e.g. `"1d8"`.
    pub damage_dice: String,
    /// Rounds loaded when the weapon is sourced from the catalog.
    pub ammo_loaded: i32,
    pub ammo_capacity: i32,
    /// Ammo item names this weapon accepts (ranged only).
    pub compatible_ammo: Vec<String>,
}

impl Engine {
    /// List every catalog entry.
    pub async fn list_catalog(&self, _actor: Actor) -> EngineResult<Vec<CatalogItem>> {
        Ok(CatalogRepo::list(&self.pool).await?)
    }

    /// Add a plain item (name and weight only). Privileged.
    pub async fn add_catalog_item(
        &self,
        actor: Actor,
        name: &str,
        weight: f64,
    ) -> EngineResult<CatalogItem> {
        self.require_privileged(actor)?;
        let input = CreateCatalogItem::plain(name, weight);
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(CatalogRepo::upsert(&self.pool, &input).await?)
    }

    /// Add a consumable. Privileged. Heal effects take a fixed bonus,
    /// damage effects take dice; the shape is rejected otherwise.
    pub async fn add_consumable(
        &self,
        actor: Actor,
        args: AddConsumable,
    ) -> EngineResult<CatalogItem> {
        self.require_privileged(actor)?;
        let magnitude = Magnitude::parse(&args.magnitude)?;
        validate_magnitude(args.effect, &magnitude)?;

        let mut input = CreateCatalogItem::plain(&args.name, args.weight);
        input.consumable = true;
        input.effect = args.effect.as_str().to_string();
        input.magnitude = magnitude.to_db_string();
        input.restore_hunger = args.restore_hunger.max(0);
        input.restore_thirst = args.restore_thirst.max(0);
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(CatalogRepo::upsert(&self.pool, &input).await?)
    }

    /// Add a weapon. Privileged. The damage bonus must be dice notation;
    /// only ranged weapons carry ammunition and a compatibility list.
    pub async fn add_weapon(&self, actor: Actor, args: AddWeapon) -> EngineResult<CatalogItem> {
        self.require_privileged(actor)?;
        let damage = DiceSpec::parse(&args.damage_dice)?;

        let mut input = CreateCatalogItem::plain(&args.name, args.weight);
        input.weapon_class = Some(args.class.as_str().to_string());
        input.damage_dice = Some(damage.to_string());
        match args.class {
            WeaponClass::Ranged => {
                if args.ammo_capacity <= 0 {
                    return Err(EngineError::validation(
                        "A ranged weapon needs a positive ammo capacity",
                    ));
                }
                if args.ammo_loaded < 0 || args.ammo_loaded > args.ammo_capacity {
                    return Err(EngineError::validation(format!(
                        "Loaded rounds must be within 0..={}",
                        args.ammo_capacity
                    )));
                }
                input.ammo_loaded = args.ammo_loaded;
                input.ammo_capacity = args.ammo_capacity;
                input.compatible_ammo = args.compatible_ammo.join(",");
            }
            WeaponClass::Melee => {
                if !args.compatible_ammo.is_empty() {
                    return Err(EngineError::validation(
                        "A melee weapon takes no ammunition compatibility list",
                    ));
                }
            }
        }
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(CatalogRepo::upsert(&self.pool, &input).await?)
    }

    /// Remove a catalog entry. Privileged.
    pub async fn remove_catalog_item(&self, actor: Actor, name: &str) -> EngineResult<()> {
        self.require_privileged(actor)?;
        if !CatalogRepo::delete(&self.pool, name).await? {
            return Err(EngineError::not_found("catalog item", name));
        }
        Ok(())
    }

    pub(crate) fn require_privileged(&self, actor: Actor) -> EngineResult<()> {
        if actor.privileged {
            Ok(())
        } else {
            Err(EngineError::conflict("Administrative privilege required"))
        }
    }
}
