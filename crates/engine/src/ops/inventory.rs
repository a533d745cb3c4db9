//! Inventory views, administrative grants, discarding, and consumption.

use serde::Serialize;

use deadline_core::encumbrance::{total_weight, WeightStatus};
use deadline_core::items::EffectKind;
use deadline_core::needs::NeedKind;
use deadline_core::types::DbId;
use deadline_db::models::inventory::{CreditItem, InventoryItem};
use deadline_db::repositories::{CatalogRepo, CharacterRepo, InventoryRepo};

use crate::{Actor, Engine, EngineError, EngineResult};

/// A character's inventory with its weight summary.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub items: Vec<InventoryItem>,
    pub weight: WeightStatus,
}

/// Outcome of an administrative item grant.
#[derive(Debug, Clone, Serialize)]
pub struct GrantResult {
    pub item_name: String,
    pub quantity: i32,
    pub weight: WeightStatus,
}

/// Outcome of discarding items.
#[derive(Debug, Clone, Serialize)]
pub struct DiscardResult {
    pub item_name: String,
    pub quantity: i32,
    pub remaining: i32,
    pub weight: WeightStatus,
}

/// Outcome of consuming an item.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumeResult {
    pub item_name: String,
    pub quantity: i32,
    pub effect: EffectKind,
    /// The entry's magnitude string, for the dispatcher to explain heal or
    /// damage consumables (those apply through the damage/heal operations).
    pub magnitude: String,
    pub hunger_reduced: i32,
    pub thirst_reduced: i32,
}

impl Engine {
    /// View an inventory. Reading someone else's takes privilege.
    pub async fn view_inventory(
        &self,
        actor: Actor,
        target: Option<DbId>,
    ) -> EngineResult<InventoryReport> {
        let target_id = target.unwrap_or(actor.id);
        if target_id != actor.id && !actor.privileged {
            return Err(EngineError::conflict(
                "Only a privileged caller can view another character's inventory",
            ));
        }
        let character = self.require_character(target_id).await?;
        let items = InventoryRepo::list(&self.pool, character.id).await?;
        let weight = WeightStatus::compute(
            total_weight(items.iter().map(|i| (i.weight, i.quantity))),
            character.max_carry_weight,
        );
        Ok(InventoryReport { items, weight })
    }

    /// Grant an item from the catalog straight into an inventory.
    /// Privileged; weapons arrive with their catalog-defined load.
    pub async fn grant_item(
        &self,
        actor: Actor,
        target: DbId,
        name: &str,
        quantity: i32,
    ) -> EngineResult<GrantResult> {
        self.require_privileged(actor)?;
        if quantity < 1 {
            return Err(EngineError::validation("Quantity must be at least 1"));
        }
        let character = self.require_character(target).await?;
        let entry = CatalogRepo::find(&self.pool, name)
            .await?
            .ok_or_else(|| EngineError::not_found("catalog item", name))?;

        InventoryRepo::grant(&self.pool, character.id, &Self::credit_from_catalog(&entry, quantity))
            .await?;
        let weight = self.weight_status(character.id).await?;
        Ok(GrantResult {
            item_name: entry.name,
            quantity,
            weight,
        })
    }

    /// Throw away up to the held quantity of an item.
    pub async fn discard_item(
        &self,
        actor: Actor,
        name: &str,
        quantity: i32,
    ) -> EngineResult<DiscardResult> {
        if quantity < 1 {
            return Err(EngineError::validation("Quantity must be at least 1"));
        }
        let held = InventoryRepo::find(&self.pool, actor.id, name)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", name))?;
        if quantity > held.quantity {
            return Err(EngineError::conflict(format!(
                "Only {} x '{}' held",
                held.quantity, held.name
            )));
        }
        let remaining = InventoryRepo::adjust_quantity(&self.pool, actor.id, name, -quantity)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", name))?;
        let weight = self.weight_status(actor.id).await?;
        Ok(DiscardResult {
            item_name: held.name,
            quantity,
            remaining,
            weight,
        })
    }

    /// Consume items. Food and drink reduce the matching need and reset its
    /// clock; heal, damage, and ammo consumables only burn stock here (they
    /// act through the heal, damage, and reload operations).
    pub async fn consume_item(
        &self,
        actor: Actor,
        name: &str,
        quantity: i32,
    ) -> EngineResult<ConsumeResult> {
        if quantity < 1 {
            return Err(EngineError::validation("Quantity must be at least 1"));
        }
        let held = InventoryRepo::find(&self.pool, actor.id, name)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", name))?;
        if quantity > held.quantity {
            return Err(EngineError::conflict(format!(
                "Only {} x '{}' held",
                held.quantity, held.name
            )));
        }
        let entry = CatalogRepo::find(&self.pool, &held.name)
            .await?
            .ok_or_else(|| EngineError::not_found("catalog item", &held.name))?;
        if !entry.consumable {
            return Err(EngineError::validation(format!(
                "'{}' is not consumable",
                entry.name
            )));
        }
        let effect = EffectKind::from_str(&entry.effect)?;

        // Need adjustment, clock reset, and stock debit commit together.
        let mut tx = self.pool.begin().await?;
        let mut hunger_reduced = 0;
        let mut thirst_reduced = 0;
        match effect {
            EffectKind::Food => {
                hunger_reduced = entry.restore_hunger * quantity;
                CharacterRepo::adjust_need_levels(&mut *tx, actor.id, -hunger_reduced, 0, 0)
                    .await?;
                self.register_consumption(&mut tx, actor.id, NeedKind::Hunger)
                    .await?;
            }
            EffectKind::Drink => {
                thirst_reduced = entry.restore_thirst * quantity;
                CharacterRepo::adjust_need_levels(&mut *tx, actor.id, 0, -thirst_reduced, 0)
                    .await?;
                self.register_consumption(&mut tx, actor.id, NeedKind::Thirst)
                    .await?;
            }
            _ => {}
        }
        InventoryRepo::adjust_quantity_tx(&mut tx, actor.id, &held.name, -quantity)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", &held.name))?;
        tx.commit().await?;

        Ok(ConsumeResult {
            item_name: entry.name,
            quantity,
            effect,
            magnitude: entry.magnitude,
            hunger_reduced,
            thirst_reduced,
        })
    }

    /// Current weight status for a character.
    pub(crate) async fn weight_status(&self, character_id: DbId) -> EngineResult<WeightStatus> {
        let character = self.require_character(character_id).await?;
        let items = InventoryRepo::list(&self.pool, character_id).await?;
        Ok(WeightStatus::compute(
            total_weight(items.iter().map(|i| (i.weight, i.quantity))),
            character.max_carry_weight,
        ))
    }

    /// Build an inventory credit from a catalog entry.
    pub(crate) fn credit_from_catalog(
        entry: &deadline_db::models::catalog::CatalogItem,
        quantity: i32,
    ) -> CreditItem {
        let (ammo_current, ammo_max) = if entry.is_ranged_weapon() {
            (Some(entry.ammo_loaded), Some(entry.ammo_capacity))
        } else {
            (None, None)
        };
        CreditItem {
            name: entry.name.clone(),
            weight: entry.weight,
            quantity,
            ammo_current,
            ammo_max,
        }
    }
}
