//! Weapon reloads staged through the broker.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use deadline_core::items::EffectKind;
use deadline_core::normalize::normalize;
use deadline_core::types::Timestamp;
use deadline_db::repositories::{CatalogRepo, InventoryRepo};

use crate::broker::{PendingKind, PendingPayload, PendingReload};
use crate::{Actor, Engine, EngineError, EngineResult};

/// A staged reload awaiting its actor's confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadProposal {
    pub transaction_id: Uuid,
    pub weapon_name: String,
    pub ammo_name: String,
    /// Rounds that will be chambered: `min(requested, on hand, capacity
    /// remaining)` at proposal time.
    pub rounds: i32,
    pub ammo_current: i32,
    pub ammo_max: i32,
    pub expires_at: Timestamp,
}

/// A completed reload.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadReceipt {
    pub weapon_name: String,
    pub ammo_name: String,
    pub rounds_loaded: i32,
    pub ammo_before: i32,
    pub ammo_after: i32,
    pub ammo_max: i32,
}

impl Engine {
    /// Propose loading a weapon from an ammunition stack.
    ///
    /// The ammo item must be a catalog ammo consumable the weapon accepts,
    /// the weapon must be ranged and below capacity, and both must be in
    /// the actor's inventory.
    pub async fn propose_reload(
        &self,
        actor: Actor,
        ammo_name: &str,
        weapon_name: &str,
        requested: i32,
    ) -> EngineResult<ReloadProposal> {
        if requested < 1 {
            return Err(EngineError::validation("Requested rounds must be at least 1"));
        }
        self.require_character(actor.id).await?;

        let ammo_item = InventoryRepo::find(&self.pool, actor.id, ammo_name)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", ammo_name))?;
        let weapon_item = InventoryRepo::find(&self.pool, actor.id, weapon_name)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", weapon_name))?;

        let ammo_entry = CatalogRepo::find(&self.pool, &ammo_item.name)
            .await?
            .ok_or_else(|| EngineError::not_found("catalog item", &ammo_item.name))?;
        let weapon_entry = CatalogRepo::find(&self.pool, &weapon_item.name)
            .await?
            .ok_or_else(|| EngineError::not_found("catalog item", &weapon_item.name))?;

        if !ammo_entry.consumable || EffectKind::from_str(&ammo_entry.effect)? != EffectKind::Ammo {
            return Err(EngineError::validation(format!(
                "'{}' is not ammunition",
                ammo_entry.name
            )));
        }
        if !weapon_entry.is_ranged_weapon() {
            return Err(EngineError::validation(format!(
                "'{}' is not a ranged weapon",
                weapon_entry.name
            )));
        }
        if !weapon_entry
            .compatible_ammo_keys()
            .contains(&normalize(&ammo_item.name))
        {
            return Err(EngineError::validation(format!(
                "'{}' does not accept '{}'",
                weapon_entry.name, ammo_entry.name
            )));
        }

        let ammo_current = weapon_item.ammo_current.unwrap_or(0);
        let ammo_max = weapon_item.ammo_max.unwrap_or(weapon_entry.ammo_capacity);
        if ammo_current >= ammo_max {
            return Err(EngineError::conflict(format!(
                "'{}' is already fully loaded",
                weapon_item.name
            )));
        }

        let rounds = requested.min(ammo_item.quantity).min(ammo_max - ammo_current);
        if rounds < 1 {
            return Err(EngineError::conflict(
                "Nothing to load (check rounds on hand and remaining capacity)",
            ));
        }

        let staged = self.broker.propose_reload(
            PendingReload {
                actor: actor.id,
                ammo_name: ammo_item.name.clone(),
                weapon_name: weapon_item.name.clone(),
                rounds,
            },
            Utc::now(),
        );
        Ok(ReloadProposal {
            transaction_id: staged.id,
            weapon_name: weapon_item.name,
            ammo_name: ammo_item.name,
            rounds,
            ammo_current,
            ammo_max,
            expires_at: staged.expires_at,
        })
    }

    /// Confirm a staged reload (its actor only).
    ///
    /// The transferable amount is recomputed under row locks, the ammo
    /// stack is debited, and the weapon never ends above capacity; all in
    /// one transaction.
    pub async fn confirm_reload(
        &self,
        actor: Actor,
        transaction_id: Uuid,
    ) -> EngineResult<ReloadReceipt> {
        let record = self
            .broker
            .confirm(transaction_id, actor.id, PendingKind::Reload, Utc::now())?;
        let PendingPayload::Reload(reload) = record.payload else {
            return Err(EngineError::not_found("pending transaction", transaction_id));
        };

        let mut tx = self.pool.begin().await?;
        let ammo_item = InventoryRepo::find_for_update(&mut tx, reload.actor, &reload.ammo_name)
            .await?
            .ok_or_else(|| {
                EngineError::conflict(format!("No '{}' left to load", reload.ammo_name))
            })?;
        let weapon_item =
            InventoryRepo::find_for_update(&mut tx, reload.actor, &reload.weapon_name)
                .await?
                .ok_or_else(|| {
                    EngineError::conflict(format!("'{}' is no longer held", reload.weapon_name))
                })?;

        let ammo_before = weapon_item.ammo_current.unwrap_or(0);
        let ammo_max = weapon_item.ammo_max.unwrap_or(0);
        let rounds = reload
            .rounds
            .min(ammo_item.quantity)
            .min(ammo_max - ammo_before);
        if rounds < 1 {
            return Err(EngineError::conflict(
                "Nothing to load (check rounds on hand and remaining capacity)",
            ));
        }

        InventoryRepo::set_quantity_or_remove(
            &mut tx,
            reload.actor,
            &reload.ammo_name,
            ammo_item.quantity - rounds,
        )
        .await?;
        let ammo_after = (ammo_before + rounds).min(ammo_max);
        InventoryRepo::set_ammo(&mut tx, reload.actor, &reload.weapon_name, ammo_after).await?;
        tx.commit().await?;

        tracing::info!(
            actor = reload.actor,
            weapon = %reload.weapon_name,
            rounds,
            "Reload confirmed"
        );
        Ok(ReloadReceipt {
            weapon_name: reload.weapon_name,
            ammo_name: reload.ammo_name,
            rounds_loaded: rounds,
            ammo_before,
            ammo_after,
            ammo_max,
        })
    }

    /// Cancel a staged reload (its actor only).
    pub async fn cancel_reload(&self, actor: Actor, transaction_id: Uuid) -> EngineResult<()> {
        self.broker
            .cancel(transaction_id, actor.id, PendingKind::Reload, Utc::now())?;
        Ok(())
    }
}
