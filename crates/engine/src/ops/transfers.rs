//! Two-party item transfers staged through the broker.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use deadline_core::encumbrance::{total_weight, WeightStatus};
use deadline_core::types::{DbId, Timestamp};
use deadline_db::models::inventory::CreditItem;
use deadline_db::repositories::{CatalogRepo, InventoryRepo};

use crate::broker::{PendingKind, PendingPayload, PendingTransfer};
use crate::{Actor, Engine, EngineError, EngineResult};

/// A staged transfer awaiting the recipient.
#[derive(Debug, Clone, Serialize)]
pub struct TransferProposal {
    pub transaction_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub expires_at: Timestamp,
    /// Kilograms the recipient would be over capacity after accepting.
    pub recipient_overload: Option<f64>,
}

/// A completed transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub item_name: String,
    pub quantity: i32,
    pub donor_weight: WeightStatus,
    pub recipient_weight: WeightStatus,
}

impl Engine {
    /// Propose giving `quantity` of an item to another character.
    ///
    /// Ordinary donors must hold the items; a privileged donor without them
    /// sources the entry fresh from the catalog on confirmation.
    pub async fn propose_transfer(
        &self,
        actor: Actor,
        recipient: DbId,
        name: &str,
        quantity: i32,
    ) -> EngineResult<TransferProposal> {
        if quantity < 1 {
            return Err(EngineError::validation("Quantity must be at least 1"));
        }
        if recipient == actor.id {
            return Err(EngineError::validation("Cannot transfer to yourself"));
        }
        self.require_character(actor.id).await?;
        let recipient_char = self.require_character(recipient).await?;

        let held = InventoryRepo::find(&self.pool, actor.id, name).await?;
        let (item_name, unit_weight, from_catalog) = match held {
            Some(item) => {
                if quantity > item.quantity {
                    return Err(EngineError::conflict(format!(
                        "Only {} x '{}' held",
                        item.quantity, item.name
                    )));
                }
                (item.name, item.weight, false)
            }
            None if actor.privileged => {
                let entry = CatalogRepo::find(&self.pool, name)
                    .await?
                    .ok_or_else(|| EngineError::not_found("catalog item", name))?;
                (entry.name, entry.weight, true)
            }
            None => return Err(EngineError::not_found("inventory item", name)),
        };

        // Warn the recipient up front if accepting would overload them.
        let recipient_items = InventoryRepo::list(&self.pool, recipient).await?;
        let projected = total_weight(recipient_items.iter().map(|i| (i.weight, i.quantity)))
            + unit_weight * quantity as f64;
        let recipient_overload = (projected > recipient_char.max_carry_weight)
            .then(|| projected - recipient_char.max_carry_weight);

        let staged = self.broker.propose_transfer(
            PendingTransfer {
                donor: actor.id,
                recipient,
                item_name: item_name.clone(),
                quantity,
                from_catalog,
            },
            Utc::now(),
        );
        Ok(TransferProposal {
            transaction_id: staged.id,
            item_name,
            quantity,
            expires_at: staged.expires_at,
            recipient_overload,
        })
    }

    /// Confirm a staged transfer (recipient only).
    ///
    /// Debit and credit run in one transaction: the donor's stack is
    /// re-verified under a row lock, and the recipient's entry picks up the
    /// item's current catalog metadata. Verification failure aborts with no
    /// partial mutation.
    pub async fn confirm_transfer(
        &self,
        actor: Actor,
        transaction_id: Uuid,
    ) -> EngineResult<TransferReceipt> {
        let record = self
            .broker
            .confirm(transaction_id, actor.id, PendingKind::Transfer, Utc::now())?;
        let PendingPayload::Transfer(transfer) = record.payload else {
            return Err(EngineError::not_found("pending transaction", transaction_id));
        };

        let catalog_entry = CatalogRepo::find(&self.pool, &transfer.item_name).await?;

        let mut tx = self.pool.begin().await?;
        let credit = if transfer.from_catalog {
            let entry = catalog_entry
                .as_ref()
                .ok_or_else(|| EngineError::not_found("catalog item", &transfer.item_name))?;
            Self::credit_from_catalog(entry, transfer.quantity)
        } else {
            let donor_item =
                InventoryRepo::find_for_update(&mut tx, transfer.donor, &transfer.item_name)
                    .await?
                    .ok_or_else(|| {
                        EngineError::conflict(format!(
                            "Donor no longer holds '{}'",
                            transfer.item_name
                        ))
                    })?;
            if donor_item.quantity < transfer.quantity {
                return Err(EngineError::conflict(format!(
                    "Donor holds only {} x '{}'",
                    donor_item.quantity, donor_item.name
                )));
            }
            InventoryRepo::set_quantity_or_remove(
                &mut tx,
                transfer.donor,
                &transfer.item_name,
                donor_item.quantity - transfer.quantity,
            )
            .await?;

            // Weight follows the catalog when the item is listed there;
            // ammo state travels with the donor's entry.
            CreditItem {
                name: donor_item.name.clone(),
                weight: catalog_entry
                    .as_ref()
                    .map(|e| e.weight)
                    .unwrap_or(donor_item.weight),
                quantity: transfer.quantity,
                ammo_current: donor_item.ammo_current,
                ammo_max: donor_item.ammo_max,
            }
        };
        InventoryRepo::credit(&mut tx, transfer.recipient, &credit).await?;
        tx.commit().await?;

        tracing::info!(
            donor = transfer.donor,
            recipient = transfer.recipient,
            item = %transfer.item_name,
            quantity = transfer.quantity,
            "Transfer confirmed"
        );
        Ok(TransferReceipt {
            item_name: transfer.item_name,
            quantity: transfer.quantity,
            donor_weight: self.weight_status(transfer.donor).await?,
            recipient_weight: self.weight_status(transfer.recipient).await?,
        })
    }

    /// Cancel a staged transfer (either party).
    pub async fn cancel_transfer(&self, actor: Actor, transaction_id: Uuid) -> EngineResult<()> {
        self.broker
            .cancel(transaction_id, actor.id, PendingKind::Transfer, Utc::now())?;
        Ok(())
    }
}
