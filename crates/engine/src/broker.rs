//! Volatile two-party transaction broker.
//!
//! Pending transfers and reloads live only in process memory, keyed by a
//! transaction id. They are not durable: a restart drops them and the user
//! sees "not found" on confirmation, which is acceptable by design. Expiry
//! is checked lazily whenever a record is touched and swept periodically by
//! the upkeep operation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;

use deadline_core::types::{DbId, Timestamp};
use deadline_core::CoreError;

/// How long a proposal stays confirmable.
pub const TRANSACTION_TTL_SECS: i64 = 300;

// ---------------------------------------------------------------------------
// Pending payloads
// ---------------------------------------------------------------------------

/// A proposed item transfer awaiting the recipient's confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTransfer {
    pub donor: DbId,
    pub recipient: DbId,
    /// Canonical (display) item name resolved at proposal time.
    pub item_name: String,
    pub quantity: i32,
    /// Privileged donors source the item from the catalog with no debit.
    pub from_catalog: bool,
}

/// A proposed weapon reload awaiting its actor's confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingReload {
    pub actor: DbId,
    pub ammo_name: String,
    pub weapon_name: String,
    /// `min(requested, rounds on hand, capacity remaining)` at proposal
    /// time; re-validated when confirmed.
    pub rounds: i32,
}

/// The two transaction kinds the broker stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PendingPayload {
    Transfer(PendingTransfer),
    Reload(PendingReload),
}

/// Kind discriminator used when looking up a staged transaction, so a
/// transfer id handed to the reload flow (or vice versa) reads as unknown
/// instead of being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    Transfer,
    Reload,
}

impl PendingPayload {
    pub fn kind(&self) -> PendingKind {
        match self {
            Self::Transfer(_) => PendingKind::Transfer,
            Self::Reload(_) => PendingKind::Reload,
        }
    }
}

/// One staged transaction.
#[derive(Debug, Clone, Serialize)]
pub struct PendingTransaction {
    pub id: Uuid,
    pub payload: PendingPayload,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl PendingTransaction {
    fn new(payload: PendingPayload, now: Timestamp) -> Self {
        Self {
            id: Uuid::now_v7(),
            payload,
            created_at: now,
            expires_at: now + Duration::seconds(TRANSACTION_TTL_SECS),
        }
    }

    fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

// ---------------------------------------------------------------------------
// Broker
// ---------------------------------------------------------------------------

/// Keyed in-memory store for pending transactions.
#[derive(Default)]
pub struct TransactionBroker {
    inner: Mutex<HashMap<Uuid, PendingTransaction>>,
}

impl TransactionBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a transfer. Any number of transfers may be outstanding at once.
    pub fn propose_transfer(&self, transfer: PendingTransfer, now: Timestamp) -> PendingTransaction {
        let record = PendingTransaction::new(PendingPayload::Transfer(transfer), now);
        let mut map = self.inner.lock().expect("broker lock poisoned");
        map.insert(record.id, record.clone());
        record
    }

    /// Stage a reload. A new proposal replaces the actor's previous one.
    pub fn propose_reload(&self, reload: PendingReload, now: Timestamp) -> PendingTransaction {
        let mut map = self.inner.lock().expect("broker lock poisoned");
        map.retain(|_, record| {
            !matches!(&record.payload, PendingPayload::Reload(r) if r.actor == reload.actor)
        });
        let record = PendingTransaction::new(PendingPayload::Reload(reload), now);
        map.insert(record.id, record.clone());
        record
    }

    /// Look up a transaction without touching it (expired records report as
    /// absent).
    pub fn find(&self, id: Uuid, now: Timestamp) -> Option<PendingTransaction> {
        let map = self.inner.lock().expect("broker lock poisoned");
        map.get(&id).filter(|r| !r.is_expired(now)).cloned()
    }

    /// Take a transaction for confirmation by `actor`.
    ///
    /// Transfers may only be confirmed by their recipient; reloads only by
    /// their actor. An expired record is purged and reported as a conflict;
    /// a confirmation by the wrong party (or through the wrong flow) leaves
    /// the record staged.
    pub fn confirm(
        &self,
        id: Uuid,
        actor: DbId,
        expected: PendingKind,
        now: Timestamp,
    ) -> Result<PendingTransaction, CoreError> {
        let mut map = self.inner.lock().expect("broker lock poisoned");
        let record = map
            .get(&id)
            .filter(|r| r.payload.kind() == expected)
            .ok_or_else(|| CoreError::not_found("pending transaction", id))?;

        if record.is_expired(now) {
            map.remove(&id);
            return Err(CoreError::Conflict("Transaction expired".to_string()));
        }
        let allowed = match &record.payload {
            PendingPayload::Transfer(t) => t.recipient == actor,
            PendingPayload::Reload(r) => r.actor == actor,
        };
        if !allowed {
            return Err(CoreError::Conflict(
                "Only the designated counterpart can confirm this transaction".to_string(),
            ));
        }
        Ok(map.remove(&id).expect("record checked above"))
    }

    /// Cancel a transaction. Either transfer party may cancel; a reload only
    /// by its actor.
    pub fn cancel(
        &self,
        id: Uuid,
        actor: DbId,
        expected: PendingKind,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        let mut map = self.inner.lock().expect("broker lock poisoned");
        let record = map
            .get(&id)
            .filter(|r| r.payload.kind() == expected)
            .ok_or_else(|| CoreError::not_found("pending transaction", id))?;

        if record.is_expired(now) {
            map.remove(&id);
            return Err(CoreError::Conflict("Transaction expired".to_string()));
        }
        let allowed = match &record.payload {
            PendingPayload::Transfer(t) => t.donor == actor || t.recipient == actor,
            PendingPayload::Reload(r) => r.actor == actor,
        };
        if !allowed {
            return Err(CoreError::Conflict(
                "Only an involved party can cancel this transaction".to_string(),
            ));
        }
        map.remove(&id);
        Ok(())
    }

    /// Drop every expired record. Returns how many went away.
    pub fn sweep(&self, now: Timestamp) -> usize {
        let mut map = self.inner.lock().expect("broker lock poisoned");
        let before = map.len();
        map.retain(|_, record| !record.is_expired(now));
        before - map.len()
    }

    /// Number of currently staged records (expired ones included until the
    /// next sweep).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("broker lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn transfer(donor: DbId, recipient: DbId) -> PendingTransfer {
        PendingTransfer {
            donor,
            recipient,
            item_name: "Rope".to_string(),
            quantity: 2,
            from_catalog: false,
        }
    }

    fn reload(actor: DbId) -> PendingReload {
        PendingReload {
            actor,
            ammo_name: "9mm Rounds".to_string(),
            weapon_name: "Pistol".to_string(),
            rounds: 4,
        }
    }

    #[test]
    fn test_confirm_by_recipient_removes_record() {
        let broker = TransactionBroker::new();
        let now = Utc::now();
        let staged = broker.propose_transfer(transfer(1, 2), now);

        let taken = broker.confirm(staged.id, 2, PendingKind::Transfer, now).unwrap();
        assert_eq!(taken.id, staged.id);
        assert!(broker.is_empty());

        // A second confirmation sees nothing.
        assert_matches!(
            broker.confirm(staged.id, 2, PendingKind::Transfer, now),
            Err(CoreError::NotFound { .. })
        );
    }

    #[test]
    fn test_confirm_by_wrong_party_keeps_record() {
        let broker = TransactionBroker::new();
        let now = Utc::now();
        let staged = broker.propose_transfer(transfer(1, 2), now);

        // The donor cannot confirm their own offer.
        assert_matches!(broker.confirm(staged.id, 1, PendingKind::Transfer, now), Err(CoreError::Conflict(_)));
        assert_eq!(broker.len(), 1);

        // A bystander cannot cancel either.
        assert_matches!(broker.cancel(staged.id, 99, PendingKind::Transfer, now), Err(CoreError::Conflict(_)));
        assert_eq!(broker.len(), 1);
    }

    #[test]
    fn test_either_party_cancels_transfer() {
        let broker = TransactionBroker::new();
        let now = Utc::now();

        let staged = broker.propose_transfer(transfer(1, 2), now);
        broker.cancel(staged.id, 1, PendingKind::Transfer, now).unwrap();

        let staged = broker.propose_transfer(transfer(1, 2), now);
        broker.cancel(staged.id, 2, PendingKind::Transfer, now).unwrap();
        assert!(broker.is_empty());
    }

    #[test]
    fn test_expired_confirmation_is_conflict_and_purges() {
        let broker = TransactionBroker::new();
        let now = Utc::now();
        let staged = broker.propose_transfer(transfer(1, 2), now);

        let late = now + Duration::seconds(TRANSACTION_TTL_SECS + 1);
        assert_matches!(broker.confirm(staged.id, 2, PendingKind::Transfer, late), Err(CoreError::Conflict(_)));
        assert!(broker.is_empty());
    }

    #[test]
    fn test_transfers_coexist_but_reloads_replace() {
        let broker = TransactionBroker::new();
        let now = Utc::now();

        broker.propose_transfer(transfer(1, 2), now);
        broker.propose_transfer(transfer(1, 2), now);
        assert_eq!(broker.len(), 2);

        let first = broker.propose_reload(reload(5), now);
        let second = broker.propose_reload(reload(5), now);
        assert_eq!(broker.len(), 3);
        assert!(broker.find(first.id, now).is_none());
        assert!(broker.find(second.id, now).is_some());

        // Another actor's reload is untouched.
        let other = broker.propose_reload(reload(6), now);
        assert_eq!(broker.len(), 4);
        assert!(broker.find(other.id, now).is_some());
    }

    #[test]
    fn test_sweep_drops_only_expired() {
        let broker = TransactionBroker::new();
        let now = Utc::now();
        broker.propose_transfer(transfer(1, 2), now);
        let later = now + Duration::seconds(200);
        broker.propose_transfer(transfer(3, 4), later);

        // At now + 301 the first is expired, the second is not.
        let sweep_at = now + Duration::seconds(TRANSACTION_TTL_SECS + 1);
        assert_eq!(broker.sweep(sweep_at), 1);
        assert_eq!(broker.len(), 1);
    }

    #[test]
    fn test_reload_confirm_only_by_actor() {
        let broker = TransactionBroker::new();
        let now = Utc::now();
        let staged = broker.propose_reload(reload(5), now);

        assert_matches!(broker.confirm(staged.id, 6, PendingKind::Reload, now), Err(CoreError::Conflict(_)));
        assert!(broker.confirm(staged.id, 5, PendingKind::Reload, now).is_ok());
    }
}
