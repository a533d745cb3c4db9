//! The character engine: one operation per user-facing action, invoked by
//! an external dispatcher with a resolved actor.
//!
//! The engine owns every stateful rule — vitals, needs decay, inventory
//! weight, staged transfers/reloads, dice resolution — and talks to three
//! collaborators: the Postgres store (`deadline-db`), the event bus
//! (`deadline-events`), and a best-effort notification sink. Text parsing
//! and reply rendering stay outside.

pub mod broker;
pub mod error;
pub mod gate;
pub mod ops;

use std::sync::Arc;

use deadline_core::types::DbId;
use deadline_db::DbPool;
use deadline_events::{BusSink, EventBus, NotificationSink};

use crate::broker::TransactionBroker;
use crate::gate::EditGateRegistry;

pub use crate::error::{EngineError, EngineResult};

/// A validated caller identity, resolved by the dispatcher.
///
/// Privilege gates catalog administration, fresh-from-catalog transfer
/// sourcing, and reading other characters' sheets. How a caller earns it
/// (admin lists, chat roles) is the dispatcher's business.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: DbId,
    pub privileged: bool,
}

impl Actor {
    /// An ordinary player.
    pub fn player(id: DbId) -> Self {
        Self {
            id,
            privileged: false,
        }
    }

    /// A privileged (administrative) caller.
    pub fn admin(id: DbId) -> Self {
        Self {
            id,
            privileged: true,
        }
    }
}

/// The engine instance. One per process; cheap to share behind an `Arc`.
pub struct Engine {
    pool: DbPool,
    bus: Arc<EventBus>,
    sink: Arc<dyn NotificationSink>,
    broker: TransactionBroker,
    gates: EditGateRegistry,
}

impl Engine {
    /// Build an engine over a connection pool with a fresh event bus and
    /// the default bus-backed notification sink.
    pub fn new(pool: DbPool) -> Self {
        Self::with_bus(pool, Arc::new(EventBus::new()))
    }

    /// Build an engine publishing on an existing bus.
    pub fn with_bus(pool: DbPool, bus: Arc<EventBus>) -> Self {
        let sink = Arc::new(BusSink::new(bus.clone()));
        Self {
            pool,
            bus,
            sink,
            broker: TransactionBroker::new(),
            gates: EditGateRegistry::new(),
        }
    }

    /// Replace the notification sink (the dispatcher's direct channel).
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The bus this engine publishes on.
    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }
}
