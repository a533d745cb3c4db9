//! In-process eventing for the engine: a broadcast bus the dispatcher can
//! subscribe to, and the best-effort notification port for needs alerts.

pub mod bus;
pub mod notify;

pub use bus::{EngineEvent, EventBus};
pub use notify::{BusSink, NeedsAlert, NotificationSink, NotifyError};
