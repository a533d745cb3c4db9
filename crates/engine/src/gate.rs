//! Per-character sheet-edit gates.
//!
//! A character must open an edit window before submitting a full sheet
//! edit. The gate is a stored opened-at timestamp checked lazily on every
//! access, so it survives without any live timer object; re-opening
//! restarts the window.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Duration;

use deadline_core::types::{DbId, Timestamp};

/// How long an opened edit window accepts a submission.
pub const EDIT_GATE_TTL_SECS: i64 = 300;

/// Registry of open edit windows, one at most per character.
#[derive(Default)]
pub struct EditGateRegistry {
    inner: Mutex<HashMap<DbId, Timestamp>>,
}

impl EditGateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open, restarting the timer) a character's edit window.
    /// Returns when the window will close.
    pub fn open(&self, character_id: DbId, now: Timestamp) -> Timestamp {
        let mut map = self.inner.lock().expect("gate lock poisoned");
        map.insert(character_id, now);
        now + Duration::seconds(EDIT_GATE_TTL_SECS)
    }

    /// Whether a character's window is currently open. An expired entry is
    /// dropped on the way out.
    pub fn is_open(&self, character_id: DbId, now: Timestamp) -> bool {
        let mut map = self.inner.lock().expect("gate lock poisoned");
        match map.get(&character_id) {
            Some(opened_at) if now - *opened_at <= Duration::seconds(EDIT_GATE_TTL_SECS) => true,
            Some(_) => {
                map.remove(&character_id);
                false
            }
            None => false,
        }
    }

    /// Consume an open window (a successful submission closes it).
    /// Returns `false` when no live window exists.
    pub fn consume(&self, character_id: DbId, now: Timestamp) -> bool {
        let mut map = self.inner.lock().expect("gate lock poisoned");
        match map.remove(&character_id) {
            Some(opened_at) => now - opened_at <= Duration::seconds(EDIT_GATE_TTL_SECS),
            None => false,
        }
    }

    /// Drop every expired window. Returns how many went away.
    pub fn sweep(&self, now: Timestamp) -> usize {
        let mut map = self.inner.lock().expect("gate lock poisoned");
        let before = map.len();
        map.retain(|_, opened_at| now - *opened_at <= Duration::seconds(EDIT_GATE_TTL_SECS));
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_open_then_consume() {
        let gates = EditGateRegistry::new();
        let now = Utc::now();
        gates.open(7, now);
        assert!(gates.is_open(7, now));
        assert!(gates.consume(7, now));
        // Consumed means gone.
        assert!(!gates.is_open(7, now));
        assert!(!gates.consume(7, now));
    }

    #[test]
    fn test_window_expires() {
        let gates = EditGateRegistry::new();
        let now = Utc::now();
        gates.open(7, now);

        let late = now + Duration::seconds(EDIT_GATE_TTL_SECS + 1);
        assert!(!gates.is_open(7, late));
        assert!(!gates.consume(7, late));
    }

    #[test]
    fn test_reopening_restarts_the_timer() {
        let gates = EditGateRegistry::new();
        let now = Utc::now();
        gates.open(7, now);

        // Re-open 200 s in; the window now runs until 500 s.
        let mid = now + Duration::seconds(200);
        gates.open(7, mid);
        let late = now + Duration::seconds(400);
        assert!(gates.is_open(7, late));
    }

    #[test]
    fn test_sweep_reports_removals() {
        let gates = EditGateRegistry::new();
        let now = Utc::now();
        gates.open(1, now);
        gates.open(2, now + Duration::seconds(250));

        let at = now + Duration::seconds(EDIT_GATE_TTL_SECS + 10);
        assert_eq!(gates.sweep(at), 1);
        assert!(gates.is_open(2, at));
    }
}
