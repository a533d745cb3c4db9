//! Survival-need levels derived from elapsed time, and sleep recovery math.
//!
//! Need levels are never ticked by a background process. They are recomputed
//! on demand from the wall-clock time since the last consumption event,
//! scaled by how long the character's resistance lets them hold out.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Level at or above which a need is critical and the character is warned.
pub const CRITICAL_THRESHOLD: i32 = 90;

/// Points of sleep debt recovered per hour slept.
pub const SLEEP_RECOVERY_PER_HOUR: i32 = 12;

/// Fraction of max HP/SP recoverable by one fully effective sleep.
pub const SLEEP_VITAL_RECOVERY: f64 = 0.2;

/// Hunger gained per hour slept.
pub const SLEEP_HUNGER_PER_HOUR: i32 = 2;

/// Thirst gained per hour slept.
pub const SLEEP_THIRST_PER_HOUR: i32 = 1;

/// Accepted range for the hours argument of the sleep operation.
pub const MIN_SLEEP_HOURS: i64 = 1;
pub const MAX_SLEEP_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Need kinds and levels
// ---------------------------------------------------------------------------

/// The three survival needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    Hunger,
    Thirst,
    Sleep,
}

impl NeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hunger => "hunger",
            Self::Thirst => "thirst",
            Self::Sleep => "sleep",
        }
    }
}

/// Derive a need level from hours elapsed since the last consumption event.
///
/// Saturates at 100 once `max_hours` has passed; below that the level grows
/// linearly, truncated to an integer. Idempotent for a fixed input.
pub fn level_after(elapsed_hours: f64, max_hours: i64) -> i32 {
    if elapsed_hours >= max_hours as f64 {
        100
    } else if elapsed_hours <= 0.0 {
        0
    } else {
        (100.0 * elapsed_hours / max_hours as f64) as i32
    }
}

/// Clamp a need level into its legal range.
pub fn clamp_level(level: i32) -> i32 {
    level.clamp(0, 100)
}

/// Severity band of a need level, for the status result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedBand {
    /// Below 25: sated / hydrated / rested.
    Sated,
    /// 25..50.
    Mild,
    /// 50..75.
    Moderate,
    /// 75..90.
    Severe,
    /// 90 and up.
    Critical,
}

impl NeedBand {
    pub fn from_level(level: i32) -> Self {
        match level {
            i32::MIN..=24 => Self::Sated,
            25..=49 => Self::Mild,
            50..=74 => Self::Moderate,
            75..=89 => Self::Severe,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sated => "sated",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Critical => "critical",
        }
    }
}

// ---------------------------------------------------------------------------
// Sleep recovery
// ---------------------------------------------------------------------------

/// Outcome of a sleep of `hours`, before clamping against current vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepRecovery {
    /// Sleep debt actually paid off.
    pub debt_recovered: i32,
    /// HP regained (to be clamped at HP max by the caller).
    pub hp_recovered: i32,
    /// SP regained (to be clamped at SP max by the caller).
    pub sp_recovered: i32,
    /// Hunger gained while sleeping.
    pub hunger_increase: i32,
    /// Thirst gained while sleeping.
    pub thirst_increase: i32,
}

/// Validate the hours argument of the sleep operation.
pub fn validate_sleep_hours(hours: i64) -> Result<(), CoreError> {
    if !(MIN_SLEEP_HOURS..=MAX_SLEEP_HOURS).contains(&hours) {
        return Err(CoreError::Validation(format!(
            "Sleep hours must be between {MIN_SLEEP_HOURS} and {MAX_SLEEP_HOURS}, got {hours}"
        )));
    }
    Ok(())
}

/// Compute what a sleep of `hours` recovers for a character carrying
/// `sleep_debt`.
///
/// HP/SP recovery scales with the fraction of the pre-sleep debt paid off.
/// The divisor keeps a floor of 1, and a debt of exactly 0 recovers
/// nothing.
pub fn sleep_recovery(hours: i64, sleep_debt: i32, hp_max: i32, sp_max: i32) -> SleepRecovery {
    let debt_recovered = sleep_debt.min(hours as i32 * SLEEP_RECOVERY_PER_HOUR).max(0);
    let proportion = if sleep_debt > 0 {
        debt_recovered as f64 / sleep_debt.max(1) as f64
    } else {
        0.0
    };
    SleepRecovery {
        debt_recovered,
        hp_recovered: (hp_max as f64 * SLEEP_VITAL_RECOVERY * proportion) as i32,
        sp_recovered: (sp_max as f64 * SLEEP_VITAL_RECOVERY * proportion) as i32,
        hunger_increase: hours as i32 * SLEEP_HUNGER_PER_HOUR,
        thirst_increase: hours as i32 * SLEEP_THIRST_PER_HOUR,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_level_saturates_at_max_hours() {
        assert_eq!(level_after(24.0, 24), 100);
        assert_eq!(level_after(30.0, 24), 100);
    }

    #[test]
    fn test_level_grows_linearly() {
        assert_eq!(level_after(12.0, 24), 50);
        assert_eq!(level_after(6.0, 24), 25);
        assert_eq!(level_after(0.0, 24), 0);
        // Truncated, not rounded.
        assert_eq!(level_after(23.9, 24), 99);
    }

    #[test]
    fn test_level_is_idempotent() {
        let a = level_after(17.3, 48);
        let b = level_after(17.3, 48);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bands() {
        assert_eq!(NeedBand::from_level(0), NeedBand::Sated);
        assert_eq!(NeedBand::from_level(24), NeedBand::Sated);
        assert_eq!(NeedBand::from_level(25), NeedBand::Mild);
        assert_eq!(NeedBand::from_level(60), NeedBand::Moderate);
        assert_eq!(NeedBand::from_level(89), NeedBand::Severe);
        assert_eq!(NeedBand::from_level(90), NeedBand::Critical);
        assert_eq!(NeedBand::from_level(100), NeedBand::Critical);
    }

    #[test]
    fn test_sleep_hours_validation() {
        assert!(validate_sleep_hours(1).is_ok());
        assert!(validate_sleep_hours(24).is_ok());
        assert_matches!(validate_sleep_hours(0), Err(CoreError::Validation(_)));
        assert_matches!(validate_sleep_hours(25), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_sleep_recovery_partial_debt() {
        // Debt 60, 3h sleep: pays 36 debt, 60% of the full 20% vital pool.
        let rec = sleep_recovery(3, 60, 40, 30);
        assert_eq!(rec.debt_recovered, 36);
        assert_eq!(rec.hp_recovered, (40.0 * 0.2 * 0.6) as i32); // 4
        assert_eq!(rec.sp_recovered, (30.0 * 0.2 * 0.6) as i32); // 3
        assert_eq!(rec.hunger_increase, 6);
        assert_eq!(rec.thirst_increase, 3);
    }

    #[test]
    fn test_sleep_recovery_full_debt() {
        let rec = sleep_recovery(8, 50, 40, 40);
        assert_eq!(rec.debt_recovered, 50);
        assert_eq!(rec.hp_recovered, 8);
        assert_eq!(rec.sp_recovered, 8);
    }

    #[test]
    fn test_sleep_with_zero_debt_recovers_nothing() {
        let rec = sleep_recovery(8, 0, 40, 40);
        assert_eq!(rec.debt_recovered, 0);
        assert_eq!(rec.hp_recovered, 0);
        assert_eq!(rec.sp_recovered, 0);
        // Needs still rise while sleeping.
        assert_eq!(rec.hunger_increase, 16);
        assert_eq!(rec.thirst_increase, 8);
    }
}
