//! Dice parsing and resolution.
//!
//! Two input shapes exist: plain `<count>d<sides>` notation stored on
//! catalog entries (weapon damage, damage consumables), and the free-form
//! roll expression players type, which allows an omitted count and a
//! trailing `+<bonus>` but is range-restricted. Malformed or out-of-range
//! input is rejected outright, never clamped.

use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Die sizes accepted in player roll expressions.
pub const ALLOWED_SIDES: [u32; 6] = [4, 6, 8, 10, 12, 20];

/// Most dice a single player roll expression may throw.
pub const MAX_ROLL_COUNT: u32 = 5;

/// Largest flat bonus a player roll expression may carry.
pub const MAX_ROLL_BONUS: i32 = 10;

static DICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)d(\d+)$").expect("valid regex"));

static ROLL_EXPR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d*)d(\d+)(?:\+(\d+))?$").expect("valid regex"));

// ---------------------------------------------------------------------------
// DiceSpec
// ---------------------------------------------------------------------------

/// A `<count>d<sides>` dice group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
}

impl DiceSpec {
    /// Parse strict `<count>d<sides>` notation (e.g. `"2d6"`).
    ///
    /// Catalog magnitudes use this shape; no range restriction applies
    /// beyond requiring both numbers to be positive.
    pub fn parse(notation: &str) -> Result<Self, CoreError> {
        let text = notation.trim().to_lowercase();
        let caps = DICE_RE.captures(&text).ok_or_else(|| {
            CoreError::Validation(format!("'{notation}' is not dice notation (expected e.g. 2d6)"))
        })?;
        let count: u32 = caps[1]
            .parse()
            .map_err(|_| CoreError::Validation(format!("Dice count out of range in '{notation}'")))?;
        let sides: u32 = caps[2]
            .parse()
            .map_err(|_| CoreError::Validation(format!("Die size out of range in '{notation}'")))?;
        if count == 0 || sides == 0 {
            return Err(CoreError::Validation(format!(
                "'{notation}' must roll at least one die with at least one side"
            )));
        }
        Ok(Self { count, sides })
    }

    /// Roll each die independently.
    pub fn roll(&self) -> Vec<i32> {
        roll_dice(self.count, self.sides)
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

// ---------------------------------------------------------------------------
// RollExpr
// ---------------------------------------------------------------------------

/// A player-typed roll expression: `[count]d<sides>[+bonus]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollExpr {
    pub dice: DiceSpec,
    pub bonus: i32,
}

impl RollExpr {
    /// Parse and range-check a roll expression such as `"d20"`, `"2d6"`,
    /// or `"d20+2"`.
    pub fn parse(expr: &str) -> Result<Self, CoreError> {
        let text: String = expr.to_lowercase().split_whitespace().collect();
        let caps = ROLL_EXPR_RE.captures(&text).ok_or_else(|| {
            CoreError::Validation(format!(
                "'{expr}' is not a roll expression (expected e.g. d20, 2d6, d20+2)"
            ))
        })?;
        let count: u32 = if caps[1].is_empty() {
            1
        } else {
            caps[1].parse().map_err(|_| {
                CoreError::Validation(format!("Dice count out of range in '{expr}'"))
            })?
        };
        let sides: u32 = caps[2]
            .parse()
            .map_err(|_| CoreError::Validation(format!("Die size out of range in '{expr}'")))?;
        let bonus: i32 = match caps.get(3) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| CoreError::Validation(format!("Bonus out of range in '{expr}'")))?,
            None => 0,
        };

        if !ALLOWED_SIDES.contains(&sides) {
            return Err(CoreError::Validation(format!(
                "Die size d{sides} is not allowed (use d4, d6, d8, d10, d12 or d20)"
            )));
        }
        if count == 0 || count > MAX_ROLL_COUNT {
            return Err(CoreError::Validation(format!(
                "At most {MAX_ROLL_COUNT} dice per roll, got {count}"
            )));
        }
        if bonus > MAX_ROLL_BONUS {
            return Err(CoreError::Validation(format!(
                "Bonus capped at +{MAX_ROLL_BONUS}, got +{bonus}"
            )));
        }
        Ok(Self {
            dice: DiceSpec { count, sides },
            bonus,
        })
    }
}

// ---------------------------------------------------------------------------
// Rolling
// ---------------------------------------------------------------------------

/// `count` independent uniform draws in `1..=sides`.
pub fn roll_dice(count: u32, sides: u32) -> Vec<i32> {
    let mut rng = rand::rng();
    (0..count).map(|_| rng.random_range(1..=sides as i32)).collect()
}

/// One `1d20` draw.
pub fn roll_d20() -> i32 {
    roll_dice(1, 20)[0]
}

/// One `1d6` draw.
pub fn roll_d6() -> i32 {
    roll_dice(1, 6)[0]
}

// ---------------------------------------------------------------------------
// Check outcome bands
// ---------------------------------------------------------------------------

/// Outcome band of a d20 check.
///
/// Banding is a function of the raw roll alone; skill and penalty bonuses
/// change the reported total but never the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    CriticalFailure,
    Failure,
    Normal,
    Success,
    CriticalSuccess,
}

impl CheckOutcome {
    /// Band a raw d20 roll.
    pub fn from_roll(raw: i32) -> Self {
        match raw {
            i32::MIN..=4 => Self::CriticalFailure,
            5..=9 => Self::Failure,
            10..=14 => Self::Normal,
            15..=19 => Self::Success,
            _ => Self::CriticalSuccess,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalFailure => "critical_failure",
            Self::Failure => "failure",
            Self::Normal => "normal",
            Self::Success => "success",
            Self::CriticalSuccess => "critical_success",
        }
    }
}

// ---------------------------------------------------------------------------
// Unconsciousness recovery bands
// ---------------------------------------------------------------------------

/// Outcome band of an unconsciousness-recovery check.
///
/// Unlike [`CheckOutcome`], these bands apply to the full total (roll +
/// resistance + assistance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComaBand {
    /// 5 or below: the body gives out.
    Death,
    /// 6..=12: still unconscious.
    StillUnconscious,
    /// 13..=19: wakes at 1 HP.
    WakeWeak,
    /// 20 and up: wakes at a random 2..=5 HP, capped at the maximum.
    WakeMiracle,
}

impl ComaBand {
    /// Band a full check total.
    pub fn from_total(total: i32) -> Self {
        match total {
            i32::MIN..=5 => Self::Death,
            6..=12 => Self::StillUnconscious,
            13..=19 => Self::WakeWeak,
            _ => Self::WakeMiracle,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_parse_dice_notation() {
        assert_eq!(DiceSpec::parse("2d6").unwrap(), DiceSpec { count: 2, sides: 6 });
        assert_eq!(DiceSpec::parse(" 1D8 ").unwrap(), DiceSpec { count: 1, sides: 8 });
    }

    #[test]
    fn test_parse_dice_notation_rejects_bare_d() {
        // Catalog notation requires an explicit count.
        assert_matches!(DiceSpec::parse("d6"), Err(CoreError::Validation(_)));
        assert_matches!(DiceSpec::parse("6"), Err(CoreError::Validation(_)));
        assert_matches!(DiceSpec::parse("2d"), Err(CoreError::Validation(_)));
        assert_matches!(DiceSpec::parse("0d6"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_parse_roll_expr() {
        let e = RollExpr::parse("d20").unwrap();
        assert_eq!(e.dice, DiceSpec { count: 1, sides: 20 });
        assert_eq!(e.bonus, 0);

        let e = RollExpr::parse("2d6").unwrap();
        assert_eq!(e.dice, DiceSpec { count: 2, sides: 6 });

        let e = RollExpr::parse("d20+2").unwrap();
        assert_eq!(e.bonus, 2);

        // Whitespace is tolerated.
        let e = RollExpr::parse("2d6 + 3").unwrap();
        assert_eq!(e.bonus, 3);
    }

    #[test]
    fn test_roll_expr_limits_rejected_not_clamped() {
        assert_matches!(RollExpr::parse("d7"), Err(CoreError::Validation(_)));
        assert_matches!(RollExpr::parse("6d6"), Err(CoreError::Validation(_)));
        assert_matches!(RollExpr::parse("d20+11"), Err(CoreError::Validation(_)));
        assert_matches!(RollExpr::parse("banana"), Err(CoreError::Validation(_)));
        assert_matches!(RollExpr::parse("d20-2"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_roll_dice_bounds() {
        for _ in 0..200 {
            let rolls = roll_dice(3, 6);
            assert_eq!(rolls.len(), 3);
            assert!(rolls.iter().all(|r| (1..=6).contains(r)));
        }
        for _ in 0..200 {
            let d = roll_d20();
            assert!((1..=20).contains(&d));
        }
    }

    #[test]
    fn test_outcome_bands() {
        assert_eq!(CheckOutcome::from_roll(1), CheckOutcome::CriticalFailure);
        assert_eq!(CheckOutcome::from_roll(4), CheckOutcome::CriticalFailure);
        assert_eq!(CheckOutcome::from_roll(5), CheckOutcome::Failure);
        assert_eq!(CheckOutcome::from_roll(9), CheckOutcome::Failure);
        assert_eq!(CheckOutcome::from_roll(10), CheckOutcome::Normal);
        assert_eq!(CheckOutcome::from_roll(14), CheckOutcome::Normal);
        assert_eq!(CheckOutcome::from_roll(15), CheckOutcome::Success);
        assert_eq!(CheckOutcome::from_roll(19), CheckOutcome::Success);
        assert_eq!(CheckOutcome::from_roll(20), CheckOutcome::CriticalSuccess);
        assert_eq!(CheckOutcome::from_roll(25), CheckOutcome::CriticalSuccess);
    }

    #[test]
    fn test_coma_bands() {
        assert_eq!(ComaBand::from_total(5), ComaBand::Death);
        assert_eq!(ComaBand::from_total(6), ComaBand::StillUnconscious);
        assert_eq!(ComaBand::from_total(12), ComaBand::StillUnconscious);
        assert_eq!(ComaBand::from_total(13), ComaBand::WakeWeak);
        assert_eq!(ComaBand::from_total(19), ComaBand::WakeWeak);
        assert_eq!(ComaBand::from_total(20), ComaBand::WakeMiracle);
        assert_eq!(ComaBand::from_total(31), ComaBand::WakeMiracle);
    }

    #[test]
    fn test_display_round_trip() {
        let spec = DiceSpec::parse("3d10").unwrap();
        assert_eq!(spec.to_string(), "3d10");
    }
}
