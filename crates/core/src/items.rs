//! Item semantics shared by the catalog and the inventory: consumable
//! effect kinds, weapon classes, effect magnitudes, and the default
//! first-aid kit tiers.

use serde::{Deserialize, Serialize};

use crate::dice::DiceSpec;
use crate::error::CoreError;
use crate::normalize::normalize;

// ---------------------------------------------------------------------------
// Effect kinds
// ---------------------------------------------------------------------------

/// What consuming a consumable does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Heal,
    Damage,
    Ammo,
    Food,
    Drink,
    None,
}

/// All effect kinds accepted on catalog entries.
pub const VALID_EFFECTS: &[&str] = &["heal", "damage", "ammo", "food", "drink", "none"];

impl EffectKind {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heal => "heal",
            Self::Damage => "damage",
            Self::Ammo => "ammo",
            Self::Food => "food",
            Self::Drink => "drink",
            Self::None => "none",
        }
    }

    /// Parse from a string, rejecting unknown kinds.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "heal" => Ok(Self::Heal),
            "damage" => Ok(Self::Damage),
            "ammo" => Ok(Self::Ammo),
            "food" => Ok(Self::Food),
            "drink" => Ok(Self::Drink),
            "none" => Ok(Self::None),
            other => Err(CoreError::Validation(format!(
                "Unknown effect kind: '{other}'. Valid kinds: {}",
                VALID_EFFECTS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Weapon classes
// ---------------------------------------------------------------------------

/// Melee weapons add the fighting skill to damage; ranged weapons add aim
/// and spend ammunition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    Melee,
    Ranged,
}

impl WeaponClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "melee" => Ok(Self::Melee),
            "ranged" => Ok(Self::Ranged),
            other => Err(CoreError::Validation(format!(
                "Unknown weapon class: '{other}'. Valid classes: melee, ranged"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Magnitudes
// ---------------------------------------------------------------------------

/// An effect magnitude: either a fixed integer or dice notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Flat(i32),
    Dice(DiceSpec),
}

impl Magnitude {
    /// Parse a magnitude string: all-digits means flat, otherwise dice
    /// notation.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let trimmed = text.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            let value: i32 = trimmed.parse().map_err(|_| {
                CoreError::Validation(format!("Magnitude '{text}' out of range"))
            })?;
            return Ok(Self::Flat(value));
        }
        DiceSpec::parse(trimmed).map(Self::Dice).map_err(|_| {
            CoreError::Validation(format!(
                "Magnitude '{text}' must be an integer or dice notation like 1d6"
            ))
        })
    }

    /// Database string representation.
    pub fn to_db_string(&self) -> String {
        match self {
            Self::Flat(v) => v.to_string(),
            Self::Dice(spec) => spec.to_string(),
        }
    }
}

/// Enforce the magnitude shape an effect kind demands: heal items carry a
/// flat bonus, damage items carry dice.
pub fn validate_magnitude(effect: EffectKind, magnitude: &Magnitude) -> Result<(), CoreError> {
    match (effect, magnitude) {
        (EffectKind::Heal, Magnitude::Dice(spec)) => Err(CoreError::Validation(format!(
            "Heal consumables take a fixed bonus, not dice ('{spec}')"
        ))),
        (EffectKind::Damage, Magnitude::Flat(v)) => Err(CoreError::Validation(format!(
            "Damage consumables take dice notation, not a fixed bonus ('{v}')"
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Default healing kits
// ---------------------------------------------------------------------------

/// Named first-aid kit tiers usable even when the item is not a catalog
/// heal consumable. The leading or trailing word "kit" is ignored, so
/// "basic kit", "kit basic" and plain "basic" all match.
const KIT_TIERS: [(&str, i32); 3] = [("basic", 1), ("intermediate", 2), ("advanced", 3)];

/// Resolve a default kit tier bonus from a free-text item name.
pub fn kit_bonus(name: &str) -> Option<i32> {
    let normalized = normalize(name);
    let stripped = normalized
        .strip_prefix("kit ")
        .or_else(|| normalized.strip_suffix(" kit"))
        .unwrap_or(&normalized);
    KIT_TIERS
        .into_iter()
        .find(|(tier, _)| *tier == stripped)
        .map(|(_, bonus)| bonus)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_effect_round_trip() {
        for s in VALID_EFFECTS {
            assert_eq!(EffectKind::from_str(s).unwrap().as_str(), *s);
        }
        assert_matches!(EffectKind::from_str("poison"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_weapon_class_round_trip() {
        assert_eq!(WeaponClass::from_str("melee").unwrap(), WeaponClass::Melee);
        assert_eq!(WeaponClass::from_str("ranged").unwrap(), WeaponClass::Ranged);
        assert_matches!(WeaponClass::from_str("thrown"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_magnitude_parsing() {
        assert_eq!(Magnitude::parse("5").unwrap(), Magnitude::Flat(5));
        assert_matches!(Magnitude::parse("2d8").unwrap(), Magnitude::Dice(_));
        assert_matches!(Magnitude::parse("lots"), Err(CoreError::Validation(_)));
        assert_matches!(Magnitude::parse(""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_magnitude_shape_per_effect() {
        let dice = Magnitude::parse("1d6").unwrap();
        let flat = Magnitude::Flat(3);
        assert!(validate_magnitude(EffectKind::Heal, &flat).is_ok());
        assert_matches!(
            validate_magnitude(EffectKind::Heal, &dice),
            Err(CoreError::Validation(_))
        );
        assert!(validate_magnitude(EffectKind::Damage, &dice).is_ok());
        assert_matches!(
            validate_magnitude(EffectKind::Damage, &flat),
            Err(CoreError::Validation(_))
        );
        // Other kinds accept either shape.
        assert!(validate_magnitude(EffectKind::Food, &flat).is_ok());
        assert!(validate_magnitude(EffectKind::None, &dice).is_ok());
    }

    #[test]
    fn test_kit_tiers() {
        assert_eq!(kit_bonus("basic"), Some(1));
        assert_eq!(kit_bonus("Basic Kit"), Some(1));
        assert_eq!(kit_bonus("kit intermediate"), Some(2));
        assert_eq!(kit_bonus("ADVANCED KIT"), Some(3));
        assert_eq!(kit_bonus("bandage"), None);
    }

    #[test]
    fn test_magnitude_db_round_trip() {
        assert_eq!(Magnitude::Flat(7).to_db_string(), "7");
        assert_eq!(Magnitude::parse("2d6").unwrap().to_db_string(), "2d6");
    }
}
