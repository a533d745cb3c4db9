//! Attribute and skill registries, derived-stat lookup tables, and full-sheet
//! edit validation.
//!
//! Characters have six attributes and twelve skills. Maximum HP, maximum SP,
//! carry capacity, and survival endurance are all pure functions of single
//! scores, resolved through fixed tables.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::normalize::normalize;

// ---------------------------------------------------------------------------
// Point caps
// ---------------------------------------------------------------------------

/// Total points that may be spent across all six attributes.
pub const MAX_ATTRIBUTE_POINTS: i32 = 20;

/// Total points that may be spent across all twelve skills.
pub const MAX_SKILL_POINTS: i32 = 40;

/// Lowest legal score for an edited attribute or skill.
pub const MIN_SCORE: i32 = 1;

/// Highest legal score for an edited attribute or skill.
pub const MAX_SCORE: i32 = 6;

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// The six character attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Strength,
    Agility,
    Vitality,
    Reasoning,
    Balance,
    Persuasion,
}

/// All attributes, in sheet display order.
pub const ATTRIBUTES: [Attribute; 6] = [
    Attribute::Strength,
    Attribute::Agility,
    Attribute::Vitality,
    Attribute::Reasoning,
    Attribute::Balance,
    Attribute::Persuasion,
];

impl Attribute {
    /// Database / display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Agility => "agility",
            Self::Vitality => "vitality",
            Self::Reasoning => "reasoning",
            Self::Balance => "balance",
            Self::Persuasion => "persuasion",
        }
    }

    /// Resolve a normalized name to an attribute.
    pub fn from_normalized(name: &str) -> Option<Self> {
        ATTRIBUTES.into_iter().find(|a| a.as_str() == name)
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// The twelve character skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Fighting,
    Resistance,
    Stealth,
    Aim,
    Reflex,
    Survival,
    Medicine,
    Improvisation,
    Exploration,
    Intuition,
    Manipulation,
    Confidence,
}

/// All skills, in sheet display order.
pub const SKILLS: [Skill; 12] = [
    Skill::Fighting,
    Skill::Resistance,
    Skill::Stealth,
    Skill::Aim,
    Skill::Reflex,
    Skill::Survival,
    Skill::Medicine,
    Skill::Improvisation,
    Skill::Exploration,
    Skill::Intuition,
    Skill::Manipulation,
    Skill::Confidence,
];

impl Skill {
    /// Database / display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fighting => "fighting",
            Self::Resistance => "resistance",
            Self::Stealth => "stealth",
            Self::Aim => "aim",
            Self::Reflex => "reflex",
            Self::Survival => "survival",
            Self::Medicine => "medicine",
            Self::Improvisation => "improvisation",
            Self::Exploration => "exploration",
            Self::Intuition => "intuition",
            Self::Manipulation => "manipulation",
            Self::Confidence => "confidence",
        }
    }

    /// Resolve a normalized name to a skill.
    pub fn from_normalized(name: &str) -> Option<Self> {
        SKILLS.into_iter().find(|s| s.as_str() == name)
    }
}

// ---------------------------------------------------------------------------
// Tagged stat lookup
// ---------------------------------------------------------------------------

/// A resolved attribute or skill reference.
///
/// Free-text keys resolve through [`StatKey::resolve`]: attributes are
/// checked before skills, so the two namespaces have a defined precedence
/// and insertion order never decides a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Attribute(Attribute),
    Skill(Skill),
}

impl StatKey {
    /// Resolve a free-text key, attributes first.
    pub fn resolve(name: &str) -> Option<Self> {
        let key = normalize(name);
        if let Some(a) = Attribute::from_normalized(&key) {
            return Some(Self::Attribute(a));
        }
        Skill::from_normalized(&key).map(Self::Skill)
    }

    /// Database / display name of the underlying stat.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attribute(a) => a.as_str(),
            Self::Skill(s) => s.as_str(),
        }
    }

    /// Whether rolls against this stat take the overload penalty.
    pub fn is_weight_sensitive(&self) -> bool {
        matches!(
            self,
            Self::Attribute(Attribute::Strength)
                | Self::Attribute(Attribute::Agility)
                | Self::Skill(Skill::Stealth)
                | Self::Skill(Skill::Reflex)
        )
    }
}

// ---------------------------------------------------------------------------
// Vital pools
// ---------------------------------------------------------------------------

/// The two vital pools damage and healing can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalKind {
    Hp,
    Sp,
}

impl VitalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hp => "hp",
            Self::Sp => "sp",
        }
    }
}

// ---------------------------------------------------------------------------
// Derived-stat tables
// ---------------------------------------------------------------------------

/// HP / SP maxima indexed by the governing attribute score (0..=6).
const VITAL_TABLE: [i32; 7] = [10, 15, 20, 25, 30, 35, 40];

/// Maximum HP for a vitality score.
pub fn hp_max_for_vitality(vitality: i32) -> i32 {
    VITAL_TABLE[vitality.clamp(0, 6) as usize]
}

/// Maximum SP for a balance score.
pub fn sp_max_for_balance(balance: i32) -> i32 {
    VITAL_TABLE[balance.clamp(0, 6) as usize]
}

/// Maximum carry weight in kg for a strength score (clamped to 1..=6).
pub fn carry_weight_for_strength(strength: i32) -> f64 {
    match strength.clamp(1, 6) {
        1 => 5.0,
        2 => 10.0,
        3 => 15.0,
        4 => 20.0,
        5 => 25.0,
        _ => 30.0,
    }
}

/// Hours a character holds out without food, water, or sleep before the
/// corresponding need saturates, by resistance skill. Unmapped scores
/// (including the unset 0) fall back to 24 h.
pub fn endurance_hours(resistance: i32) -> i64 {
    match resistance.clamp(1, 6) {
        1 => 24,
        2 => 36,
        3 => 48,
        4 => 60,
        5 => 78,
        6 => 96,
        _ => 24,
    }
}

/// Rescale a current HP/SP value after its maximum changed.
///
/// A value sitting at the old maximum (or at zero) snaps to the new
/// maximum; anything else is clamped.
pub fn rescale_current(current: i32, old_max: i32, new_max: i32) -> i32 {
    if current == 0 || current == old_max || current > new_max {
        new_max
    } else {
        current
    }
}

// ---------------------------------------------------------------------------
// Sheet edit validation
// ---------------------------------------------------------------------------

/// A complete attribute/skill allocation submitted through the sheet-edit
/// flow. Validation is all-or-nothing: either every score and both sums are
/// legal, or nothing is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetAllocation {
    pub attributes: Vec<(Attribute, i32)>,
    pub skills: Vec<(Skill, i32)>,
}

/// Check merged point sums against both caps.
///
/// Callers merging a partial edit onto existing scores pass the sums of the
/// merged sheet, so an edit can never sneak past a cap by omission.
pub fn validate_totals(attr_sum: i32, skill_sum: i32) -> Result<(), CoreError> {
    if attr_sum > MAX_ATTRIBUTE_POINTS {
        return Err(CoreError::Validation(format!(
            "Attribute points total {attr_sum}, cap is {MAX_ATTRIBUTE_POINTS}"
        )));
    }
    if skill_sum > MAX_SKILL_POINTS {
        return Err(CoreError::Validation(format!(
            "Skill points total {skill_sum}, cap is {MAX_SKILL_POINTS}"
        )));
    }
    Ok(())
}

impl SheetAllocation {
    /// Validate the range of every submitted score.
    pub fn validate_scores(&self) -> Result<(), CoreError> {
        for (attr, value) in &self.attributes {
            if !(MIN_SCORE..=MAX_SCORE).contains(value) {
                return Err(CoreError::Validation(format!(
                    "Attribute '{}' must be between {MIN_SCORE} and {MAX_SCORE}, got {value}",
                    attr.as_str()
                )));
            }
        }
        for (skill, value) in &self.skills {
            if !(MIN_SCORE..=MAX_SCORE).contains(value) {
                return Err(CoreError::Validation(format!(
                    "Skill '{}' must be between {MIN_SCORE} and {MAX_SCORE}, got {value}",
                    skill.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Validate every score and both point sums of a complete allocation.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.validate_scores()?;
        let attr_sum: i32 = self.attributes.iter().map(|(_, v)| v).sum();
        let skill_sum: i32 = self.skills.iter().map(|(_, v)| v).sum();
        validate_totals(attr_sum, skill_sum)
    }

    /// Look up an attribute score in this allocation.
    pub fn attribute(&self, attr: Attribute) -> Option<i32> {
        self.attributes
            .iter()
            .find(|(a, _)| *a == attr)
            .map(|(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn full_allocation() -> SheetAllocation {
        // 4+4+3+3+3+3 = 20 attribute points, 12 * 3 = 36 skill points.
        SheetAllocation {
            attributes: vec![
                (Attribute::Strength, 4),
                (Attribute::Agility, 4),
                (Attribute::Vitality, 3),
                (Attribute::Reasoning, 3),
                (Attribute::Balance, 3),
                (Attribute::Persuasion, 3),
            ],
            skills: SKILLS.into_iter().map(|s| (s, 3)).collect(),
        }
    }

    #[test]
    fn test_valid_allocation_passes() {
        assert!(full_allocation().validate().is_ok());
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let mut alloc = full_allocation();
        alloc.attributes[0].1 = 7;
        assert_matches!(alloc.validate(), Err(CoreError::Validation(_)));

        let mut alloc = full_allocation();
        alloc.skills[0].1 = 0;
        assert_matches!(alloc.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_attribute_sum_over_cap_rejected() {
        let mut alloc = full_allocation();
        alloc.attributes[2].1 = 4; // sum becomes 21
        let err = alloc.validate().unwrap_err();
        assert!(err.to_string().contains("cap is 20"));
    }

    #[test]
    fn test_skill_sum_over_cap_rejected() {
        let mut alloc = full_allocation();
        for (_, v) in alloc.skills.iter_mut().take(5) {
            *v = 4; // 5*4 + 7*3 = 41
        }
        let err = alloc.validate().unwrap_err();
        assert!(err.to_string().contains("cap is 40"));
    }

    #[test]
    fn test_stat_key_resolution_precedence() {
        assert_eq!(
            StatKey::resolve("Strength"),
            Some(StatKey::Attribute(Attribute::Strength))
        );
        assert_eq!(StatKey::resolve("AIM"), Some(StatKey::Skill(Skill::Aim)));
        assert_eq!(StatKey::resolve("does-not-exist"), None);
    }

    #[test]
    fn test_weight_sensitive_keys() {
        assert!(StatKey::Attribute(Attribute::Strength).is_weight_sensitive());
        assert!(StatKey::Attribute(Attribute::Agility).is_weight_sensitive());
        assert!(StatKey::Skill(Skill::Stealth).is_weight_sensitive());
        assert!(StatKey::Skill(Skill::Reflex).is_weight_sensitive());
        assert!(!StatKey::Skill(Skill::Medicine).is_weight_sensitive());
        assert!(!StatKey::Attribute(Attribute::Vitality).is_weight_sensitive());
    }

    #[test]
    fn test_vital_tables() {
        assert_eq!(hp_max_for_vitality(0), 10);
        assert_eq!(hp_max_for_vitality(2), 20);
        assert_eq!(hp_max_for_vitality(6), 40);
        assert_eq!(hp_max_for_vitality(9), 40);
        assert_eq!(sp_max_for_balance(3), 25);
    }

    #[test]
    fn test_carry_weight_table() {
        assert_eq!(carry_weight_for_strength(3), 15.0);
        assert_eq!(carry_weight_for_strength(1), 5.0);
        assert_eq!(carry_weight_for_strength(0), 5.0);
        assert_eq!(carry_weight_for_strength(6), 30.0);
        assert_eq!(carry_weight_for_strength(8), 30.0);
    }

    #[test]
    fn test_endurance_hours_table() {
        assert_eq!(endurance_hours(1), 24);
        assert_eq!(endurance_hours(5), 78);
        assert_eq!(endurance_hours(6), 96);
        assert_eq!(endurance_hours(0), 24);
    }

    #[test]
    fn test_rescale_current() {
        // At old max: snaps up.
        assert_eq!(rescale_current(20, 20, 40), 40);
        // At zero: snaps up.
        assert_eq!(rescale_current(0, 20, 40), 40);
        // Over new max: clamped down.
        assert_eq!(rescale_current(30, 40, 25), 25);
        // Mid-range: untouched.
        assert_eq!(rescale_current(12, 20, 40), 12);
    }
}
