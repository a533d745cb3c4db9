//! Damage, healing, and therapy resolution.

use serde::Serialize;

use deadline_core::dice::{roll_d6, DiceSpec};
use deadline_core::items::{kit_bonus, EffectKind, Magnitude};
use deadline_core::stats::{Skill, StatKey, VitalKind};
use deadline_core::trauma::random_trauma;
use deadline_core::types::DbId;
use deadline_db::repositories::{CatalogRepo, CharacterRepo, InventoryRepo};
use deadline_events::EngineEvent;

use crate::{Actor, Engine, EngineError, EngineResult};

/// Where a damage bonus came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Weapon,
    Consumable,
    Stat,
}

/// One additive part of a damage total.
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    pub kind: ContributionKind,
    pub name: String,
    /// Individual die results; empty for flat stat bonuses.
    pub rolls: Vec<i32>,
    pub bonus: i32,
}

/// Outcome of a damage resolution.
#[derive(Debug, Clone, Serialize)]
pub struct DamageResult {
    pub target_id: DbId,
    pub vital: VitalKind,
    pub base_roll: i32,
    pub contributions: Vec<Contribution>,
    pub total: i32,
    pub value_before: i32,
    pub value_after: i32,
    /// Set when HP hit exactly 0.
    pub unconscious: bool,
    /// The trauma appended when SP hit exactly 0.
    pub trauma: Option<String>,
    /// Rounds left in the weapon after a ranged attack.
    pub ammo_remaining: Option<i32>,
}

/// Outcome of a heal resolution.
#[derive(Debug, Clone, Serialize)]
pub struct HealResult {
    pub target_id: DbId,
    pub item_name: String,
    pub base_roll: i32,
    pub medicine_bonus: i32,
    pub item_bonus: i32,
    pub total: i32,
    pub hp_before: i32,
    pub hp_after: i32,
}

/// Outcome of a therapy session.
#[derive(Debug, Clone, Serialize)]
pub struct TherapyResult {
    pub target_id: DbId,
    pub base_roll: i32,
    pub manipulation_bonus: i32,
    pub total: i32,
    pub sp_before: i32,
    pub sp_after: i32,
}

impl Engine {
    /// Resolve damage against a target's HP or SP.
    ///
    /// Base `1d6`, plus whatever `source` resolves to: an attribute or
    /// skill adds its score (stat names take precedence over item names);
    /// a held weapon rolls its damage dice and adds fighting (melee) or aim
    /// (ranged, spending one round); a held damage consumable rolls its
    /// dice and burns one unit.
    pub async fn apply_damage(
        &self,
        actor: Actor,
        target: Option<DbId>,
        vital: VitalKind,
        source: Option<&str>,
    ) -> EngineResult<DamageResult> {
        self.require_character(actor.id).await?;
        let target_char = self.require_target(actor.id, target).await?;

        let base_roll = roll_d6();
        let mut contributions = Vec::new();
        let mut ammo_remaining = None;

        // Ammo/consumable debits and the vital write commit together; an
        // abort on any step rolls the whole resolution back.
        let mut tx = self.pool.begin().await?;

        if let Some(source) = source {
            if let Some(key) = StatKey::resolve(source) {
                let score = self.stat_score(actor.id, key).await?;
                contributions.push(Contribution {
                    kind: ContributionKind::Stat,
                    name: key.as_str().to_string(),
                    rolls: Vec::new(),
                    bonus: score,
                });
            } else {
                let held = InventoryRepo::find(&self.pool, actor.id, source)
                    .await?
                    .ok_or_else(|| EngineError::not_found("inventory item", source))?;
                let entry = CatalogRepo::find(&self.pool, &held.name)
                    .await?
                    .ok_or_else(|| EngineError::not_found("catalog item", &held.name))?;

                if entry.is_weapon() {
                    let notation = entry.damage_dice.as_deref().unwrap_or("1d4");
                    let rolls = DiceSpec::parse(notation)?.roll();
                    contributions.push(Contribution {
                        kind: ContributionKind::Weapon,
                        name: entry.name.clone(),
                        bonus: rolls.iter().sum(),
                        rolls,
                    });

                    let skill = if entry.is_ranged_weapon() {
                        let remaining = InventoryRepo::spend_round(&mut *tx, actor.id, &held.name)
                            .await?
                            .ok_or_else(|| {
                                EngineError::conflict(format!("'{}' is out of ammo", held.name))
                            })?;
                        ammo_remaining = Some(remaining);
                        Skill::Aim
                    } else {
                        Skill::Fighting
                    };
                    let score = self.stat_score(actor.id, StatKey::Skill(skill)).await?;
                    contributions.push(Contribution {
                        kind: ContributionKind::Stat,
                        name: skill.as_str().to_string(),
                        rolls: Vec::new(),
                        bonus: score,
                    });
                } else if entry.consumable && EffectKind::from_str(&entry.effect)? == EffectKind::Damage
                {
                    let Magnitude::Dice(spec) = Magnitude::parse(&entry.magnitude)? else {
                        return Err(EngineError::validation(format!(
                            "Damage consumable '{}' has a malformed magnitude",
                            entry.name
                        )));
                    };
                    let rolls = spec.roll();
                    contributions.push(Contribution {
                        kind: ContributionKind::Consumable,
                        name: entry.name.clone(),
                        bonus: rolls.iter().sum(),
                        rolls,
                    });
                    InventoryRepo::adjust_quantity_tx(&mut tx, actor.id, &held.name, -1)
                        .await?
                        .ok_or_else(|| EngineError::not_found("inventory item", &held.name))?;
                } else {
                    return Err(EngineError::validation(format!(
                        "'{}' cannot be used to deal damage",
                        entry.name
                    )));
                }
            }
        }

        let total = base_roll + contributions.iter().map(|c| c.bonus).sum::<i32>();

        let (value_before, value_after) = match vital {
            VitalKind::Hp => {
                let (after, _) = CharacterRepo::apply_hp_delta(&mut *tx, target_char.id, -total)
                    .await?
                    .ok_or_else(|| EngineError::not_found("character", target_char.id))?;
                (target_char.hp, after)
            }
            VitalKind::Sp => {
                let (after, _) = CharacterRepo::apply_sp_delta(&mut *tx, target_char.id, -total)
                    .await?
                    .ok_or_else(|| EngineError::not_found("character", target_char.id))?;
                (target_char.sp, after)
            }
        };

        let unconscious = vital == VitalKind::Hp && value_after == 0;
        let mut trauma = None;
        if vital == VitalKind::Sp && value_after == 0 {
            let descriptor = random_trauma();
            CharacterRepo::append_trauma(&mut *tx, target_char.id, descriptor).await?;
            trauma = Some(descriptor.to_string());
        }
        tx.commit().await?;

        // Events fire only for state that actually committed.
        if let Some(descriptor) = &trauma {
            self.bus.publish(
                EngineEvent::new("character.trauma")
                    .with_character(target_char.id)
                    .with_payload(serde_json::json!({ "trauma": descriptor })),
            );
        }
        if unconscious {
            self.bus.publish(
                EngineEvent::new("character.unconscious").with_character(target_char.id),
            );
        }

        Ok(DamageResult {
            target_id: target_char.id,
            vital,
            base_roll,
            contributions,
            total,
            value_before,
            value_after,
            unconscious,
            trauma,
            ammo_remaining,
        })
    }

    /// Resolve healing with a held kit or heal consumable.
    ///
    /// `1d6` + medicine + the item's fixed bonus; catalog heal consumables
    /// carry their own bonus, anything else falls back to the named default
    /// kit tiers. The item is consumed either way.
    pub async fn apply_heal(
        &self,
        actor: Actor,
        target: Option<DbId>,
        item_name: &str,
    ) -> EngineResult<HealResult> {
        self.require_character(actor.id).await?;
        let target_char = self.require_target(actor.id, target).await?;

        let held = InventoryRepo::find(&self.pool, actor.id, item_name)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", item_name))?;

        let item_bonus = match CatalogRepo::find(&self.pool, &held.name).await? {
            Some(entry) if entry.consumable && EffectKind::from_str(&entry.effect)? == EffectKind::Heal => {
                match Magnitude::parse(&entry.magnitude)? {
                    Magnitude::Flat(bonus) => bonus,
                    Magnitude::Dice(_) => {
                        return Err(EngineError::validation(format!(
                            "Heal item '{}' has a malformed bonus",
                            entry.name
                        )))
                    }
                }
            }
            Some(entry) => {
                return Err(EngineError::validation(format!(
                    "'{}' is not a healing item",
                    entry.name
                )))
            }
            None => kit_bonus(&held.name).ok_or_else(|| {
                EngineError::validation(format!("'{}' is not a healing item", held.name))
            })?,
        };

        let medicine_bonus = self.stat_score(actor.id, StatKey::Skill(Skill::Medicine)).await?;
        let base_roll = roll_d6();
        let total = base_roll + medicine_bonus + item_bonus;

        // The kit is spent and the target healed in one transaction.
        let mut tx = self.pool.begin().await?;
        InventoryRepo::adjust_quantity_tx(&mut tx, actor.id, &held.name, -1)
            .await?
            .ok_or_else(|| EngineError::not_found("inventory item", &held.name))?;
        let (hp_after, _) = CharacterRepo::apply_hp_delta(&mut *tx, target_char.id, total)
            .await?
            .ok_or_else(|| EngineError::not_found("character", target_char.id))?;
        tx.commit().await?;

        Ok(HealResult {
            target_id: target_char.id,
            item_name: held.name,
            base_roll,
            medicine_bonus,
            item_bonus,
            total,
            hp_before: target_char.hp,
            hp_after,
        })
    }

    /// Resolve a therapy session restoring another character's SP.
    pub async fn apply_therapy(&self, actor: Actor, target: DbId) -> EngineResult<TherapyResult> {
        if target == actor.id {
            return Err(EngineError::validation(
                "Therapy can only be applied to someone else",
            ));
        }
        self.require_character(actor.id).await?;
        let target_char = self.require_character(target).await?;

        let manipulation_bonus = self
            .stat_score(actor.id, StatKey::Skill(Skill::Manipulation))
            .await?;
        let base_roll = roll_d6();
        let total = base_roll + manipulation_bonus;

        let (sp_after, _) = CharacterRepo::apply_sp_delta(&self.pool, target_char.id, total)
            .await?
            .ok_or_else(|| EngineError::not_found("character", target_char.id))?;

        Ok(TherapyResult {
            target_id: target_char.id,
            base_roll,
            manipulation_bonus,
            total,
            sp_before: target_char.sp,
            sp_after,
        })
    }
}
