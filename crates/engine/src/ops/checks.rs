//! Skill checks, free dice rolls, rerolls, and unconsciousness recovery.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;

use deadline_core::dice::{roll_d20, CheckOutcome, ComaBand, RollExpr};
use deadline_core::stats::{Skill, StatKey};
use deadline_core::types::DbId;
use deadline_db::models::character::UpdateCharacter;
use deadline_db::repositories::{CharacterRepo, ComaRepo};
use deadline_events::EngineEvent;

use crate::{Actor, Engine, EngineError, EngineResult};

/// Range of HP a critical recovery wakes with (capped at the maximum).
const MIRACLE_HP_RANGE: std::ops::RangeInclusive<i32> = 2..=5;

/// Outcome of a skill or attribute check.
#[derive(Debug, Clone, Serialize)]
pub struct SkillCheckResult {
    pub key: String,
    pub roll: i32,
    pub score_bonus: i32,
    /// Overload penalty, when the key is weight-sensitive.
    pub penalty: i32,
    pub total: i32,
    /// Banding follows the raw roll alone.
    pub outcome: CheckOutcome,
}

/// Outcome of a free-form dice expression roll.
#[derive(Debug, Clone, Serialize)]
pub struct ExpressionRollResult {
    pub expression: String,
    pub rolls: Vec<i32>,
    pub sum: i32,
    pub bonus: i32,
    pub total: i32,
}

/// Outcome of a reroll.
#[derive(Debug, Clone, Serialize)]
pub struct RerollResult {
    pub rerolls_remaining: i32,
    pub check: SkillCheckResult,
}

/// Outcome of an unconsciousness-recovery check.
#[derive(Debug, Clone, Serialize)]
pub struct UnconsciousnessResult {
    pub roll: i32,
    pub resistance_bonus: i32,
    pub assist_bonus: i32,
    pub total: i32,
    pub band: ComaBand,
    pub hp_after: i32,
}

/// Outcome of assisting a downed character.
#[derive(Debug, Clone, Serialize)]
pub struct AssistResult {
    pub target_id: DbId,
    pub total_bonus: i32,
}

impl Engine {
    /// Run a d20 check against an attribute or skill.
    pub async fn skill_check(&self, actor: Actor, key: &str) -> EngineResult<SkillCheckResult> {
        self.require_character(actor.id).await?;
        let stat = StatKey::resolve(key)
            .ok_or_else(|| EngineError::not_found("attribute or skill", key))?;
        let score_bonus = self.stat_score(actor.id, stat).await?;
        let penalty = if stat.is_weight_sensitive() {
            self.weight_status(actor.id).await?.penalty
        } else {
            0
        };

        let roll = roll_d20();
        Ok(SkillCheckResult {
            key: stat.as_str().to_string(),
            roll,
            score_bonus,
            penalty,
            total: roll + score_bonus + penalty,
            outcome: CheckOutcome::from_roll(roll),
        })
    }

    /// Roll a free-form expression such as `"2d6"` or `"d20+2"`.
    pub async fn roll_expression(
        &self,
        actor: Actor,
        expression: &str,
    ) -> EngineResult<ExpressionRollResult> {
        self.require_character(actor.id).await?;
        let expr = RollExpr::parse(expression)?;
        let rolls = expr.dice.roll();
        let sum: i32 = rolls.iter().sum();
        Ok(ExpressionRollResult {
            expression: expression.to_string(),
            rolls,
            sum,
            bonus: expr.bonus,
            total: sum + expr.bonus,
        })
    }

    /// Re-run a check, spending one of the day's rerolls.
    pub async fn reroll(&self, actor: Actor, key: &str) -> EngineResult<RerollResult> {
        self.require_character(actor.id).await?;
        StatKey::resolve(key).ok_or_else(|| EngineError::not_found("attribute or skill", key))?;
        if !CharacterRepo::spend_reroll(&self.pool, actor.id).await? {
            return Err(EngineError::conflict("No rerolls left today"));
        }
        let check = self.skill_check(actor, key).await?;
        let character = self.require_character(actor.id).await?;
        Ok(RerollResult {
            rerolls_remaining: character.rerolls,
            check,
        })
    }

    /// Attempt to recover from unconsciousness. Allowed once per day and
    /// only at 0 HP; any accumulated assistance bonus is consumed here.
    pub async fn unconsciousness_check(&self, actor: Actor) -> EngineResult<UnconsciousnessResult> {
        let character = self.require_character(actor.id).await?;
        if character.hp > 0 {
            return Err(EngineError::conflict("Not unconscious (HP above 0)"));
        }
        let today = Utc::now().date_naive();
        if !ComaRepo::try_register_test(&self.pool, actor.id, today).await? {
            return Err(EngineError::conflict(
                "Already attempted an unconsciousness check today",
            ));
        }

        let resistance_bonus = self
            .stat_score(actor.id, StatKey::Skill(Skill::Resistance))
            .await?;
        let assist_bonus = ComaRepo::pop_bonus(&self.pool, actor.id).await?;
        let roll = roll_d20();
        let total = roll + resistance_bonus + assist_bonus;
        let band = ComaBand::from_total(total);

        let hp_after = match band {
            ComaBand::Death => {
                self.bus
                    .publish(EngineEvent::new("character.died").with_character(actor.id));
                0
            }
            ComaBand::StillUnconscious => 0,
            ComaBand::WakeWeak => {
                self.set_hp(actor.id, 1).await?;
                1
            }
            ComaBand::WakeMiracle => {
                let hp = rand::rng()
                    .random_range(MIRACLE_HP_RANGE)
                    .min(character.hp_max);
                self.set_hp(actor.id, hp).await?;
                hp
            }
        };

        Ok(UnconsciousnessResult {
            roll,
            resistance_bonus,
            assist_bonus,
            total,
            band,
            hp_after,
        })
    }

    /// Contribute a flat bonus to a downed character's next recovery check.
    pub async fn assist_unconscious(
        &self,
        actor: Actor,
        target: DbId,
        bonus: i32,
    ) -> EngineResult<AssistResult> {
        if bonus < 1 {
            return Err(EngineError::validation("Assistance bonus must be at least 1"));
        }
        self.require_character(actor.id).await?;
        let target_char = self.require_character(target).await?;
        if target_char.hp > 0 {
            return Err(EngineError::conflict("Target is not unconscious"));
        }
        let total_bonus = ComaRepo::add_bonus(&self.pool, target, bonus).await?;
        Ok(AssistResult {
            target_id: target,
            total_bonus,
        })
    }

    async fn set_hp(&self, id: DbId, hp: i32) -> EngineResult<()> {
        CharacterRepo::update(
            &self.pool,
            id,
            &UpdateCharacter {
                hp: Some(hp),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| EngineError::not_found("character", id))?;
        Ok(())
    }
}
