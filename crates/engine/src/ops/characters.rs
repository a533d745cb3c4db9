//! Character lifecycle, sheet/status views, and sleep.

use chrono::{Duration, Utc};
use serde::Serialize;

use deadline_core::encumbrance::WeightStatus;
use deadline_core::needs::{
    sleep_recovery, validate_sleep_hours, NeedBand, NeedKind, SleepRecovery,
};
use deadline_core::types::DbId;
use deadline_db::models::character::{Character, CreateCharacter, StatRow, UpdateCharacter};
use deadline_db::repositories::{CharacterRepo, SheetRepo};

use crate::{Actor, Engine, EngineError, EngineResult};

/// Maxima assigned at creation, before the first sheet edit derives them
/// from attributes.
const STARTING_VITAL_MAX: i32 = 40;

/// A character sheet: vitals, scores, and carried weight.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterSheet {
    pub character: Character,
    pub attributes: Vec<StatRow>,
    pub skills: Vec<StatRow>,
    pub weight: WeightStatus,
}

/// One need line in a status report.
#[derive(Debug, Clone, Serialize)]
pub struct NeedStatus {
    pub kind: NeedKind,
    pub level: i32,
    pub band: NeedBand,
    pub hours_elapsed: f64,
    pub max_hours: i64,
}

/// A character status report: vitals, needs, traumas, weight.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub character_id: DbId,
    pub name: String,
    pub hp: i32,
    pub hp_max: i32,
    pub sp: i32,
    pub sp_max: i32,
    pub rerolls: i32,
    pub needs: Vec<NeedStatus>,
    pub traumas: Vec<String>,
    pub weight: WeightStatus,
}

/// Outcome of a sleep operation.
#[derive(Debug, Clone, Serialize)]
pub struct SleepResult {
    pub hours: i64,
    pub recovery: SleepRecovery,
    pub sleep_debt_after: i32,
    pub hp_after: i32,
    pub sp_after: i32,
}

impl Engine {
    /// Create the actor's character on first interaction. Idempotent: an
    /// existing character is returned as-is.
    pub async fn create_character(&self, actor: Actor, name: &str) -> EngineResult<CharacterSheet> {
        if name.trim().is_empty() {
            return Err(EngineError::validation("Character name must not be empty"));
        }
        let character = CharacterRepo::create(
            &self.pool,
            &CreateCharacter {
                id: actor.id,
                name: name.trim().to_string(),
            },
        )
        .await?;

        // Fresh characters get the provisional maxima until the first sheet
        // edit derives real ones from vitality and balance.
        let character = if character.hp_max == 0 && character.sp_max == 0 {
            CharacterRepo::update(
                &self.pool,
                character.id,
                &UpdateCharacter {
                    hp_max: Some(STARTING_VITAL_MAX),
                    sp_max: Some(STARTING_VITAL_MAX),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| EngineError::not_found("character", character.id))?
        } else {
            character
        };
        self.sheet_for(character).await
    }

    /// View a character sheet. Reading someone else's sheet takes privilege.
    pub async fn view_sheet(
        &self,
        actor: Actor,
        target: Option<DbId>,
    ) -> EngineResult<CharacterSheet> {
        let target_id = target.unwrap_or(actor.id);
        if target_id != actor.id && !actor.privileged {
            return Err(EngineError::conflict(
                "Only a privileged caller can view another character's sheet",
            ));
        }
        let character = self.require_character(target_id).await?;
        self.sheet_for(character).await
    }

    /// View current vitals, needs (freshly recomputed), traumas, and weight.
    pub async fn view_status(
        &self,
        actor: Actor,
        target: Option<DbId>,
    ) -> EngineResult<StatusReport> {
        let target_id = target.unwrap_or(actor.id);
        if target_id != actor.id && !actor.privileged {
            return Err(EngineError::conflict(
                "Only a privileged caller can view another character's status",
            ));
        }
        let character = self.require_character(target_id).await?;
        let levels = self.refresh_needs(&character).await?;
        let weight = self.weight_status(character.id).await?;

        let needs = vec![
            NeedStatus {
                kind: NeedKind::Hunger,
                level: levels.hunger,
                band: NeedBand::from_level(levels.hunger),
                hours_elapsed: levels.hours_without_food,
                max_hours: levels.max_hours,
            },
            NeedStatus {
                kind: NeedKind::Thirst,
                level: levels.thirst,
                band: NeedBand::from_level(levels.thirst),
                hours_elapsed: levels.hours_without_water,
                max_hours: levels.max_hours,
            },
            NeedStatus {
                kind: NeedKind::Sleep,
                level: levels.sleep_debt,
                band: NeedBand::from_level(levels.sleep_debt),
                hours_elapsed: levels.hours_without_sleep,
                max_hours: levels.max_hours,
            },
        ];
        let traumas = if character.traumas.is_empty() {
            Vec::new()
        } else {
            character
                .traumas
                .split("; ")
                .map(|t| t.to_string())
                .collect()
        };

        Ok(StatusReport {
            character_id: character.id,
            name: character.name,
            hp: character.hp,
            hp_max: character.hp_max,
            sp: character.sp,
            sp_max: character.sp_max,
            rerolls: character.rerolls,
            needs,
            traumas,
            weight,
        })
    }

    /// Sleep for `hours`, paying off sleep debt and regaining vitals in
    /// proportion, while hunger and thirst keep growing.
    pub async fn sleep(&self, actor: Actor, hours: i64) -> EngineResult<SleepResult> {
        validate_sleep_hours(hours)?;
        let character = self.require_character(actor.id).await?;
        let levels = self.refresh_needs(&character).await?;

        let recovery = sleep_recovery(hours, levels.sleep_debt, character.hp_max, character.sp_max);
        let now = Utc::now();

        // Need levels are derived from the consumption clocks on every
        // refresh, so hunger/thirst growth must live in the clocks: moving
        // one back by max_hours/100 per point is what the next refresh
        // reads as that many extra points. The cached columns get the same
        // deltas so reads between now and the next refresh agree.
        let backdate =
            |points: i32| Duration::seconds(points as i64 * levels.max_hours * 36);

        let mut tx = self.pool.begin().await?;
        let (hp_after, _) = CharacterRepo::apply_hp_delta(&mut *tx, actor.id, recovery.hp_recovered)
            .await?
            .ok_or_else(|| EngineError::not_found("character", actor.id))?;
        let (sp_after, _) = CharacterRepo::apply_sp_delta(&mut *tx, actor.id, recovery.sp_recovered)
            .await?
            .ok_or_else(|| EngineError::not_found("character", actor.id))?;
        CharacterRepo::adjust_need_levels(
            &mut *tx,
            actor.id,
            recovery.hunger_increase,
            recovery.thirst_increase,
            -recovery.debt_recovered,
        )
        .await?;
        CharacterRepo::update_tx(
            &mut tx,
            actor.id,
            &UpdateCharacter {
                last_meal_at: Some(character.last_meal_at - backdate(recovery.hunger_increase)),
                last_drink_at: Some(character.last_drink_at - backdate(recovery.thirst_increase)),
                last_sleep_at: Some(now),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| EngineError::not_found("character", actor.id))?;
        tx.commit().await?;

        Ok(SleepResult {
            hours,
            recovery,
            sleep_debt_after: (levels.sleep_debt - recovery.debt_recovered).max(0),
            hp_after,
            sp_after,
        })
    }

    /// Assemble a sheet view for a loaded character.
    pub(crate) async fn sheet_for(&self, character: Character) -> EngineResult<CharacterSheet> {
        let attributes = SheetRepo::attributes(&self.pool, character.id).await?;
        let skills = SheetRepo::skills(&self.pool, character.id).await?;
        let weight = self.weight_status(character.id).await?;
        Ok(CharacterSheet {
            character,
            attributes,
            skills,
            weight,
        })
    }
}
