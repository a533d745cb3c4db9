//! Needs-decay refresh and consumption-event bookkeeping.
//!
//! Levels are recomputed from elapsed wall-clock time on every read that
//! displays or reasons about them; nothing ticks in the background. The
//! first refresh that carries a need across the critical threshold fires a
//! best-effort warning through the notification sink.

use chrono::Utc;
use serde::Serialize;
use sqlx::{Postgres, Transaction};

use deadline_core::needs::{level_after, NeedKind, CRITICAL_THRESHOLD};
use deadline_core::stats::{endurance_hours, Skill};
use deadline_core::types::DbId;
use deadline_db::models::character::{Character, UpdateCharacter};
use deadline_db::repositories::{CharacterRepo, SheetRepo};
use deadline_events::NeedsAlert;

use crate::{Engine, EngineResult};

/// Snapshot of the three need levels after a refresh.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NeedLevels {
    pub hunger: i32,
    pub thirst: i32,
    pub sleep_debt: i32,
    /// Hours this character holds out before a need saturates.
    pub max_hours: i64,
    pub hours_without_food: f64,
    pub hours_without_water: f64,
    pub hours_without_sleep: f64,
}

impl Engine {
    /// Recompute and persist the character's need levels from elapsed time.
    ///
    /// Idempotent for a fixed instant; must run before any read that shows
    /// or reasons about needs.
    pub(crate) async fn refresh_needs(&self, character: &Character) -> EngineResult<NeedLevels> {
        let resistance =
            SheetRepo::skill_value(&self.pool, character.id, Skill::Resistance.as_str()).await?;
        let max_hours = endurance_hours(resistance);
        let now = Utc::now();

        let hours = |since: chrono::DateTime<Utc>| (now - since).num_seconds() as f64 / 3600.0;
        let hours_without_food = hours(character.last_meal_at);
        let hours_without_water = hours(character.last_drink_at);
        let hours_without_sleep = hours(character.last_sleep_at);

        let levels = NeedLevels {
            hunger: level_after(hours_without_food, max_hours),
            thirst: level_after(hours_without_water, max_hours),
            sleep_debt: level_after(hours_without_sleep, max_hours),
            max_hours,
            hours_without_food,
            hours_without_water,
            hours_without_sleep,
        };
        CharacterRepo::set_need_levels(
            &self.pool,
            character.id,
            levels.hunger,
            levels.thirst,
            levels.sleep_debt,
        )
        .await?;

        // One-shot alerts on the crossing, not on every critical read.
        let crossings = [
            (NeedKind::Hunger, character.hunger, levels.hunger),
            (NeedKind::Thirst, character.thirst, levels.thirst),
            (NeedKind::Sleep, character.sleep_debt, levels.sleep_debt),
        ];
        for (need, before, after) in crossings {
            if before < CRITICAL_THRESHOLD && after >= CRITICAL_THRESHOLD {
                self.alert_critical(character.id, need, after).await;
            }
        }
        Ok(levels)
    }

    /// Deliver a needs-critical warning; failure is swallowed.
    pub(crate) async fn alert_critical(&self, character_id: DbId, need: NeedKind, level: i32) {
        let alert = NeedsAlert {
            character_id,
            need,
            level,
        };
        if let Err(err) = self.sink.deliver(&alert).await {
            tracing::warn!(character_id, need = need.as_str(), %err, "Needs alert dropped");
        }
    }

    /// Reset the last-event timestamp for one need to now, inside the
    /// caller's transaction. The next refresh derives the level from the
    /// new baseline.
    pub(crate) async fn register_consumption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        character_id: DbId,
        kind: NeedKind,
    ) -> EngineResult<()> {
        let now = Utc::now();
        let mut update = UpdateCharacter::default();
        match kind {
            NeedKind::Hunger => update.last_meal_at = Some(now),
            NeedKind::Thirst => update.last_drink_at = Some(now),
            NeedKind::Sleep => update.last_sleep_at = Some(now),
        }
        CharacterRepo::update_tx(tx, character_id, &update).await?;
        Ok(())
    }
}
