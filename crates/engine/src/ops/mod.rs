//! Engine operations, one module per action family.

pub mod catalog;
pub mod characters;
pub mod checks;
pub mod combat;
pub mod inventory;
pub mod needs;
pub mod reload;
pub mod sheet;
pub mod transfers;
pub mod turns;
pub mod upkeep;

use deadline_core::stats::StatKey;
use deadline_core::types::DbId;
use deadline_db::models::character::Character;
use deadline_db::repositories::{CharacterRepo, SheetRepo};

use crate::{Engine, EngineError, EngineResult};

impl Engine {
    /// Load a character or fail with NotFound.
    pub(crate) async fn require_character(&self, id: DbId) -> EngineResult<Character> {
        CharacterRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| EngineError::not_found("character", id))
    }

    /// Resolve the character an operation targets: the explicit target when
    /// given, the actor otherwise.
    pub(crate) async fn require_target(
        &self,
        actor_id: DbId,
        target: Option<DbId>,
    ) -> EngineResult<Character> {
        self.require_character(target.unwrap_or(actor_id)).await
    }

    /// A character's score for a resolved attribute or skill.
    pub(crate) async fn stat_score(&self, id: DbId, key: StatKey) -> EngineResult<i32> {
        let score = match key {
            StatKey::Attribute(attr) => {
                SheetRepo::attribute_value(&self.pool, id, attr.as_str()).await?
            }
            StatKey::Skill(skill) => SheetRepo::skill_value(&self.pool, id, skill.as_str()).await?,
        };
        Ok(score)
    }
}
