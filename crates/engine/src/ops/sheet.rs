//! Full-sheet editing behind the per-character edit gate.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use deadline_core::stats::{
    carry_weight_for_strength, hp_max_for_vitality, rescale_current, sp_max_for_balance,
    validate_totals, Attribute, SheetAllocation, ATTRIBUTES, SKILLS,
};
use deadline_core::types::Timestamp;
use deadline_db::models::character::UpdateCharacter;
use deadline_db::repositories::{CharacterRepo, SheetRepo};

use crate::ops::characters::CharacterSheet;
use crate::{Actor, Engine, EngineError, EngineResult};

/// An opened edit window.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SheetEditWindow {
    pub expires_at: Timestamp,
}

impl Engine {
    /// Open (or restart) the actor's sheet-edit window.
    pub async fn begin_sheet_edit(&self, actor: Actor) -> EngineResult<SheetEditWindow> {
        self.require_character(actor.id).await?;
        let expires_at = self.gates.open(actor.id, Utc::now());
        Ok(SheetEditWindow { expires_at })
    }

    /// Apply a sheet edit, all-or-nothing.
    ///
    /// The submitted scores are merged onto the current sheet before the
    /// point caps are checked, every row is written in one transaction, and
    /// the derived maxima (HP, SP, carry weight) are recomputed from the
    /// merged attributes. A failed validation leaves the window open so the
    /// player can resubmit.
    pub async fn submit_sheet_edit(
        &self,
        actor: Actor,
        allocation: SheetAllocation,
    ) -> EngineResult<CharacterSheet> {
        let character = self.require_character(actor.id).await?;
        let now = Utc::now();
        if !self.gates.is_open(actor.id, now) {
            return Err(EngineError::conflict(
                "No sheet-edit window is open (it may have expired)",
            ));
        }
        allocation.validate_scores()?;

        // Merge onto the current scores so partial edits are checked
        // against the whole sheet.
        let current_attrs: HashMap<String, i32> = SheetRepo::attributes(&self.pool, actor.id)
            .await?
            .into_iter()
            .map(|row| (row.name, row.value))
            .collect();
        let current_skills: HashMap<String, i32> = SheetRepo::skills(&self.pool, actor.id)
            .await?
            .into_iter()
            .map(|row| (row.name, row.value))
            .collect();

        let merged_attr = |attr: Attribute| {
            allocation
                .attribute(attr)
                .or_else(|| current_attrs.get(attr.as_str()).copied())
                .unwrap_or(0)
        };
        let attr_sum: i32 = ATTRIBUTES.into_iter().map(merged_attr).sum();
        let skill_sum: i32 = SKILLS
            .into_iter()
            .map(|skill| {
                allocation
                    .skills
                    .iter()
                    .find(|(s, _)| *s == skill)
                    .map(|(_, v)| *v)
                    .or_else(|| current_skills.get(skill.as_str()).copied())
                    .unwrap_or(0)
            })
            .sum();
        validate_totals(attr_sum, skill_sum)?;

        let hp_max = hp_max_for_vitality(merged_attr(Attribute::Vitality));
        let sp_max = sp_max_for_balance(merged_attr(Attribute::Balance));
        let max_carry_weight = carry_weight_for_strength(merged_attr(Attribute::Strength));

        let mut tx = self.pool.begin().await?;
        for (attr, value) in &allocation.attributes {
            SheetRepo::set_attribute(&mut tx, actor.id, attr.as_str(), *value).await?;
        }
        for (skill, value) in &allocation.skills {
            SheetRepo::set_skill(&mut tx, actor.id, skill.as_str(), *value).await?;
        }
        CharacterRepo::update_tx(
            &mut tx,
            actor.id,
            &UpdateCharacter {
                hp: Some(rescale_current(character.hp, character.hp_max, hp_max)),
                hp_max: Some(hp_max),
                sp: Some(rescale_current(character.sp, character.sp_max, sp_max)),
                sp_max: Some(sp_max),
                max_carry_weight: Some(max_carry_weight),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| EngineError::not_found("character", actor.id))?;
        tx.commit().await?;

        // A successful submission closes the window.
        self.gates.consume(actor.id, now);

        let updated = self.require_character(actor.id).await?;
        self.refresh_needs(&updated).await?;
        self.sheet_for(updated).await
    }
}
