//! Daily turn registration and the weekly XP journal.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use deadline_core::types::DbId;
use deadline_core::xp::{
    daily_xp, next_streak, streak_bonus, validate_turn_length, week_start, xp_for_chars,
    MAX_MENTIONS, MUTUAL_MENTION_XP,
};
use deadline_db::models::journal::TurnRecord;
use deadline_db::repositories::{CharacterRepo, JournalRepo};

use crate::{Actor, Engine, EngineError, EngineResult};

/// Outcome of registering a turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub turn_date: NaiveDate,
    pub char_count: i32,
    pub base_xp: i32,
    pub streak: i32,
    pub streak_bonus: i32,
    /// XP credited for the day after the cap.
    pub xp_awarded: i32,
    /// Characters this turn formed a first-time mutual mention with.
    pub mutual_awards: Vec<DbId>,
}

/// One day's entry in a weekly summary.
#[derive(Debug, Clone, Serialize)]
pub struct TurnDigest {
    pub date: NaiveDate,
    pub char_count: i32,
    pub xp: i32,
}

/// A character's weekly XP summary.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub xp_total: i32,
    pub streak: i32,
    pub days: Vec<TurnDigest>,
}

/// One row of the weekly standings.
#[derive(Debug, Clone, Serialize)]
pub struct RankingRow {
    pub character_id: DbId,
    pub name: String,
    pub xp_total: i32,
    pub streak: i32,
}

impl Engine {
    /// Register the actor's turn for today: one per day, XP by length plus
    /// streak bonuses, and a shared bonus when two characters mention each
    /// other the same day (once per pair per week).
    pub async fn record_turn(
        &self,
        actor: Actor,
        char_count: usize,
        mentions: Vec<DbId>,
    ) -> EngineResult<TurnResult> {
        validate_turn_length(char_count)?;
        self.require_character(actor.id).await?;

        let today = Utc::now().date_naive();
        let week = week_start(today);
        if JournalRepo::find_turn(&self.pool, actor.id, today).await?.is_some() {
            return Err(EngineError::conflict("Turn already registered today"));
        }

        let mut mention_ids: Vec<DbId> = Vec::new();
        for id in mentions {
            if id != actor.id && !mention_ids.contains(&id) {
                mention_ids.push(id);
            }
        }
        mention_ids.truncate(MAX_MENTIONS);

        let previous = JournalRepo::previous_turn_date(&self.pool, actor.id, today).await?;
        let prior_streak = JournalRepo::week_for(&self.pool, actor.id, week)
            .await?
            .map(|row| row.streak)
            .unwrap_or(0);
        let streak = next_streak(previous, today, prior_streak);
        let base_xp = xp_for_chars(char_count);
        let bonus = streak_bonus(streak);
        let xp_awarded = daily_xp(char_count, streak);

        // Reciprocity reads happen up front; the pair table's primary key
        // keeps a concurrent double award out regardless.
        let mut reciprocal: Vec<DbId> = Vec::new();
        for &mentioned in &mention_ids {
            if let Some(their_turn) = JournalRepo::find_turn(&self.pool, mentioned, today).await? {
                if their_turn.mention_ids().contains(&actor.id) {
                    reciprocal.push(mentioned);
                }
            }
        }

        let mut tx = self.pool.begin().await?;
        JournalRepo::insert_turn(
            &mut tx,
            &TurnRecord {
                character_id: actor.id,
                turn_date: today,
                char_count: char_count as i32,
                mentions: TurnRecord::encode_mentions(&mention_ids),
            },
        )
        .await?;
        JournalRepo::add_xp(&mut tx, actor.id, week, xp_awarded, Some(streak)).await?;

        let mut mutual_awards = Vec::new();
        for mentioned in reciprocal {
            if JournalRepo::try_award_mutual(&mut tx, week, actor.id, mentioned).await? {
                JournalRepo::add_xp(&mut tx, actor.id, week, MUTUAL_MENTION_XP, None).await?;
                JournalRepo::add_xp(&mut tx, mentioned, week, MUTUAL_MENTION_XP, None).await?;
                mutual_awards.push(mentioned);
            }
        }
        tx.commit().await?;

        Ok(TurnResult {
            turn_date: today,
            char_count: char_count as i32,
            base_xp,
            streak,
            streak_bonus: bonus,
            xp_awarded,
            mutual_awards,
        })
    }

    /// The actor's XP summary for the current week.
    pub async fn weekly_summary(&self, actor: Actor) -> EngineResult<WeeklySummary> {
        self.require_character(actor.id).await?;
        let week = week_start(Utc::now().date_naive());
        let row = JournalRepo::week_for(&self.pool, actor.id, week).await?;
        let days = JournalRepo::turns_since(&self.pool, actor.id, week)
            .await?
            .into_iter()
            .map(|turn| TurnDigest {
                date: turn.turn_date,
                char_count: turn.char_count,
                xp: xp_for_chars(turn.char_count.max(0) as usize),
            })
            .collect();
        Ok(WeeklySummary {
            week_start: week,
            xp_total: row.as_ref().map(|r| r.xp_total).unwrap_or(0),
            streak: row.map(|r| r.streak).unwrap_or(0),
            days,
        })
    }

    /// Current-week standings, highest XP first.
    pub async fn weekly_ranking(&self, _actor: Actor, limit: i64) -> EngineResult<Vec<RankingRow>> {
        let week = week_start(Utc::now().date_naive());
        self.ranking_rows(week, limit).await
    }

    pub(crate) async fn ranking_rows(
        &self,
        week: NaiveDate,
        limit: i64,
    ) -> EngineResult<Vec<RankingRow>> {
        let rows = JournalRepo::ranking(&self.pool, week, limit).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let name = CharacterRepo::find_by_id(&self.pool, row.character_id)
                .await?
                .map(|c| c.name)
                .unwrap_or_else(|| format!("#{}", row.character_id));
            out.push(RankingRow {
                character_id: row.character_id,
                name,
                xp_total: row.xp_total,
                streak: row.streak,
            });
        }
        Ok(out)
    }
}
