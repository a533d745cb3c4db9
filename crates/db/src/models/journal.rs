//! Turn journal and weekly XP models.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use deadline_core::types::DbId;

/// One registered turn (`turns` table): a character's daily narrated
/// contribution.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TurnRecord {
    pub character_id: DbId,
    pub turn_date: NaiveDate,
    pub char_count: i32,
    /// Comma-separated ids of mentioned characters.
    pub mentions: String,
}

impl TurnRecord {
    /// Mentioned character ids as a list; unparseable fragments are skipped.
    pub fn mention_ids(&self) -> Vec<DbId> {
        self.mentions
            .split(',')
            .filter_map(|m| m.trim().parse().ok())
            .collect()
    }

    /// Encode a mention list for storage.
    pub fn encode_mentions(ids: &[DbId]) -> String {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One weekly XP accumulator row (`weekly_xp` table).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WeeklyXp {
    pub character_id: DbId,
    pub week_start: NaiveDate,
    pub xp_total: i32,
    pub streak: i32,
}
