//! Idempotent upkeep operations for an external scheduler.
//!
//! The engine owns no clock loop; a cron-like collaborator invokes these at
//! whatever cadence the game runs on (daily resets, a weekly close, and a
//! periodic sweep of the volatile stores).

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use deadline_core::xp::week_start;
use deadline_db::repositories::{CharacterRepo, ComaRepo, JournalRepo};

use crate::ops::turns::RankingRow;
use crate::{Engine, EngineResult};

/// Rerolls every character holds after the daily reset.
pub const DAILY_REROLLS: i32 = 3;

/// Outcome of a volatile-store sweep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepReport {
    pub expired_transactions: usize,
    pub expired_gates: usize,
}

impl Engine {
    /// Reset every character's reroll counter to the daily allowance.
    pub async fn grant_daily_rerolls(&self) -> EngineResult<u64> {
        let affected = CharacterRepo::reset_all_rerolls(&self.pool, DAILY_REROLLS).await?;
        tracing::info!(affected, "Daily rerolls reset");
        Ok(affected)
    }

    /// Clear the once-per-day unconsciousness-test gate.
    pub async fn clear_daily_tests(&self) -> EngineResult<u64> {
        let affected = ComaRepo::clear_tests(&self.pool).await?;
        tracing::info!(affected, "Daily unconsciousness tests cleared");
        Ok(affected)
    }

    /// Close a week of XP: return the final standings, then drop the
    /// week's accumulators. Defaults to the week containing today.
    /// Idempotent — a second close of the same week returns empty
    /// standings.
    pub async fn close_week(&self, week: Option<NaiveDate>) -> EngineResult<Vec<RankingRow>> {
        let week = week.unwrap_or_else(|| week_start(Utc::now().date_naive()));
        let standings = self.ranking_rows(week, 10).await?;
        let removed = JournalRepo::delete_week(&self.pool, week).await?;
        tracing::info!(%week, removed, "Weekly XP closed");
        Ok(standings)
    }

    /// Discard expired pending transactions and edit windows.
    pub async fn sweep_expired(&self) -> EngineResult<SweepReport> {
        let now = Utc::now();
        let report = SweepReport {
            expired_transactions: self.broker.sweep(now),
            expired_gates: self.gates.sweep(now),
        };
        if report.expired_transactions > 0 || report.expired_gates > 0 {
            tracing::info!(
                transactions = report.expired_transactions,
                gates = report.expired_gates,
                "Swept expired volatile state"
            );
        }
        Ok(report)
    }
}
