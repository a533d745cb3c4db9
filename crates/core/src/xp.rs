//! Turn-journal XP rules: per-turn XP by length, consecutive-day streak
//! bonuses, the daily cap, and week bucketing.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::CoreError;

/// Shortest turn text accepted for registration.
pub const MIN_TURN_CHARS: usize = 499;

/// Mentions retained per turn beyond which the rest are discarded.
pub const MAX_MENTIONS: usize = 5;

/// Hard cap on XP earned from a single day's turn (length + streak).
pub const DAILY_XP_CAP: i32 = 25;

/// XP granted to each side of a same-day mutual mention.
pub const MUTUAL_MENTION_XP: i32 = 5;

/// XP for a turn of `chars` characters.
pub fn xp_for_chars(chars: usize) -> i32 {
    match chars {
        0..=499 => 0,
        500..=999 => 10,
        1000..=1499 => 15,
        1500..=1999 => 20,
        2000..=2500 => 25,
        2501..=3000 => 30,
        3001..=3500 => 35,
        _ => 40,
    }
}

/// Bonus XP awarded when a streak reaches a milestone day.
pub fn streak_bonus(streak_days: i32) -> i32 {
    match streak_days {
        3 => 5,
        5 => 10,
        7 => 20,
        _ => 0,
    }
}

/// XP credited for one day's turn, after the daily cap.
pub fn daily_xp(chars: usize, streak_days: i32) -> i32 {
    (xp_for_chars(chars) + streak_bonus(streak_days)).min(DAILY_XP_CAP)
}

/// Reject turns below the minimum length.
pub fn validate_turn_length(chars: usize) -> Result<(), CoreError> {
    if chars < MIN_TURN_CHARS {
        return Err(CoreError::Validation(format!(
            "A turn needs at least {MIN_TURN_CHARS} characters, got {chars}"
        )));
    }
    Ok(())
}

/// Monday of the week containing `date` — the weekly XP bucket key.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Streak length given the previous turn date, if any.
///
/// A turn on the day right after the previous one extends the streak;
/// any gap (or a first turn) restarts at 1.
pub fn next_streak(previous: Option<NaiveDate>, today: NaiveDate, prior_streak: i32) -> i32 {
    match previous {
        Some(prev) if today - prev == Duration::days(1) => prior_streak + 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_xp_table() {
        assert_eq!(xp_for_chars(499), 0);
        assert_eq!(xp_for_chars(500), 10);
        assert_eq!(xp_for_chars(999), 10);
        assert_eq!(xp_for_chars(1000), 15);
        assert_eq!(xp_for_chars(2500), 25);
        assert_eq!(xp_for_chars(2501), 30);
        assert_eq!(xp_for_chars(3500), 35);
        assert_eq!(xp_for_chars(4096), 40);
        assert_eq!(xp_for_chars(9000), 40);
    }

    #[test]
    fn test_streak_bonuses() {
        assert_eq!(streak_bonus(1), 0);
        assert_eq!(streak_bonus(3), 5);
        assert_eq!(streak_bonus(5), 10);
        assert_eq!(streak_bonus(7), 20);
        assert_eq!(streak_bonus(8), 0);
    }

    #[test]
    fn test_daily_cap_applies() {
        // 2500 chars would give 25, plus a day-3 streak bonus of 5.
        assert_eq!(daily_xp(2500, 3), 25);
        assert_eq!(daily_xp(500, 3), 15);
        assert_eq!(daily_xp(500, 1), 10);
    }

    #[test]
    fn test_turn_length_validation() {
        assert_matches!(validate_turn_length(498), Err(CoreError::Validation(_)));
        assert!(validate_turn_length(499).is_ok());
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2026-08-04 is a Tuesday.
        let tue = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let mon = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        assert_eq!(week_start(tue), mon);
        assert_eq!(week_start(mon), mon);
        // Sunday still belongs to the Monday-started week.
        let sun = NaiveDate::from_ymd_opt(2026, 8, 9).unwrap();
        assert_eq!(week_start(sun), mon);
    }

    #[test]
    fn test_streak_progression() {
        let d1 = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let d4 = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(next_streak(None, d1, 0), 1);
        assert_eq!(next_streak(Some(d1), d2, 1), 2);
        // A gap resets.
        assert_eq!(next_streak(Some(d2), d4, 2), 1);
    }
}
