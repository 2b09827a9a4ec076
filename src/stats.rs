//! Focus statistics over the pomodoro session log.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::calendar::start_of_week;
use crate::models::PomodoroSession;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_minutes: u64,
    pub average_minutes: u64,
    /// Consecutive days with at least one session, ending today.
    pub streak_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMinutes {
    pub week_start: NaiveDate,
    pub labels: Vec<String>,
    pub minutes: [u64; 7],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    #[serde(flatten)]
    pub totals: SessionStats,
    pub weekly: WeeklyMinutes,
}

pub fn summarize(sessions: &[PomodoroSession], today: NaiveDate) -> SessionStats {
    if sessions.is_empty() {
        return SessionStats::default();
    }

    let total_minutes = sessions
        .iter()
        .fold(0u64, |total, s| total.saturating_add(u64::from(s.duration)));
    let count = sessions.len() as u64;
    // mean rounded half up
    let average_minutes =
        total_minutes / count + u64::from(2 * (total_minutes % count) >= count);

    let days: BTreeSet<NaiveDate> = sessions.iter().map(|s| s.start_time.date_naive()).collect();
    let mut streak_days = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak_days += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }

    SessionStats {
        total_minutes,
        average_minutes,
        streak_days,
    }
}

/// Minutes studied on each day of `today`'s Monday-start week.
pub fn weekly_minutes(sessions: &[PomodoroSession], today: NaiveDate) -> WeeklyMinutes {
    let week_start = start_of_week(today);
    let mut minutes = [0u64; 7];

    for session in sessions {
        let day = session.start_time.date_naive();
        if start_of_week(day) == week_start {
            let slot = &mut minutes[day.weekday().num_days_from_monday() as usize];
            *slot = slot.saturating_add(u64::from(session.duration));
        }
    }

    WeeklyMinutes {
        week_start,
        labels: week_start
            .iter_days()
            .take(7)
            .map(|d| d.format("%a").to_string())
            .collect(),
        minutes,
    }
}

pub fn report(sessions: &[PomodoroSession], today: NaiveDate) -> StatsReport {
    StatsReport {
        totals: summarize(sessions, today),
        weekly: weekly_minutes(sessions, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session(id: u32, (y, m, d): (i32, u32, u32), duration: u32) -> PomodoroSession {
        PomodoroSession {
            id,
            user_id: 1,
            task_id: None,
            start_time: Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap(),
            end_time: None,
            duration,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_log_has_zero_stats() {
        assert_eq!(summarize(&[], day(2025, 5, 15)), SessionStats::default());
    }

    #[test]
    fn streak_counts_back_from_today() {
        let sessions = vec![
            session(1, (2025, 5, 15), 25),
            session(2, (2025, 5, 14), 25),
            session(3, (2025, 5, 14), 50),
            session(4, (2025, 5, 12), 25),
        ];
        let stats = summarize(&sessions, day(2025, 5, 15));
        assert_eq!(stats.total_minutes, 125);
        // 125 / 4 = 31.25
        assert_eq!(stats.average_minutes, 31);
        assert_eq!(stats.streak_days, 2);

        assert_eq!(summarize(&sessions, day(2025, 5, 16)).streak_days, 0);
    }

    #[test]
    fn huge_durations_do_not_overflow() {
        let sessions = vec![
            session(1, (2025, 5, 15), 3_000_000_000),
            session(2, (2025, 5, 15), 3_000_000_000),
        ];
        let summary = report(&sessions, day(2025, 5, 15));
        assert_eq!(summary.totals.total_minutes, 6_000_000_000);
        assert_eq!(summary.totals.average_minutes, 3_000_000_000);
        assert_eq!(summary.weekly.minutes[3], 6_000_000_000);
    }

    #[test]
    fn weekly_minutes_bucket_by_weekday() {
        let sessions = vec![
            session(1, (2025, 5, 12), 25),
            session(2, (2025, 5, 15), 25),
            session(3, (2025, 5, 15), 15),
            session(4, (2025, 5, 18), 30),
            session(5, (2025, 5, 11), 99),
        ];
        let weekly = weekly_minutes(&sessions, day(2025, 5, 15));
        assert_eq!(weekly.week_start, day(2025, 5, 12));
        assert_eq!(weekly.minutes, [25, 0, 0, 40, 0, 0, 30]);
        assert_eq!(weekly.labels[6], "Sun");
    }
}
