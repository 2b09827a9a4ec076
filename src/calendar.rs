//! Monday-start weekly view of tasks by due date.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::models::Task;

/// One column of the weekly overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_number: u32,
    pub tasks: Vec<Task>,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekView {
    pub start: NaiveDate,
    pub previous: NaiveDate,
    pub next: NaiveDate,
    pub days: Vec<WeekDay>,
}

/// The Monday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Seven days from the Monday of `anchor`'s week, each with the tasks due
/// on that (UTC) day. Undated tasks never appear.
pub fn week_view(tasks: &[Task], anchor: NaiveDate, today: NaiveDate) -> WeekView {
    let start = start_of_week(anchor);
    let days = start
        .iter_days()
        .take(7)
        .map(|date| WeekDay {
            date,
            day_name: date.format("%a").to_string(),
            day_number: date.day(),
            tasks: tasks
                .iter()
                .filter(|task| task.due_date.is_some_and(|due| due.date_naive() == date))
                .cloned()
                .collect(),
            is_today: date == today,
        })
        .collect();

    WeekView {
        start,
        previous: start.checked_sub_days(Days::new(7)).unwrap_or(start),
        next: start.checked_add_days(Days::new(7)).unwrap_or(start),
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task_due(id: u32, due: Option<(i32, u32, u32)>) -> Task {
        Task {
            id,
            user_id: 1,
            title: format!("task {}", id),
            description: None,
            course_id: None,
            due_date: due.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 14, 0, 0).unwrap()),
            priority: Priority::Medium,
            completed: false,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2025-05-15 is a Thursday
        assert_eq!(start_of_week(day(2025, 5, 15)), day(2025, 5, 12));
        assert_eq!(start_of_week(day(2025, 5, 12)), day(2025, 5, 12));
        assert_eq!(start_of_week(day(2025, 5, 18)), day(2025, 5, 12));
    }

    #[test]
    fn tasks_land_on_their_due_day() {
        let tasks = vec![
            task_due(1, Some((2025, 5, 15))),
            task_due(2, Some((2025, 5, 20))),
            task_due(3, None),
        ];
        let week = week_view(&tasks, day(2025, 5, 14), day(2025, 5, 15));

        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].day_name, "Mon");
        assert_eq!(week.days[3].day_number, 15);
        assert_eq!(week.days[3].tasks.len(), 1);
        assert_eq!(week.days[3].tasks[0].id, 1);
        assert!(week.days[3].is_today);
        let total: usize = week.days.iter().map(|d| d.tasks.len()).sum();
        assert_eq!(total, 1);
        assert_eq!(week.previous, day(2025, 5, 5));
        assert_eq!(week.next, day(2025, 5, 19));
    }
}
