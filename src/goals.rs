//! Goal colours and the overall progress summary.

use serde::Serialize;

use crate::models::{Course, Goal, Id};

pub const DEFAULT_GOAL_COLOR: &str = "#6C5CE7";

/// Title of the goal featured at the centre of the overview.
const MAIN_GOAL_TITLE: &str = "Semester";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub display_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub overall_progress: u32,
    pub main_goal_id: Option<Id>,
    pub goals: Vec<GoalView>,
}

/// The goal's own colour, else its course's, else the default.
pub fn display_color(goal: &Goal, courses: &[Course]) -> String {
    goal.color
        .clone()
        .or_else(|| {
            let course_id = goal.course_id?;
            courses
                .iter()
                .find(|course| course.id == course_id)
                .map(|course| course.color.clone())
        })
        .unwrap_or_else(|| DEFAULT_GOAL_COLOR.to_string())
}

/// Mean progress rounded half up; 0 without goals.
pub fn overall_progress(goals: &[Goal]) -> u32 {
    if goals.is_empty() {
        return 0;
    }
    let count = goals.len() as u32;
    let sum: u32 = goals.iter().map(|goal| u32::from(goal.progress)).sum();
    (2 * sum + count) / (2 * count)
}

pub fn summarize(goals: &[Goal], courses: &[Course]) -> GoalSummary {
    let main_goal_id = goals
        .iter()
        .find(|goal| goal.title == MAIN_GOAL_TITLE)
        .or_else(|| goals.first())
        .map(|goal| goal.id);

    GoalSummary {
        overall_progress: overall_progress(goals),
        main_goal_id,
        goals: goals
            .iter()
            .map(|goal| GoalView {
                goal: goal.clone(),
                display_color: display_color(goal, courses),
            })
            .collect(),
    }
}
