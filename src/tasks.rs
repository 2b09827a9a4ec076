//! Filtered and sorted task views.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{Id, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
    CreatedAt,
}

/// Query string of `GET /api/tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub course_id: Option<Id>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Incomplete => !task.completed,
        };
        let course_ok = self.course_id.is_none_or(|id| task.course_id == Some(id));
        status_ok && course_ok && self.matches_search(task)
    }

    fn matches_search(&self, task: &Task) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        task.title.to_lowercase().contains(&term)
            || task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term))
    }
}

/// Newest first.
fn by_creation_desc(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

/// Order two tasks under `key`. Ties always fall back to newest-created first.
pub fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| by_creation_desc(a, b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => by_creation_desc(a, b),
        },
        SortKey::Priority => b
            .priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| by_creation_desc(a, b)),
        SortKey::CreatedAt => by_creation_desc(a, b),
    }
}

/// Filter then sort; the input is left untouched.
pub fn view(tasks: &[Task], query: &TaskQuery) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks
        .iter()
        .filter(|task| query.matches(task))
        .cloned()
        .collect();
    selected.sort_by(|a, b| compare(a, b, query.sort));
    selected
}
