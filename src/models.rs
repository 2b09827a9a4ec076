//! Records held by the store and the request payloads that create or
//! patch them.
//!
//! Every record is a flat struct with an integer surrogate key and a
//! `user_id` owner. Wire names are camelCase. Payloads validate themselves
//! and report every violated field at once.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, ApiResult, FieldError};

lazy_static! {
    static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

pub type Id = u32;

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Paired with `#[serde(default)]`: a missing key yields `None`, an explicit
/// `null` yields `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR_REGEX.is_match(value)
}

fn require_text(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "Required"));
    }
}

fn check_color(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>) {
    if let Some(color) = value {
        if !is_hex_color(color) {
            errors.push(FieldError::new(field, "Expected a #RRGGBB colour"));
        }
    }
}

/// Parse a due date given either as RFC 3339 or as a plain `YYYY-MM-DD` day.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn due_date_field(errors: &mut Vec<FieldError>, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_due_date(raw);
    if parsed.is_none() {
        errors.push(FieldError::new("dueDate", "Invalid date"));
    }
    parsed
}

// ---------------------------------------------------------------------------
// Users and courses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    /// Stored as given; never serialised back to clients.
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub university: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub university: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        require_text(&mut errors, "username", &self.username);
        require_text(&mut errors, "firstName", &self.first_name);
        require_text(&mut errors, "lastName", &self.last_name);
        if self.password.chars().count() < 8 {
            errors.push(FieldError::new(
                "password",
                "Password must contain at least 8 characters",
            ));
        }
        ApiError::check(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    pub code: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    pub color: String,
}

impl NewCourse {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", &self.name);
        require_text(&mut errors, "code", &self.code);
        check_color(&mut errors, "color", Some(&self.color));
        ApiError::check(errors)
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Higher rank sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub description: Option<String>,
    pub course_id: Option<Id>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub course_id: Option<Id>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// A validated task insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub course_id: Option<Id>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub completed: bool,
}

impl NewTaskRequest {
    pub fn validate(self) -> ApiResult<NewTask> {
        let mut errors = Vec::new();
        require_text(&mut errors, "title", &self.title);
        let due_date = due_date_field(&mut errors, self.due_date.as_deref());
        ApiError::check(errors)?;

        Ok(NewTask {
            title: self.title,
            description: self.description.filter(|d| !d.is_empty()),
            course_id: self.course_id,
            due_date,
            priority: self.priority.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
        })
    }
}

/// Body of `PATCH /api/tasks/:id`. Every field is optional; nullable
/// fields accept `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub course_id: Option<Option<Id>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub course_id: Option<Option<Id>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatchRequest {
    pub fn validate(self) -> ApiResult<TaskPatch> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            require_text(&mut errors, "title", title);
        }
        let due_date = match &self.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(due_date_field(&mut errors, Some(raw.as_str()))),
        };
        ApiError::check(errors)?;

        Ok(TaskPatch {
            title: self.title,
            description: self.description,
            course_id: self.course_id,
            due_date,
            priority: self.priority,
            completed: self.completed,
        })
    }
}

impl TaskPatch {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(course_id) = self.course_id {
            task.course_id = course_id;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

// ---------------------------------------------------------------------------
// Mind map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub parent_id: Option<Id>,
    pub position: Position,
    pub color: Option<String>,
    pub task_id: Option<Id>,
}

/// Body of `POST /api/mindmap/nodes`; position and colour are filled in by
/// [`crate::mindmap::place`] when missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDraft {
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<Id>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub task_id: Option<Id>,
}

impl NodeDraft {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        require_text(&mut errors, "title", &self.title);
        check_color(&mut errors, "color", self.color.as_deref());
        ApiError::check(errors)
    }
}

/// A node ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub title: String,
    pub parent_id: Option<Id>,
    pub position: Position,
    pub color: Option<String>,
    pub task_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Id>>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub task_id: Option<Option<Id>>,
}

impl NodePatch {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            require_text(&mut errors, "title", title);
        }
        if let Some(color) = &self.color {
            check_color(&mut errors, "color", color.as_deref());
        }
        ApiError::check(errors)
    }

    pub fn apply(self, node: &mut MindMapNode) {
        if let Some(title) = self.title {
            node.title = title;
        }
        if let Some(parent_id) = self.parent_id {
            node.parent_id = parent_id;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(color) = self.color {
            node.color = color;
        }
        if let Some(task_id) = self.task_id {
            node.task_id = task_id;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapEdge {
    pub id: Id,
    pub user_id: Id,
    pub source_id: Id,
    pub target_id: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEdge {
    pub source_id: Id,
    pub target_id: Id,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub progress: u8,
    pub color: Option<String>,
    pub course_id: Option<Id>,
}

fn check_progress(errors: &mut Vec<FieldError>, progress: Option<i64>) {
    if let Some(value) = progress {
        if !(0..=100).contains(&value) {
            errors.push(FieldError::new("progress", "Progress must be between 0 and 100"));
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub course_id: Option<Id>,
}

impl NewGoal {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        require_text(&mut errors, "title", &self.title);
        check_progress(&mut errors, self.progress);
        check_color(&mut errors, "color", self.color.as_deref());
        ApiError::check(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub course_id: Option<Option<Id>>,
}

impl GoalPatch {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            require_text(&mut errors, "title", title);
        }
        check_progress(&mut errors, self.progress);
        if let Some(color) = &self.color {
            check_color(&mut errors, "color", color.as_deref());
        }
        ApiError::check(errors)
    }

    /// Caller must have validated the patch; out-of-range progress is clamped.
    pub fn apply(self, goal: &mut Goal) {
        if let Some(title) = self.title {
            goal.title = title;
        }
        if let Some(progress) = self.progress {
            goal.progress = progress.clamp(0, 100) as u8;
        }
        if let Some(color) = self.color {
            goal.color = color;
        }
        if let Some(course_id) = self.course_id {
            goal.course_id = course_id;
        }
    }
}

// ---------------------------------------------------------------------------
// Pomodoro sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    pub id: Id,
    pub user_id: Id,
    pub task_id: Option<Id>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Minutes.
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    #[serde(default)]
    pub task_id: Option<Id>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration: u32,
}

/// A logged session may not exceed one day.
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

fn check_duration(errors: &mut Vec<FieldError>, duration: Option<u32>) {
    match duration {
        Some(0) => errors.push(FieldError::new("duration", "Duration must be positive")),
        Some(minutes) if minutes > MAX_SESSION_MINUTES => errors.push(FieldError::new(
            "duration",
            format!("Duration must be at most {} minutes", MAX_SESSION_MINUTES),
        )),
        _ => {}
    }
}

fn check_session_window(
    errors: &mut Vec<FieldError>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.push(FieldError::new("endTime", "End time precedes start time"));
        }
    }
}

impl NewSession {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        check_duration(&mut errors, Some(self.duration));
        check_session_window(&mut errors, Some(self.start_time), self.end_time);
        ApiError::check(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub task_id: Option<Option<Id>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub duration: Option<u32>,
}

impl SessionPatch {
    /// Validated against the stored session so a patch cannot invert the window.
    pub fn validate(&self, current: &PomodoroSession) -> ApiResult<()> {
        let mut errors = Vec::new();
        check_duration(&mut errors, self.duration);
        let start = self.start_time.unwrap_or(current.start_time);
        let end = match self.end_time {
            Some(end) => end,
            None => current.end_time,
        };
        check_session_window(&mut errors, Some(start), end);
        ApiError::check(errors)
    }

    pub fn apply(self, session: &mut PomodoroSession) {
        if let Some(task_id) = self.task_id {
            session.task_id = task_id;
        }
        if let Some(start_time) = self.start_time {
            session.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            session.end_time = end_time;
        }
        if let Some(duration) = self.duration {
            session.duration = duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_date_accepts_rfc3339_and_plain_days() {
        let full = parse_due_date("2025-05-15T10:30:00Z").unwrap();
        assert_eq!(full, Utc.with_ymd_and_hms(2025, 5, 15, 10, 30, 0).unwrap());

        let day = parse_due_date("2025-05-15").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2025, 5, 15, 0, 0, 0).unwrap());

        assert!(parse_due_date("next tuesday").is_none());
    }

    #[test]
    fn new_task_defaults_priority_and_completion() {
        let request = NewTaskRequest {
            title: "Read chapter 4".to_string(),
            ..Default::default()
        };
        let task = request.validate().unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert!(task.due_date.is_none());
    }

    #[test]
    fn new_task_reports_every_bad_field() {
        let request = NewTaskRequest {
            title: "  ".to_string(),
            due_date: Some("soon".to_string()),
            ..Default::default()
        };
        match request.validate() {
            Err(ApiError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "dueDate"]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn task_patch_distinguishes_null_from_absent() {
        let clear: TaskPatchRequest = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(clear.due_date, Some(None));

        let untouched: TaskPatchRequest = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(untouched.due_date, None);
        assert_eq!(untouched.completed, Some(true));
    }

    #[test]
    fn goal_progress_must_be_a_percentage() {
        let goal = NewGoal {
            title: "Finish thesis".to_string(),
            progress: Some(120),
            ..Default::default()
        };
        assert!(goal.validate().is_err());
    }

    #[test]
    fn user_password_is_not_serialized() {
        let user = User {
            id: 1,
            username: "student".to_string(),
            password: "password123".to_string(),
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            university: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["firstName"], "John");
    }

    #[test]
    fn session_duration_is_bounded() {
        let start = Utc.with_ymd_and_hms(2025, 5, 14, 9, 0, 0).unwrap();
        let session = |duration| NewSession {
            task_id: None,
            start_time: start,
            end_time: None,
            duration,
        };
        assert!(session(25).validate().is_ok());
        assert!(session(MAX_SESSION_MINUTES).validate().is_ok());
        assert!(session(0).validate().is_err());
        assert!(session(3_000_000_000).validate().is_err());

        let stored = PomodoroSession {
            id: 1,
            user_id: 1,
            task_id: None,
            start_time: start,
            end_time: None,
            duration: 25,
        };
        let patch = SessionPatch {
            duration: Some(MAX_SESSION_MINUTES + 1),
            ..Default::default()
        };
        assert!(patch.validate(&stored).is_err());
    }

    #[test]
    fn colours_must_be_hex() {
        assert!(is_hex_color("#6C5CE7"));
        assert!(!is_hex_color("purple"));
        assert!(!is_hex_color("#6C5CE"));
    }
}
