//! Pomodoro session state machine.
//!
//! The timer cycles between a focus interval (`pomodoro`) and a break
//! (`shortBreak` or `longBreak`). It is advanced by [`PomodoroTimer::tick`],
//! which the caller invokes once per second while the timer runs; the timer
//! itself never reads a clock to count down, so pausing and resuming can
//! neither lose nor gain time.
//!
//! Finishing a focus interval has two optional side effects, both injected:
//! a [`SessionRecorder`] that logs the session and a [`Notifier`] that shows
//! the user a title/body pair.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ApiError, ApiResult, FieldError};
use crate::models::Id;

pub const DEFAULT_POMODORO_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;
/// Longest interval a setting may ask for: one day.
pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub fn is_break(self) -> bool {
        !matches!(self, Mode::Pomodoro)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mode::Pomodoro => "pomodoro",
            Mode::ShortBreak => "short break",
            Mode::LongBreak => "long break",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub pomodoro_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    /// Every n-th completed pomodoro is followed by a long break.
    pub long_break_interval: u32,
    pub auto_start_breaks: bool,
    pub auto_start_pomodoros: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        TimerSettings {
            pomodoro_minutes: DEFAULT_POMODORO_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

impl TimerSettings {
    pub fn minutes_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Pomodoro => self.pomodoro_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        }
    }

    pub fn seconds_for(&self, mode: Mode) -> u32 {
        self.minutes_for(mode).saturating_mul(60)
    }

    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("pomodoroMinutes", self.pomodoro_minutes),
            ("shortBreakMinutes", self.short_break_minutes),
            ("longBreakMinutes", self.long_break_minutes),
        ] {
            if value == 0 {
                errors.push(FieldError::new(field, "Duration must be at least one minute"));
            } else if value > MAX_INTERVAL_MINUTES {
                errors.push(FieldError::new(
                    field,
                    format!("Duration must be at most {} minutes", MAX_INTERVAL_MINUTES),
                ));
            }
        }
        if self.long_break_interval == 0 {
            errors.push(FieldError::new("longBreakInterval", "Interval must be positive"));
        }
        ApiError::check(errors)
    }
}

/// Partial settings update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub pomodoro_minutes: Option<u32>,
    pub short_break_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
    pub long_break_interval: Option<u32>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_pomodoros: Option<bool>,
}

impl SettingsPatch {
    fn merged(&self, base: &TimerSettings) -> TimerSettings {
        TimerSettings {
            pomodoro_minutes: self.pomodoro_minutes.unwrap_or(base.pomodoro_minutes),
            short_break_minutes: self.short_break_minutes.unwrap_or(base.short_break_minutes),
            long_break_minutes: self.long_break_minutes.unwrap_or(base.long_break_minutes),
            long_break_interval: self.long_break_interval.unwrap_or(base.long_break_interval),
            auto_start_breaks: self.auto_start_breaks.unwrap_or(base.auto_start_breaks),
            auto_start_pomodoros: self
                .auto_start_pomodoros
                .unwrap_or(base.auto_start_pomodoros),
        }
    }
}

/// A finished focus interval, as handed to the [`SessionRecorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    pub task_id: Option<Id>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minutes.
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

pub trait SessionRecorder: Send {
    fn record(&self, entry: &SessionLog);
}

pub trait Notifier: Send {
    fn notify(&self, notification: &Notification);
}

/// What a completion did to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    pub completed_pomodoros: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub mode: Mode,
    pub running: bool,
    pub remaining_seconds: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub completed_pomodoros: u32,
    pub current_task_id: Option<Id>,
    pub started_at: Option<DateTime<Utc>>,
    pub settings: TimerSettings,
}

pub struct PomodoroTimer {
    settings: TimerSettings,
    mode: Mode,
    running: bool,
    remaining: u32,
    /// Length of the interval in progress, fixed when it is filled.
    interval_minutes: u32,
    completed: u32,
    current_task: Option<Id>,
    started_at: Option<DateTime<Utc>>,
    recorder: Option<Box<dyn SessionRecorder>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl fmt::Debug for PomodoroTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PomodoroTimer")
            .field("mode", &self.mode)
            .field("running", &self.running)
            .field("remaining", &self.remaining)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        PomodoroTimer::new(TimerSettings::default())
    }
}

impl PomodoroTimer {
    pub fn new(settings: TimerSettings) -> Self {
        let remaining = settings.seconds_for(Mode::Pomodoro);
        PomodoroTimer {
            interval_minutes: settings.pomodoro_minutes,
            settings,
            mode: Mode::Pomodoro,
            running: false,
            remaining,
            completed: 0,
            current_task: None,
            started_at: None,
            recorder: None,
            notifier: None,
        }
    }

    pub fn with_recorder(mut self, recorder: impl SessionRecorder + 'static) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    pub fn completed_pomodoros(&self) -> u32 {
        self.completed
    }

    pub fn current_task(&self) -> Option<Id> {
        self.current_task
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            running: self.running,
            remaining_seconds: self.remaining,
            minutes: self.remaining / 60,
            seconds: self.remaining % 60,
            completed_pomodoros: self.completed,
            current_task_id: self.current_task,
            started_at: self.started_at,
            settings: self.settings.clone(),
        }
    }

    /// Bind the task that the next recorded session belongs to.
    pub fn select_task(&mut self, task_id: Option<Id>) {
        self.current_task = task_id;
    }

    /// Start or resume the countdown.
    ///
    /// A fresh interval records its nominal start instant; resuming a paused
    /// interval keeps the earlier one. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        true
    }

    /// Returns `false` if the timer was not running.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Advance one second. Reaching zero completes the current interval.
    pub fn tick(&mut self) -> Option<Transition> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Some(self.complete())
        } else {
            None
        }
    }

    /// Stop and refill the current mode without changing it.
    pub fn stop(&mut self) {
        self.enter(self.mode);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.enter(mode);
    }

    /// Back to a stopped pomodoro; the completed count is kept.
    pub fn reset(&mut self) {
        self.enter(Mode::Pomodoro);
    }

    pub fn reset_all(&mut self) {
        self.reset();
        self.completed = 0;
    }

    /// Apply new durations. While stopped, the current mode's remaining time
    /// follows its new duration.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> ApiResult<()> {
        let settings = patch.merged(&self.settings);
        settings.validate()?;
        self.settings = settings;
        if !self.running {
            self.refill(self.mode);
            self.started_at = None;
        }
        Ok(())
    }

    fn enter(&mut self, mode: Mode) {
        self.mode = mode;
        self.running = false;
        self.refill(mode);
        self.started_at = None;
    }

    fn refill(&mut self, mode: Mode) {
        self.interval_minutes = self.settings.minutes_for(mode);
        self.remaining = self.settings.seconds_for(mode);
    }

    fn complete(&mut self) -> Transition {
        let now = Utc::now();
        let from = self.mode;

        let to = if from == Mode::Pomodoro {
            self.completed += 1;
            self.record_session(now);
            if self.completed % self.settings.long_break_interval == 0 {
                Mode::LongBreak
            } else {
                Mode::ShortBreak
            }
        } else {
            Mode::Pomodoro
        };

        self.mode = to;
        self.refill(to);
        self.running = if to.is_break() {
            self.settings.auto_start_breaks
        } else {
            self.settings.auto_start_pomodoros
        };
        self.started_at = if self.running { Some(now) } else { None };

        self.announce(to);

        Transition {
            from,
            to,
            completed_pomodoros: self.completed,
        }
    }

    fn record_session(&self, now: DateTime<Utc>) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        let duration = self.interval_minutes;
        let start_time = self
            .started_at
            .unwrap_or_else(|| now - Duration::minutes(i64::from(duration)));
        recorder.record(&SessionLog {
            task_id: self.current_task,
            start_time,
            end_time: now,
            duration,
        });
    }

    fn announce(&self, next: Mode) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        notifier.notify(&completion_notice(next, self.completed, &self.settings));
    }
}

/// The message shown when the timer moves into `next`.
pub fn completion_notice(next: Mode, completed: u32, settings: &TimerSettings) -> Notification {
    let (title, body) = match next {
        Mode::LongBreak => (
            "Time for a long break!".to_string(),
            format!(
                "You've completed {} pomodoros. Take a {}-minute break.",
                completed, settings.long_break_minutes
            ),
        ),
        Mode::ShortBreak => (
            "Pomodoro completed!".to_string(),
            format!("Well done! Take a {}-minute break.", settings.short_break_minutes),
        ),
        Mode::Pomodoro => (
            "Break finished!".to_string(),
            "Time to focus on your next pomodoro session.".to_string(),
        ),
    };
    Notification { title, body }
}
