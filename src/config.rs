//! Command-line configuration with `STUDYFLOW_*` environment fallbacks.

use clap::{Args, Parser};
use std::net::SocketAddr;

use crate::pomodoro::{
    DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_LONG_BREAK_MINUTES, DEFAULT_POMODORO_MINUTES,
    DEFAULT_SHORT_BREAK_MINUTES, TimerSettings,
};

/// Timer flags shared by the server and the terminal timer.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TimerArgs {
    /// Length of a focus interval in minutes
    #[arg(long, env = "STUDYFLOW_POMODORO_MINUTES", default_value_t = DEFAULT_POMODORO_MINUTES)]
    pub pomodoro_minutes: u32,

    /// Length of a short break in minutes
    #[arg(long, env = "STUDYFLOW_SHORT_BREAK_MINUTES", default_value_t = DEFAULT_SHORT_BREAK_MINUTES)]
    pub short_break_minutes: u32,

    /// Length of a long break in minutes
    #[arg(long, env = "STUDYFLOW_LONG_BREAK_MINUTES", default_value_t = DEFAULT_LONG_BREAK_MINUTES)]
    pub long_break_minutes: u32,

    /// Completed pomodoros between long breaks
    #[arg(long, env = "STUDYFLOW_LONG_BREAK_INTERVAL", default_value_t = DEFAULT_LONG_BREAK_INTERVAL)]
    pub long_break_interval: u32,

    /// Start the break countdown as soon as a pomodoro finishes
    #[arg(long, env = "STUDYFLOW_AUTO_START_BREAKS")]
    pub auto_start_breaks: bool,

    /// Start the next pomodoro as soon as a break finishes
    #[arg(long, env = "STUDYFLOW_AUTO_START_POMODOROS")]
    pub auto_start_pomodoros: bool,
}

impl Default for TimerArgs {
    fn default() -> Self {
        let settings = TimerSettings::default();
        TimerArgs {
            pomodoro_minutes: settings.pomodoro_minutes,
            short_break_minutes: settings.short_break_minutes,
            long_break_minutes: settings.long_break_minutes,
            long_break_interval: settings.long_break_interval,
            auto_start_breaks: settings.auto_start_breaks,
            auto_start_pomodoros: settings.auto_start_pomodoros,
        }
    }
}

impl TimerArgs {
    pub fn settings(&self) -> TimerSettings {
        TimerSettings {
            pomodoro_minutes: self.pomodoro_minutes,
            short_break_minutes: self.short_break_minutes,
            long_break_minutes: self.long_break_minutes,
            long_break_interval: self.long_break_interval,
            auto_start_breaks: self.auto_start_breaks,
            auto_start_pomodoros: self.auto_start_pomodoros,
        }
    }
}

/// API server configuration.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Student productivity API: tasks, goals, mind maps and a pomodoro timer")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "STUDYFLOW_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub timer: TimerArgs,

    /// Start with an empty store instead of the sample account
    #[arg(long, env = "STUDYFLOW_NO_SEED")]
    pub no_seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            timer: TimerArgs::default(),
            no_seed: false,
        }
    }
}

impl Config {
    pub fn timer_settings(&self) -> TimerSettings {
        self.timer.settings()
    }
}

/// Terminal timer configuration; takes the timer flags only.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "focus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pomodoro timer in the terminal")]
pub struct FocusConfig {
    #[command(flatten)]
    pub timer: TimerArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "studyflow",
            "--bind",
            "0.0.0.0:8080",
            "--pomodoro-minutes",
            "50",
            "--auto-start-breaks",
        ])
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        let settings = config.timer_settings();
        assert_eq!(settings.pomodoro_minutes, 50);
        assert_eq!(settings.short_break_minutes, 5);
        assert!(settings.auto_start_breaks);
        assert!(!settings.auto_start_pomodoros);
    }

    #[test]
    fn default_matches_timer_defaults() {
        assert_eq!(Config::default().timer_settings(), TimerSettings::default());
    }

    #[test]
    fn focus_takes_only_timer_flags() {
        let config =
            FocusConfig::try_parse_from(["focus", "--long-break-interval", "3"]).unwrap();
        assert_eq!(config.timer.settings().long_break_interval, 3);

        assert!(FocusConfig::try_parse_from(["focus", "--bind", "0.0.0.0:8080"]).is_err());
        assert!(FocusConfig::try_parse_from(["focus", "--no-seed"]).is_err());
    }
}
