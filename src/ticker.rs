//! Background clock for the shared pomodoro timer.
//!
//! A tokio task ticks the timer once per second until it is shut down.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::pomodoro::PomodoroTimer;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Tick once; `false` when the timer can no longer be reached.
fn advance(timer: &Mutex<PomodoroTimer>) -> bool {
    let Ok(mut timer) = timer.lock() else {
        log::error!("pomodoro ticker stopping: timer lock poisoned");
        return false;
    };
    if let Some(transition) = timer.tick() {
        log::info!(
            "pomodoro timer moved from {} to {} ({} completed)",
            transition.from,
            transition.to,
            transition.completed_pomodoros
        );
    }
    true
}

/// Handle to the background task that drives a shared timer.
pub struct Ticker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Tick `timer` once per [`TICK_PERIOD`] until [`Ticker::shutdown`].
    ///
    /// Ticks missed while the runtime was busy are skipped rather than
    /// delivered in a burst.
    pub fn spawn(timer: Arc<Mutex<PomodoroTimer>>) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut clock = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = clock.tick() => {
                        if !advance(&timer) {
                            break;
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            log::debug!("pomodoro ticker stopped");
        });

        Ticker { shutdown, handle }
    }

    /// Stop ticking and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pomodoro::{Mode, TimerSettings};

    fn one_minute_timer() -> Arc<Mutex<PomodoroTimer>> {
        let settings = TimerSettings {
            pomodoro_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 2,
            ..TimerSettings::default()
        };
        Arc::new(Mutex::new(PomodoroTimer::new(settings)))
    }

    #[tokio::test(start_paused = true)]
    async fn drives_a_running_timer_to_completion() {
        let timer = one_minute_timer();
        timer.lock().unwrap().start();
        let ticker = Ticker::spawn(Arc::clone(&timer));

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        assert_eq!(timer.lock().unwrap().remaining_seconds(), 30);

        tokio::time::sleep(Duration::from_secs(31)).await;
        {
            let timer = timer.lock().unwrap();
            assert_eq!(timer.mode(), Mode::ShortBreak);
            assert_eq!(timer.completed_pomodoros(), 1);
            assert!(!timer.is_running());
        }

        ticker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_is_left_alone() {
        let timer = one_minute_timer();
        let ticker = Ticker::spawn(Arc::clone(&timer));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(timer.lock().unwrap().remaining_seconds(), 60);

        ticker.shutdown().await;
    }
}
