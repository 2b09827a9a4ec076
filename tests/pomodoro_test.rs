use std::sync::{Arc, Mutex};

use studyflow::pomodoro::{
    Mode, Notification, Notifier, PomodoroTimer, SessionLog, SessionRecorder, SettingsPatch,
    TimerSettings,
};

#[derive(Clone, Default)]
struct Captured {
    sessions: Arc<Mutex<Vec<SessionLog>>>,
    notices: Arc<Mutex<Vec<Notification>>>,
}

impl SessionRecorder for Captured {
    fn record(&self, entry: &SessionLog) {
        self.sessions.lock().unwrap().push(entry.clone());
    }
}

impl Notifier for Captured {
    fn notify(&self, notification: &Notification) {
        self.notices.lock().unwrap().push(notification.clone());
    }
}

fn settings(pomodoro: u32, short: u32, long: u32) -> TimerSettings {
    TimerSettings {
        pomodoro_minutes: pomodoro,
        short_break_minutes: short,
        long_break_minutes: long,
        ..TimerSettings::default()
    }
}

fn run_out(timer: &mut PomodoroTimer) {
    let seconds = timer.remaining_seconds();
    for _ in 0..seconds {
        timer.tick();
    }
}

#[test]
fn full_pomodoro_leaves_focus_exactly_once() {
    for minutes in [1, 2, 5] {
        let mut timer = PomodoroTimer::new(settings(minutes, 1, 1));
        timer.start();

        let mut transitions = 0;
        for _ in 0..minutes * 60 {
            if let Some(transition) = timer.tick() {
                assert_eq!(transition.from, Mode::Pomodoro);
                transitions += 1;
            }
        }

        assert_eq!(transitions, 1, "{} minute pomodoro", minutes);
        assert_eq!(timer.mode(), Mode::ShortBreak);
        assert_eq!(timer.completed_pomodoros(), 1);
    }
}

#[test]
fn pause_and_resume_keep_remaining_time() {
    let mut timer = PomodoroTimer::default();
    timer.start();
    for _ in 0..100 {
        timer.tick();
    }
    assert!(timer.pause());
    let paused_at = timer.remaining_seconds();
    assert_eq!(paused_at, 25 * 60 - 100);

    for _ in 0..50 {
        timer.tick();
    }
    assert_eq!(timer.remaining_seconds(), paused_at);

    assert!(timer.start());
    timer.tick();
    assert_eq!(timer.remaining_seconds(), paused_at - 1);
}

#[test]
fn fourth_completion_earns_a_long_break() {
    let mut timer = PomodoroTimer::new(settings(1, 1, 2));
    let mut breaks = Vec::new();

    for _ in 0..4 {
        timer.start();
        run_out(&mut timer);
        breaks.push(timer.mode());
        timer.start();
        run_out(&mut timer);
        assert_eq!(timer.mode(), Mode::Pomodoro);
    }

    assert_eq!(
        breaks,
        vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
    );
    assert_eq!(timer.completed_pomodoros(), 4);
}

#[test]
fn reset_keeps_count_and_reset_all_clears_it() {
    let mut timer = PomodoroTimer::new(settings(1, 1, 1));
    timer.start();
    run_out(&mut timer);
    timer.start();
    for _ in 0..10 {
        timer.tick();
    }

    timer.reset();
    assert_eq!(timer.mode(), Mode::Pomodoro);
    assert!(!timer.is_running());
    assert_eq!(timer.remaining_seconds(), 60);
    assert_eq!(timer.completed_pomodoros(), 1);

    timer.reset_all();
    assert_eq!(timer.completed_pomodoros(), 0);
    assert_eq!(timer.remaining_seconds(), 60);
}

#[test]
fn breaks_wait_for_start_unless_configured() {
    let mut manual = PomodoroTimer::new(settings(1, 1, 1));
    manual.start();
    run_out(&mut manual);
    assert_eq!(manual.mode(), Mode::ShortBreak);
    assert!(!manual.is_running());

    let mut automatic = PomodoroTimer::new(TimerSettings {
        auto_start_breaks: true,
        ..settings(1, 1, 1)
    });
    automatic.start();
    run_out(&mut automatic);
    assert!(automatic.is_running());
    run_out(&mut automatic);
    assert_eq!(automatic.mode(), Mode::Pomodoro);
    assert!(!automatic.is_running(), "pomodoros do not auto-start by default");
}

#[test]
fn completion_records_session_and_notifies() {
    let captured = Captured::default();
    let mut timer = PomodoroTimer::new(settings(1, 1, 1))
        .with_recorder(captured.clone())
        .with_notifier(captured.clone());

    timer.select_task(Some(7));
    timer.start();
    run_out(&mut timer);
    timer.start();
    run_out(&mut timer);

    let sessions = captured.sessions.lock().unwrap();
    assert_eq!(sessions.len(), 1, "breaks are not recorded");
    assert_eq!(sessions[0].task_id, Some(7));
    assert_eq!(sessions[0].duration, 1);
    assert!(sessions[0].start_time <= sessions[0].end_time);

    let titles: Vec<String> = captured
        .notices
        .lock()
        .unwrap()
        .iter()
        .map(|n| n.title.clone())
        .collect();
    assert_eq!(titles, vec!["Pomodoro completed!", "Break finished!"]);
}

#[test]
fn stop_and_set_mode_refill_the_interval() {
    let mut timer = PomodoroTimer::new(settings(3, 2, 10));
    timer.set_mode(Mode::LongBreak);
    assert_eq!(timer.remaining_seconds(), 600);

    timer.start();
    for _ in 0..30 {
        timer.tick();
    }
    timer.stop();
    assert_eq!(timer.mode(), Mode::LongBreak);
    assert!(!timer.is_running());
    assert_eq!(timer.remaining_seconds(), 600);
}

#[test]
fn settings_change_refills_a_stopped_timer_only() {
    let mut timer = PomodoroTimer::default();
    let patch = SettingsPatch {
        pomodoro_minutes: Some(50),
        ..Default::default()
    };
    timer.update_settings(&patch).unwrap();
    assert_eq!(timer.remaining_seconds(), 50 * 60);

    timer.start();
    timer.tick();
    let shorter = SettingsPatch {
        pomodoro_minutes: Some(10),
        ..Default::default()
    };
    timer.update_settings(&shorter).unwrap();
    assert_eq!(timer.remaining_seconds(), 50 * 60 - 1);
    assert_eq!(timer.settings().pomodoro_minutes, 10);
}

#[test]
fn session_keeps_length_it_started_with() {
    let captured = Captured::default();
    let mut timer = PomodoroTimer::new(settings(50, 5, 15)).with_recorder(captured.clone());

    timer.start();
    timer.tick();
    let shorter = SettingsPatch {
        pomodoro_minutes: Some(10),
        ..Default::default()
    };
    timer.update_settings(&shorter).unwrap();
    run_out(&mut timer);

    {
        let sessions = captured.sessions.lock().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration, 50);
    }

    // the next focus interval picks up the new length
    timer.start();
    run_out(&mut timer);
    timer.start();
    run_out(&mut timer);
    assert_eq!(captured.sessions.lock().unwrap()[1].duration, 10);
}
