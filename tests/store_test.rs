use std::sync::{Arc, Mutex};

use studyflow::models::{GoalPatch, NewGoal, NewTask, TaskPatch};
use studyflow::pomodoro::{Mode, PomodoroTimer, TimerSettings};
use studyflow::store::{CURRENT_USER_ID, MemStore, StoreRecorder};

#[test]
fn seeded_store_has_sample_account() {
    let store = MemStore::seeded();

    let user = store.user(CURRENT_USER_ID).expect("seed user");
    assert_eq!(user.username, "student");
    assert_eq!(user.university.as_deref(), Some("Stanford University"));
    assert_eq!(store.user_by_username("student").map(|u| u.id), Some(1));

    let codes: Vec<String> = store
        .courses_for(CURRENT_USER_ID)
        .into_iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, vec!["CS 401", "MATH 240", "PHYS 210"]);
    assert!(store.tasks_for(CURRENT_USER_ID).is_empty());
}

#[test]
fn partial_task_update_touches_only_given_fields() {
    let mut store = MemStore::new();
    let task = store.create_task(
        1,
        NewTask {
            title: "Essay draft".to_string(),
            description: Some("2000 words".to_string()),
            ..Default::default()
        },
    );

    let updated = store
        .update_task(
            task.id,
            TaskPatch {
                completed: Some(true),
                description: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(updated.completed);
    assert_eq!(updated.description, None);
    assert_eq!(updated.title, "Essay draft");
    assert_eq!(updated.created_at, task.created_at);
    assert!(store.update_task(99, TaskPatch::default()).is_none());
}

#[test]
fn goal_progress_defaults_and_updates() {
    let mut store = MemStore::new();
    let goal = store.create_goal(
        1,
        NewGoal {
            title: "Semester".to_string(),
            ..Default::default()
        },
    );
    assert_eq!(goal.progress, 0);

    let goal = store
        .update_goal(
            goal.id,
            GoalPatch {
                progress: Some(68),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(goal.progress, 68);
    assert!(store.delete_goal(goal.id));
    assert!(!store.delete_goal(goal.id));
}

#[test]
fn finished_pomodoro_lands_in_session_log() {
    let store = Arc::new(Mutex::new(MemStore::seeded()));
    let settings = TimerSettings {
        pomodoro_minutes: 1,
        ..TimerSettings::default()
    };
    let mut timer = PomodoroTimer::new(settings)
        .with_recorder(StoreRecorder::new(Arc::clone(&store), CURRENT_USER_ID));

    timer.select_task(Some(4));
    timer.start();
    for _ in 0..60 {
        timer.tick();
    }
    assert_eq!(timer.mode(), Mode::ShortBreak);

    let sessions = store.lock().unwrap().sessions_for(CURRENT_USER_ID);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].task_id, Some(4));
    assert_eq!(sessions[0].duration, 1);
    assert!(sessions[0].end_time.is_some());
}
