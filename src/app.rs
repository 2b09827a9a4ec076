//! HTTP routing, handlers and request logging.

use axum::{
    Json, Router,
    extract::{
        Path, Query, Request, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::calendar::{self, WeekView};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::goals::{self, GoalSummary};
use crate::mindmap::{self, EdgeSelection};
use crate::models::{
    Course, Goal, GoalPatch, Id, MindMapEdge, MindMapNode, NewCourse, NewEdge, NewGoal,
    NewSession, NewTaskRequest, NodeDraft, NodePatch, PomodoroSession, SessionPatch, Task,
    TaskPatchRequest, User,
};
use crate::notifications::{Inbox, InboxEntry, InboxNotifier, InboxView, NewNotification};
use crate::pomodoro::{Mode, PomodoroTimer, SettingsPatch, TimerSettings, TimerSnapshot};
use crate::stats::{self, StatsReport};
use crate::store::{CURRENT_USER_ID, MemStore, StoreRecorder};
use crate::tasks::{self, TaskQuery};
use crate::ticker::Ticker;

/// Shared state behind every handler.
///
/// Lock order is timer, then store or inbox: the timer's recorder and
/// notifier write into them while the timer is held.
pub struct AppState {
    pub store: Arc<Mutex<MemStore>>,
    pub timer: Arc<Mutex<PomodoroTimer>>,
    pub inbox: Arc<Mutex<Inbox>>,
    selection: Mutex<EdgeSelection>,
    user_id: Id,
}

impl AppState {
    /// Wire a store and a timer whose finished pomodoros land in that store.
    ///
    /// # Arguments
    /// * `store` - Initial records, usually [`MemStore::seeded`]
    /// * `settings` - Durations and auto-start flags for the timer
    ///
    /// # Returns
    /// * `Arc<AppState>` - State ready to hand to [`router`]
    pub fn new(store: MemStore, settings: TimerSettings) -> Arc<Self> {
        let store = Arc::new(Mutex::new(store));
        let inbox = Arc::new(Mutex::new(Inbox::new()));
        let timer = PomodoroTimer::new(settings)
            .with_recorder(StoreRecorder::new(Arc::clone(&store), CURRENT_USER_ID))
            .with_notifier(InboxNotifier::new(Arc::clone(&inbox)));

        Arc::new(AppState {
            store,
            timer: Arc::new(Mutex::new(timer)),
            inbox,
            selection: Mutex::new(EdgeSelection::default()),
            user_id: CURRENT_USER_ID,
        })
    }
}

type Shared = State<Arc<AppState>>;

fn parse_id(raw: &str) -> ApiResult<Id> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid id: {}", raw)))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/user", get(current_user))
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", patch(update_task).delete(delete_task))
        .route("/api/mindmap/nodes", get(list_nodes).post(create_node))
        .route("/api/mindmap/nodes/:id", patch(update_node).delete(delete_node))
        .route("/api/mindmap/nodes/:id/select", post(select_node))
        .route("/api/mindmap/selection", get(current_selection).delete(clear_selection))
        .route("/api/mindmap/edges", get(list_edges).post(create_edge))
        .route("/api/mindmap/edges/:id", delete(delete_edge))
        .route("/api/goals", get(list_goals).post(create_goal))
        .route("/api/goals/summary", get(goal_summary))
        .route("/api/goals/:id", patch(update_goal).delete(delete_goal))
        .route("/api/pomodoro/sessions", get(list_sessions).post(create_session))
        .route("/api/pomodoro/sessions/:id", patch(update_session))
        .route("/api/pomodoro/stats", get(session_stats))
        .route("/api/pomodoro/timer", get(timer_status))
        .route("/api/pomodoro/timer/start", post(start_timer))
        .route("/api/pomodoro/timer/pause", post(pause_timer))
        .route("/api/pomodoro/timer/stop", post(stop_timer))
        .route("/api/pomodoro/timer/reset", post(reset_timer))
        .route("/api/pomodoro/timer/reset-all", post(reset_all_timer))
        .route("/api/pomodoro/timer/mode", post(set_timer_mode))
        .route("/api/pomodoro/timer/settings", post(update_timer_settings))
        .route("/api/calendar/week", get(calendar_week))
        .route(
            "/api/notifications",
            get(list_notifications)
                .post(create_notification)
                .delete(clear_notifications),
        )
        .route("/api/notifications/read-all", post(mark_all_notifications_read))
        .route("/api/notifications/:id", delete(delete_notification))
        .route("/api/notifications/:id/read", post(mark_notification_read))
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until ctrl-c, ticking the shared timer in the background.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config.timer_settings();
    settings.validate()?;

    let store = if config.no_seed {
        MemStore::new()
    } else {
        MemStore::seeded()
    };
    let state = AppState::new(store, settings);
    let ticker = Ticker::spawn(Arc::clone(&state.timer));

    let listener = TcpListener::bind(config.bind).await?;
    log::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("shutting down");
        })
        .await?;

    ticker.shutdown().await;
    Ok(())
}

/// Request logging middleware: method, path, status and latency.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{} {} {} {:.1?}",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn current_user(State(state): Shared) -> ApiResult<Json<User>> {
    let store = state.store.lock()?;
    let user = store.user(state.user_id).ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user.clone()))
}

// Courses

async fn list_courses(State(state): Shared) -> ApiResult<Json<Vec<Course>>> {
    let store = state.store.lock()?;
    Ok(Json(store.courses_for(state.user_id)))
}

async fn create_course(
    State(state): Shared,
    payload: Result<Json<NewCourse>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    let Json(new_course) = payload?;
    new_course.validate()?;
    let mut store = state.store.lock()?;
    let course = store.create_course(state.user_id, new_course);
    Ok((StatusCode::CREATED, Json(course)))
}

// Tasks

async fn list_tasks(
    State(state): Shared,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(query) = query?;
    let store = state.store.lock()?;
    Ok(Json(tasks::view(&store.tasks_for(state.user_id), &query)))
}

async fn create_task(
    State(state): Shared,
    payload: Result<Json<NewTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(request) = payload?;
    let new_task = request.validate()?;
    let mut store = state.store.lock()?;
    let task = store.create_task(state.user_id, new_task);
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): Shared,
    Path(id): Path<String>,
    payload: Result<Json<TaskPatchRequest>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let patch = request.validate()?;
    let mut store = state.store.lock()?;
    let task = store.update_task(id, patch).ok_or(ApiError::NotFound("Task"))?;
    Ok(Json(task))
}

async fn delete_task(State(state): Shared, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let mut store = state.store.lock()?;
    if !store.delete_task(id) {
        return Err(ApiError::NotFound("Task"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Mind map

async fn list_nodes(State(state): Shared) -> ApiResult<Json<Vec<MindMapNode>>> {
    let store = state.store.lock()?;
    Ok(Json(store.nodes_for(state.user_id)))
}

async fn create_node(
    State(state): Shared,
    payload: Result<Json<NodeDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MindMapNode>)> {
    let Json(draft) = payload?;
    draft.validate()?;
    let new_node = mindmap::place(draft, &mut rand::thread_rng());
    let mut store = state.store.lock()?;
    let node = store.create_node(state.user_id, new_node);
    Ok((StatusCode::CREATED, Json(node)))
}

async fn update_node(
    State(state): Shared,
    Path(id): Path<String>,
    payload: Result<Json<NodePatch>, JsonRejection>,
) -> ApiResult<Json<MindMapNode>> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    patch.validate()?;
    let mut store = state.store.lock()?;
    let node = store.update_node(id, patch).ok_or(ApiError::NotFound("Node"))?;
    Ok(Json(node))
}

async fn delete_node(State(state): Shared, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    {
        let mut store = state.store.lock()?;
        if !store.delete_node(id) {
            return Err(ApiError::NotFound("Node"));
        }
    }
    let mut selection = state.selection.lock()?;
    if selection.armed() == Some(id) {
        selection.clear();
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Second half of the two-click edge gesture: answers 201 with the new edge
/// once two distinct nodes have been picked, else 200 with the selection.
async fn select_node(State(state): Shared, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let mut store = state.store.lock()?;
    if store.node(id).is_none() {
        return Err(ApiError::NotFound("Node"));
    }
    let mut selection = state.selection.lock()?;
    match selection.select(id) {
        Some(new_edge) => {
            let edge = store.create_edge(state.user_id, new_edge);
            log::debug!("connected node {} to node {}", edge.source_id, edge.target_id);
            Ok((StatusCode::CREATED, Json(edge)).into_response())
        }
        None => Ok(Json(*selection).into_response()),
    }
}

async fn current_selection(State(state): Shared) -> ApiResult<Json<EdgeSelection>> {
    Ok(Json(*state.selection.lock()?))
}

async fn clear_selection(State(state): Shared) -> ApiResult<StatusCode> {
    state.selection.lock()?.clear();
    Ok(StatusCode::NO_CONTENT)
}

async fn list_edges(State(state): Shared) -> ApiResult<Json<Vec<MindMapEdge>>> {
    let store = state.store.lock()?;
    Ok(Json(store.edges_for(state.user_id)))
}

async fn create_edge(
    State(state): Shared,
    payload: Result<Json<NewEdge>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MindMapEdge>)> {
    let Json(new_edge) = payload?;
    let mut store = state.store.lock()?;
    let edge = store.create_edge(state.user_id, new_edge);
    Ok((StatusCode::CREATED, Json(edge)))
}

async fn delete_edge(State(state): Shared, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let mut store = state.store.lock()?;
    if !store.delete_edge(id) {
        return Err(ApiError::NotFound("Edge"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Goals

async fn list_goals(State(state): Shared) -> ApiResult<Json<Vec<Goal>>> {
    let store = state.store.lock()?;
    Ok(Json(store.goals_for(state.user_id)))
}

async fn create_goal(
    State(state): Shared,
    payload: Result<Json<NewGoal>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let Json(new_goal) = payload?;
    new_goal.validate()?;
    let mut store = state.store.lock()?;
    let goal = store.create_goal(state.user_id, new_goal);
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn update_goal(
    State(state): Shared,
    Path(id): Path<String>,
    payload: Result<Json<GoalPatch>, JsonRejection>,
) -> ApiResult<Json<Goal>> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    patch.validate()?;
    let mut store = state.store.lock()?;
    let goal = store.update_goal(id, patch).ok_or(ApiError::NotFound("Goal"))?;
    Ok(Json(goal))
}

async fn delete_goal(State(state): Shared, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let mut store = state.store.lock()?;
    if !store.delete_goal(id) {
        return Err(ApiError::NotFound("Goal"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn goal_summary(State(state): Shared) -> ApiResult<Json<GoalSummary>> {
    let store = state.store.lock()?;
    let summary = goals::summarize(
        &store.goals_for(state.user_id),
        &store.courses_for(state.user_id),
    );
    Ok(Json(summary))
}

// Pomodoro sessions

async fn list_sessions(State(state): Shared) -> ApiResult<Json<Vec<PomodoroSession>>> {
    let store = state.store.lock()?;
    Ok(Json(store.sessions_for(state.user_id)))
}

async fn create_session(
    State(state): Shared,
    payload: Result<Json<NewSession>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PomodoroSession>)> {
    let Json(new_session) = payload?;
    new_session.validate()?;
    let mut store = state.store.lock()?;
    let session = store.create_session(state.user_id, new_session);
    Ok((StatusCode::CREATED, Json(session)))
}

async fn update_session(
    State(state): Shared,
    Path(id): Path<String>,
    payload: Result<Json<SessionPatch>, JsonRejection>,
) -> ApiResult<Json<PomodoroSession>> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    let mut store = state.store.lock()?;
    let current = store.session(id).ok_or(ApiError::NotFound("Session"))?;
    patch.validate(current)?;
    let session = store
        .update_session(id, patch)
        .ok_or(ApiError::NotFound("Session"))?;
    Ok(Json(session))
}

async fn session_stats(State(state): Shared) -> ApiResult<Json<StatsReport>> {
    let store = state.store.lock()?;
    let today = Utc::now().date_naive();
    Ok(Json(stats::report(&store.sessions_for(state.user_id), today)))
}

// Timer

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartTimer {
    #[serde(default)]
    task_id: Option<Id>,
}

#[derive(Debug, Deserialize)]
struct ModeChange {
    mode: Mode,
}

async fn timer_status(State(state): Shared) -> ApiResult<Json<TimerSnapshot>> {
    Ok(Json(state.timer.lock()?.snapshot()))
}

/// An empty body starts without touching the bound task.
async fn start_timer(
    State(state): Shared,
    payload: Result<Json<StartTimer>, JsonRejection>,
) -> ApiResult<Json<TimerSnapshot>> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => StartTimer::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let mut timer = state.timer.lock()?;
    if body.task_id.is_some() {
        timer.select_task(body.task_id);
    }
    if timer.start() {
        log::info!("pomodoro timer started in {} mode", timer.mode());
    }
    Ok(Json(timer.snapshot()))
}

async fn pause_timer(State(state): Shared) -> ApiResult<Json<TimerSnapshot>> {
    let mut timer = state.timer.lock()?;
    timer.pause();
    Ok(Json(timer.snapshot()))
}

async fn stop_timer(State(state): Shared) -> ApiResult<Json<TimerSnapshot>> {
    let mut timer = state.timer.lock()?;
    timer.stop();
    Ok(Json(timer.snapshot()))
}

async fn reset_timer(State(state): Shared) -> ApiResult<Json<TimerSnapshot>> {
    let mut timer = state.timer.lock()?;
    timer.reset();
    Ok(Json(timer.snapshot()))
}

async fn reset_all_timer(State(state): Shared) -> ApiResult<Json<TimerSnapshot>> {
    let mut timer = state.timer.lock()?;
    timer.reset_all();
    Ok(Json(timer.snapshot()))
}

async fn set_timer_mode(
    State(state): Shared,
    payload: Result<Json<ModeChange>, JsonRejection>,
) -> ApiResult<Json<TimerSnapshot>> {
    let Json(change) = payload?;
    let mut timer = state.timer.lock()?;
    timer.set_mode(change.mode);
    Ok(Json(timer.snapshot()))
}

async fn update_timer_settings(
    State(state): Shared,
    payload: Result<Json<SettingsPatch>, JsonRejection>,
) -> ApiResult<Json<TimerSnapshot>> {
    let Json(patch) = payload?;
    let mut timer = state.timer.lock()?;
    timer.update_settings(&patch)?;
    Ok(Json(timer.snapshot()))
}

// Calendar

#[derive(Debug, Deserialize)]
struct WeekQuery {
    start: Option<NaiveDate>,
}

async fn calendar_week(
    State(state): Shared,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> ApiResult<Json<WeekView>> {
    let Query(query) = query?;
    let today = Utc::now().date_naive();
    let store = state.store.lock()?;
    let week = calendar::week_view(
        &store.tasks_for(state.user_id),
        query.start.unwrap_or(today),
        today,
    );
    Ok(Json(week))
}

// Notifications

async fn list_notifications(State(state): Shared) -> ApiResult<Json<InboxView>> {
    Ok(Json(state.inbox.lock()?.view()))
}

async fn create_notification(
    State(state): Shared,
    payload: Result<Json<NewNotification>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InboxEntry>)> {
    let Json(new) = payload?;
    new.validate()?;
    let entry = state.inbox.lock()?.push(new);
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn mark_notification_read(
    State(state): Shared,
    Path(id): Path<String>,
) -> ApiResult<Json<InboxEntry>> {
    let id = parse_id(&id)?;
    let entry = state
        .inbox
        .lock()?
        .mark_read(id)
        .ok_or(ApiError::NotFound("Notification"))?;
    Ok(Json(entry))
}

async fn mark_all_notifications_read(State(state): Shared) -> ApiResult<Json<InboxView>> {
    let mut inbox = state.inbox.lock()?;
    inbox.mark_all_read();
    Ok(Json(inbox.view()))
}

async fn delete_notification(State(state): Shared, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    if !state.inbox.lock()?.remove(id) {
        return Err(ApiError::NotFound("Notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_notifications(State(state): Shared) -> ApiResult<StatusCode> {
    state.inbox.lock()?.clear();
    Ok(StatusCode::NO_CONTENT)
}
