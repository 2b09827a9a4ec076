/*!
# StudyFlow

A student productivity backend built in Rust: task tracking, course-coloured
goals, a mind map editor and a pomodoro focus timer behind a JSON API.

## Architecture

### HTTP Layer
- **Technologies**: axum, tokio, tower-http
- **Key Components**:
  - Router - REST endpoints under `/api`, plus `/health`
  - Request logging middleware
  - Error mapping - validation (400), not found (404), internal (500)

### Domain Layer
- Pomodoro state machine - focus/break cycle with injected session
  recording and notifications
- Ticker - background task driving the shared timer once per second
- Task views - status/course/search filters and due-date/priority/creation sorting
- Mind map - default node layout and two-click edge creation
- Calendar - Monday-start week of tasks by due date
- Goals and statistics - overall progress, streaks and weekly focus minutes
- Notification inbox - the latest 50 notices with read flags

### Storage Layer
- In-memory record store with one map and one id counter per entity
- Nothing is persisted; the store is seeded with a sample account on start

## Modules

- **models**: Records, request payloads and their validation
- **store**: In-memory record store
- **pomodoro**: Timer state machine
- **ticker**: Background clock for the timer
- **tasks**: Task filtering and sorting
- **mindmap**: Node defaults, edge selection, graph queries
- **calendar**: Weekly task view
- **goals**: Goal colours and overall progress
- **stats**: Pomodoro history statistics
- **notifications**: Bounded notification inbox
- **config**: Command-line and environment configuration
- **error**: API error type
- **app**: Routing and middleware
*/

pub mod calendar;
pub mod config;
pub mod error;
pub mod goals;
pub mod mindmap;
pub mod models;
pub mod notifications;
pub mod pomodoro;
pub mod stats;
pub mod store;
pub mod tasks;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod ticker;

pub use error::{ApiError, ApiResult, FieldError};
pub use pomodoro::{Mode, PomodoroTimer, TimerSettings};
pub use store::MemStore;
