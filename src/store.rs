//! In-memory record store.
//!
//! One ordered map and one id counter per entity. Deleting a node also drops
//! the edges that touch it.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::models::{
    Course, Goal, GoalPatch, Id, MindMapEdge, MindMapNode, NewCourse, NewEdge, NewGoal, NewNode,
    NewSession, NewTask, NewUser, NodePatch, PomodoroSession, SessionPatch, Task, TaskPatch, User,
};
use crate::pomodoro::{SessionLog, SessionRecorder};

/// Id of the only account the API serves.
pub const CURRENT_USER_ID: Id = 1;

#[derive(Debug, Default)]
struct IdCounters {
    user: Id,
    course: Id,
    task: Id,
    node: Id,
    edge: Id,
    goal: Id,
    session: Id,
}

fn next_id(counter: &mut Id) -> Id {
    *counter += 1;
    *counter
}

/// In-memory record store.
///
/// One map per entity, keyed by an auto-incrementing id. The store performs
/// no foreign-key checks; owners and references are plain integers. Nothing
/// outlives the process.
#[derive(Debug, Default)]
pub struct MemStore {
    users: BTreeMap<Id, User>,
    courses: BTreeMap<Id, Course>,
    tasks: BTreeMap<Id, Task>,
    nodes: BTreeMap<Id, MindMapNode>,
    edges: BTreeMap<Id, MindMapEdge>,
    goals: BTreeMap<Id, Goal>,
    sessions: BTreeMap<Id, PomodoroSession>,
    ids: IdCounters,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the development account and its courses.
    ///
    /// # Returns
    /// * `MemStore` - A store where user 1 is `student` with three courses
    pub fn seeded() -> Self {
        let mut store = Self::new();

        let user = store.create_user(NewUser {
            username: "student".to_string(),
            password: "password123".to_string(),
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            university: Some("Stanford University".to_string()),
        });

        for (name, code, color) in [
            ("Deep Learning", "CS 401", "#6C5CE7"),
            ("Calculus II", "MATH 240", "#00B894"),
            ("Waves & Optics", "PHYS 210", "#FF6B6B"),
        ] {
            store.create_course(
                user.id,
                NewCourse {
                    name: name.to_string(),
                    code: code.to_string(),
                    color: color.to_string(),
                },
            );
        }

        store
    }

    // Users

    pub fn user(&self, id: Id) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|user| user.username == username)
    }

    pub fn create_user(&mut self, new_user: NewUser) -> User {
        let id = next_id(&mut self.ids.user);
        let user = User {
            id,
            username: new_user.username,
            password: new_user.password,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            university: new_user.university.filter(|u| !u.is_empty()),
        };
        self.users.insert(id, user.clone());
        user
    }

    // Courses

    pub fn course(&self, id: Id) -> Option<&Course> {
        self.courses.get(&id)
    }

    pub fn courses_for(&self, user_id: Id) -> Vec<Course> {
        owned_by(&self.courses, user_id, |course| course.user_id)
    }

    pub fn create_course(&mut self, user_id: Id, new_course: NewCourse) -> Course {
        let id = next_id(&mut self.ids.course);
        let course = Course {
            id,
            user_id,
            name: new_course.name,
            code: new_course.code,
            color: new_course.color,
        };
        self.courses.insert(id, course.clone());
        course
    }

    // Tasks

    pub fn task(&self, id: Id) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn tasks_for(&self, user_id: Id) -> Vec<Task> {
        owned_by(&self.tasks, user_id, |task| task.user_id)
    }

    /// Insert a task stamped with the current time.
    pub fn create_task(&mut self, user_id: Id, new_task: NewTask) -> Task {
        let id = next_id(&mut self.ids.task);
        let task = Task {
            id,
            user_id,
            title: new_task.title,
            description: new_task.description,
            course_id: new_task.course_id,
            due_date: new_task.due_date,
            priority: new_task.priority,
            completed: new_task.completed,
            created_at: Utc::now(),
        };
        self.tasks.insert(id, task.clone());
        task
    }

    /// Merge a partial update into a task.
    ///
    /// # Returns
    /// * `Option<Task>` - The updated task, or `None` when the id is unknown
    pub fn update_task(&mut self, id: Id, patch: TaskPatch) -> Option<Task> {
        let task = self.tasks.get_mut(&id)?;
        patch.apply(task);
        Some(task.clone())
    }

    pub fn delete_task(&mut self, id: Id) -> bool {
        self.tasks.remove(&id).is_some()
    }

    // Mind map

    pub fn node(&self, id: Id) -> Option<&MindMapNode> {
        self.nodes.get(&id)
    }

    pub fn nodes_for(&self, user_id: Id) -> Vec<MindMapNode> {
        owned_by(&self.nodes, user_id, |node| node.user_id)
    }

    pub fn create_node(&mut self, user_id: Id, new_node: NewNode) -> MindMapNode {
        let id = next_id(&mut self.ids.node);
        let node = MindMapNode {
            id,
            user_id,
            title: new_node.title,
            parent_id: new_node.parent_id,
            position: new_node.position,
            color: new_node.color,
            task_id: new_node.task_id,
        };
        self.nodes.insert(id, node.clone());
        node
    }

    pub fn update_node(&mut self, id: Id, patch: NodePatch) -> Option<MindMapNode> {
        let node = self.nodes.get_mut(&id)?;
        patch.apply(node);
        Some(node.clone())
    }

    /// Remove a node together with every edge that touches it.
    ///
    /// Children that point at the node through `parent_id` are left alone;
    /// the parent link is a hint for layout, not an ownership relation.
    ///
    /// # Returns
    /// * `bool` - Whether a node with this id existed
    pub fn delete_node(&mut self, id: Id) -> bool {
        if self.nodes.remove(&id).is_none() {
            return false;
        }
        self.edges
            .retain(|_, edge| edge.source_id != id && edge.target_id != id);
        true
    }

    pub fn edges_for(&self, user_id: Id) -> Vec<MindMapEdge> {
        owned_by(&self.edges, user_id, |edge| edge.user_id)
    }

    pub fn create_edge(&mut self, user_id: Id, new_edge: NewEdge) -> MindMapEdge {
        let id = next_id(&mut self.ids.edge);
        let edge = MindMapEdge {
            id,
            user_id,
            source_id: new_edge.source_id,
            target_id: new_edge.target_id,
        };
        self.edges.insert(id, edge.clone());
        edge
    }

    pub fn delete_edge(&mut self, id: Id) -> bool {
        self.edges.remove(&id).is_some()
    }

    // Goals

    pub fn goals_for(&self, user_id: Id) -> Vec<Goal> {
        owned_by(&self.goals, user_id, |goal| goal.user_id)
    }

    pub fn create_goal(&mut self, user_id: Id, new_goal: NewGoal) -> Goal {
        let id = next_id(&mut self.ids.goal);
        let goal = Goal {
            id,
            user_id,
            title: new_goal.title,
            progress: new_goal.progress.unwrap_or(0).clamp(0, 100) as u8,
            color: new_goal.color,
            course_id: new_goal.course_id,
        };
        self.goals.insert(id, goal.clone());
        goal
    }

    pub fn update_goal(&mut self, id: Id, patch: GoalPatch) -> Option<Goal> {
        let goal = self.goals.get_mut(&id)?;
        patch.apply(goal);
        Some(goal.clone())
    }

    pub fn delete_goal(&mut self, id: Id) -> bool {
        self.goals.remove(&id).is_some()
    }

    // Pomodoro sessions

    pub fn session(&self, id: Id) -> Option<&PomodoroSession> {
        self.sessions.get(&id)
    }

    pub fn sessions_for(&self, user_id: Id) -> Vec<PomodoroSession> {
        owned_by(&self.sessions, user_id, |session| session.user_id)
    }

    pub fn create_session(&mut self, user_id: Id, new_session: NewSession) -> PomodoroSession {
        let id = next_id(&mut self.ids.session);
        let session = PomodoroSession {
            id,
            user_id,
            task_id: new_session.task_id,
            start_time: new_session.start_time,
            end_time: new_session.end_time,
            duration: new_session.duration,
        };
        self.sessions.insert(id, session.clone());
        session
    }

    pub fn update_session(&mut self, id: Id, patch: SessionPatch) -> Option<PomodoroSession> {
        let session = self.sessions.get_mut(&id)?;
        patch.apply(session);
        Some(session.clone())
    }
}

fn owned_by<T: Clone>(map: &BTreeMap<Id, T>, user_id: Id, owner: impl Fn(&T) -> Id) -> Vec<T> {
    map.values()
        .filter(|record| owner(record) == user_id)
        .cloned()
        .collect()
}

/// Appends finished pomodoros to the shared store's session log.
pub struct StoreRecorder {
    store: Arc<Mutex<MemStore>>,
    user_id: Id,
}

impl StoreRecorder {
    pub fn new(store: Arc<Mutex<MemStore>>, user_id: Id) -> Self {
        StoreRecorder { store, user_id }
    }
}

impl SessionRecorder for StoreRecorder {
    fn record(&self, entry: &SessionLog) {
        let Ok(mut store) = self.store.lock() else {
            log::error!("dropping pomodoro session: store lock poisoned");
            return;
        };
        let session = store.create_session(
            self.user_id,
            NewSession {
                task_id: entry.task_id,
                start_time: entry.start_time,
                end_time: Some(entry.end_time),
                duration: entry.duration,
            },
        );
        log::info!(
            "recorded pomodoro session {} ({} min, task {:?})",
            session.id,
            session.duration,
            session.task_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn node(title: &str) -> NewNode {
        NewNode {
            title: title.to_string(),
            parent_id: None,
            position: Position { x: 0.0, y: 0.0 },
            color: None,
            task_id: None,
        }
    }

    #[test]
    fn ids_increment_per_entity() {
        let mut store = MemStore::new();
        let first = store.create_task(1, NewTask { title: "a".into(), ..Default::default() });
        let second = store.create_task(1, NewTask { title: "b".into(), ..Default::default() });
        let node = store.create_node(1, node("root"));

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(node.id, 1);
    }

    #[test]
    fn deleting_a_node_drops_its_edges() {
        let mut store = MemStore::new();
        let a = store.create_node(1, node("a"));
        let b = store.create_node(1, node("b"));
        let c = store.create_node(1, node("c"));
        store.create_edge(1, NewEdge { source_id: a.id, target_id: b.id });
        store.create_edge(1, NewEdge { source_id: c.id, target_id: a.id });
        let kept = store.create_edge(1, NewEdge { source_id: b.id, target_id: c.id });

        assert!(store.delete_node(a.id));
        assert_eq!(store.edges_for(1), vec![kept]);
        assert!(!store.delete_node(a.id));
    }

    #[test]
    fn listings_are_scoped_to_owner() {
        let mut store = MemStore::seeded();
        store.create_course(
            2,
            NewCourse {
                name: "Other".into(),
                code: "X 1".into(),
                color: "#000000".into(),
            },
        );
        assert_eq!(store.courses_for(CURRENT_USER_ID).len(), 3);
        assert_eq!(store.courses_for(2).len(), 1);
    }
}
