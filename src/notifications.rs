//! Bounded notification inbox.
//!
//! Holds the most recent [`INBOX_CAPACITY`] notices, oldest first. Pomodoro
//! completions arrive through [`InboxNotifier`]; other kinds are posted
//! through the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{ApiError, ApiResult, FieldError};
use crate::models::Id;
use crate::pomodoro::{Notification, Notifier};

pub const INBOX_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Task,
    Pomodoro,
    Goal,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    pub id: Id,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub action_link: Option<String>,
}

/// Body of `POST /api/notifications`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub action_link: Option<String>,
}

impl NewNotification {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Required"));
        }
        ApiError::check(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxView {
    pub unread_count: usize,
    pub items: Vec<InboxEntry>,
}

#[derive(Debug, Default)]
pub struct Inbox {
    entries: VecDeque<InboxEntry>,
    last_id: Id,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notice, dropping the oldest once the inbox is full.
    pub fn push(&mut self, new: NewNotification) -> InboxEntry {
        self.last_id += 1;
        let entry = InboxEntry {
            id: self.last_id,
            title: new.title,
            message: new.message,
            timestamp: Utc::now(),
            read: false,
            kind: new.kind,
            action_link: new.action_link,
        };
        self.entries.push_back(entry.clone());
        while self.entries.len() > INBOX_CAPACITY {
            self.entries.pop_front();
        }
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.read).count()
    }

    pub fn view(&self) -> InboxView {
        InboxView {
            unread_count: self.unread_count(),
            items: self.entries.iter().cloned().collect(),
        }
    }

    pub fn mark_read(&mut self, id: Id) -> Option<InboxEntry> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        entry.read = true;
        Some(entry.clone())
    }

    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.read = true;
        }
    }

    pub fn remove(&mut self, id: Id) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Files timer notices into a shared inbox and echoes them to the log.
pub struct InboxNotifier {
    inbox: Arc<Mutex<Inbox>>,
}

impl InboxNotifier {
    pub fn new(inbox: Arc<Mutex<Inbox>>) -> Self {
        InboxNotifier { inbox }
    }
}

impl Notifier for InboxNotifier {
    fn notify(&self, notification: &Notification) {
        log::info!("{} {}", notification.title, notification.body);
        let Ok(mut inbox) = self.inbox.lock() else {
            log::error!("dropping notification: inbox lock poisoned");
            return;
        };
        inbox.push(NewNotification {
            title: notification.title.clone(),
            message: notification.body.clone(),
            kind: NotificationKind::Pomodoro,
            action_link: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(title: &str) -> NewNotification {
        NewNotification {
            title: title.to_string(),
            message: String::new(),
            kind: NotificationKind::System,
            action_link: None,
        }
    }

    #[test]
    fn keeps_only_the_latest_fifty() {
        let mut inbox = Inbox::new();
        for n in 1..=60 {
            inbox.push(notice(&format!("notice {}", n)));
        }
        let view = inbox.view();
        assert_eq!(view.items.len(), INBOX_CAPACITY);
        assert_eq!(view.items[0].title, "notice 11");
        assert_eq!(view.items[49].id, 60);
    }

    #[test]
    fn mark_read_and_remove() {
        let mut inbox = Inbox::new();
        let first = inbox.push(notice("a"));
        inbox.push(notice("b"));
        assert_eq!(inbox.unread_count(), 2);

        assert!(inbox.mark_read(first.id).unwrap().read);
        assert_eq!(inbox.unread_count(), 1);
        assert!(inbox.mark_read(99).is_none());

        inbox.mark_all_read();
        assert_eq!(inbox.unread_count(), 0);

        assert!(inbox.remove(first.id));
        assert!(!inbox.remove(first.id));
        assert_eq!(inbox.len(), 1);

        inbox.clear();
        assert!(inbox.is_empty());
    }

    #[test]
    fn timer_notices_are_filed_as_pomodoro() {
        let inbox = Arc::new(Mutex::new(Inbox::new()));
        let notifier = InboxNotifier::new(Arc::clone(&inbox));
        notifier.notify(&Notification {
            title: "Pomodoro completed!".to_string(),
            body: "Well done! Take a 5-minute break.".to_string(),
        });

        let inbox = inbox.lock().unwrap();
        let view = inbox.view();
        assert_eq!(view.items[0].kind, NotificationKind::Pomodoro);
        assert_eq!(view.items[0].message, "Well done! Take a 5-minute break.");
        assert!(!view.items[0].read);
    }
}
