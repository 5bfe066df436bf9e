use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;

use crate::models::Timestamp;

pub const NOTICE_TTL_MS: i64 = 3_000;

pub const MSG_TASK_ADDED: &str = "Task added successfully!";
pub const MSG_TASK_UPDATED: &str = "Task updated successfully!";
pub const MSG_TASK_DELETED: &str = "Task deleted";
pub const MSG_DELETE_FAILED: &str = "Failed to delete task. Please try again.";

pub trait Notifier: Send + Sync {
    fn show_success(&self, message: &str);
    fn show_error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: Timestamp,
}

impl Notice {
    pub fn expires_at(&self) -> Timestamp {
        self.shown_at + NOTICE_TTL_MS
    }
}

#[derive(Clone, Default)]
pub struct NoticeBoard {
    inner: Arc<Mutex<Option<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, kind: NoticeKind, message: &str, now: Timestamp) {
        *self.lock() = Some(Notice {
            kind,
            message: message.to_string(),
            shown_at: now,
        });
    }

    pub fn active(&self) -> Option<Notice> {
        self.active_at(Utc::now().timestamp_millis())
    }

    pub fn active_at(&self, now: Timestamp) -> Option<Notice> {
        self.lock()
            .as_ref()
            .filter(|notice| now < notice.expires_at())
            .cloned()
    }

    pub fn last(&self) -> Option<Notice> {
        self.lock().clone()
    }

    pub fn dismiss(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<Notice>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for NoticeBoard {
    fn show_success(&self, message: &str) {
        log::info!("notice success message={message}");
        self.post(NoticeKind::Success, message, Utc::now().timestamp_millis());
    }

    fn show_error(&self, message: &str) {
        log::warn!("notice error message={message}");
        self.post(NoticeKind::Error, message, Utc::now().timestamp_millis());
    }
}
