//! Toast notifications raised by the sync layer.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use certus_sync::{Notice, NoticeLevel, Notifier};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
    pub key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Notice> for Notification {
    fn from(notice: Notice) -> Self {
        Self {
            level: notice.level,
            message: notice.message,
            key: notice.key,
            created_at: Utc::now(),
        }
    }
}

/// Bounded queue of toasts. The oldest toast is dropped when full.
#[derive(Debug)]
pub struct Toasts {
    max_retained: usize,
    queue: Mutex<VecDeque<Notification>>,
}

impl Toasts {
    pub fn new(max_retained: usize) -> Self {
        Self {
            max_retained: max_retained.max(1),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, notification: Notification) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() == self.max_retained {
            queue.pop_front();
        }
        queue.push_back(notification);
    }

    /// Toasts currently shown, oldest first.
    pub fn visible(&self) -> Vec<Notification> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<Notification> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Remove every toast about `key`.
    pub fn dismiss_key(&self, key: &str) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|toast| toast.key.as_deref() != Some(key));
    }

    pub fn clear(&self) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for Toasts {
    fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "toast");
        self.push(notice.into());
    }
}
