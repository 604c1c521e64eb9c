//! Transient user notifications ("toasts").
//!
//! Outcomes of user actions are broadcast to any live subscriber and a short
//! history is kept for views that poll. Every notice is also logged.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// How many notices [`Notifier::recent`] keeps.
const RECENT_CAPACITY: usize = 20;

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// One notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
    pub at: DateTime<Utc>,
}

/// Publishes notices.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
    recent: Arc<Mutex<VecDeque<Notice>>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY))),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// The most recent notices, oldest first.
    pub fn recent(&self) -> Vec<Notice> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn info(&self, title: impl Into<String>, description: Option<&str>) {
        self.publish(NoticeLevel::Info, title.into(), description);
    }

    pub fn success(&self, title: impl Into<String>) {
        self.publish(NoticeLevel::Success, title.into(), None);
    }

    pub fn error(&self, title: impl Into<String>, description: Option<&str>) {
        self.publish(NoticeLevel::Error, title.into(), description);
    }

    fn publish(&self, level: NoticeLevel, title: String, description: Option<&str>) {
        match level {
            NoticeLevel::Error => warn!(title = %title, "Notice"),
            _ => info!(title = %title, "Notice"),
        }

        let notice = Notice {
            level,
            title,
            description: description.map(str::to_string),
            at: Utc::now(),
        };

        {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
            if recent.len() == RECENT_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(notice.clone());
        }

        // No subscribers is fine; the notice is still in `recent`.
        let _ = self.tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_is_capped() {
        let notifier = Notifier::new();

        for i in 0..(RECENT_CAPACITY + 5) {
            notifier.info(format!("notice {i}"), None);
        }

        let recent = notifier.recent();
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent[0].title, "notice 5");
    }

    #[tokio::test]
    async fn test_subscribers_receive_notices() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.error("Failed to delete student", Some("Please try again later"));

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.description.as_deref(), Some("Please try again later"));
    }
}
