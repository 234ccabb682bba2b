//! Notifier that records announcements instead of showing them.

use crate::task::ports::{Notifier, Severity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An in-app announcement.
    Announcement {
        /// Announced text.
        message: String,
        /// Announcement severity.
        severity: Severity,
    },
    /// An operating-system notification.
    Os {
        /// Notification title.
        title: String,
        /// Notification body.
        body: String,
    },
}

/// Records notifications for later inspection.
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
    os_permitted: Arc<AtomicBool>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self {
            notices: Arc::default(),
            os_permitted: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl RecordingNotifier {
    /// Creates a recorder with OS notifications permitted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants or revokes OS notification permission.
    pub fn set_os_permission(&self, granted: bool) {
        self.os_permitted.store(granted, Ordering::SeqCst);
    }

    /// Returns every captured notice in order.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns captured announcements as `(message, severity)` pairs.
    #[must_use]
    pub fn announcements(&self) -> Vec<(String, Severity)> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Announcement { message, severity } => Some((message, severity)),
                Notice::Os { .. } => None,
            })
            .collect()
    }

    /// Returns captured OS notifications as `(title, body)` pairs.
    #[must_use]
    pub fn os_notifications(&self) -> Vec<(String, String)> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Os { title, body } => Some((title, body)),
                Notice::Announcement { .. } => None,
            })
            .collect()
    }

    /// Forgets captured notices.
    pub fn clear(&self) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

impl Notifier for RecordingNotifier {
    fn announce(&self, message: &str, severity: Severity) {
        self.record(Notice::Announcement {
            message: message.to_owned(),
            severity,
        });
    }

    fn notify_os(&self, title: &str, body: &str) {
        if !self.os_permitted.load(Ordering::SeqCst) {
            return;
        }
        self.record(Notice::Os {
            title: title.to_owned(),
            body: body.to_owned(),
        });
    }
}
