//! Notifier port for user-facing announcements.

use std::fmt;

/// Severity of an in-app announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Neutral information.
    Info,
    /// A user action succeeded.
    Success,
    /// Something needs the user's attention.
    Warning,
    /// An operation failed.
    Error,
}

impl Severity {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User notification contract.
pub trait Notifier: Send + Sync {
    /// Shows an in-app message.
    fn announce(&self, message: &str, severity: Severity);

    /// Raises an operating-system notification.
    ///
    /// Best effort: implementations skip it silently when the host has not
    /// granted permission.
    fn notify_os(&self, title: &str, body: &str);
}
