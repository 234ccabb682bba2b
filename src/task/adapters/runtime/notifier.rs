//! Notifier that reports through `tracing`.

use crate::task::ports::{Notifier, Severity};
use tracing::{error, info, warn};

/// Writes announcements to the log and, when desktop notifications are
/// enabled, OS notifications too.
#[derive(Debug, Clone, Copy)]
pub struct TracingNotifier {
    desktop: bool,
}

impl TracingNotifier {
    /// Creates a notifier; `desktop` grants OS notification permission.
    #[must_use]
    pub const fn new(desktop: bool) -> Self {
        Self { desktop }
    }
}

impl Notifier for TracingNotifier {
    fn announce(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(%severity, "{message}"),
            Severity::Warning => warn!(%severity, "{message}"),
            Severity::Error => error!(%severity, "{message}"),
        }
    }

    fn notify_os(&self, title: &str, body: &str) {
        if !self.desktop {
            warn!(title, "desktop notifications are disabled; skipping");
            return;
        }
        info!(target: "tasktide::desktop", title, body, "desktop notification");
    }
}
