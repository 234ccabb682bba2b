//! Side effects collected under the operation lock and delivered after it
//! is released.

use crate::task::{
    domain::LifecycleEvent,
    ports::{LifecycleListener, Notifier, Severity},
};
use std::sync::Arc;

enum Effect {
    Announce { message: String, severity: Severity },
    NotifyOs { title: String, body: String },
    Event(LifecycleEvent),
}

#[derive(Default)]
pub(super) struct Effects(Vec<Effect>);

impl Effects {
    pub(super) fn announce(&mut self, message: impl Into<String>, severity: Severity) {
        self.0.push(Effect::Announce {
            message: message.into(),
            severity,
        });
    }

    pub(super) fn notify_os(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.0.push(Effect::NotifyOs {
            title: title.into(),
            body: body.into(),
        });
    }

    pub(super) fn emit(&mut self, event: LifecycleEvent) {
        self.0.push(Effect::Event(event));
    }

    /// Delivers effects in the order they were recorded.
    pub(super) fn dispatch<N>(self, notifier: &N, listeners: &[Arc<dyn LifecycleListener>])
    where
        N: Notifier + ?Sized,
    {
        for effect in self.0 {
            match effect {
                Effect::Announce { message, severity } => notifier.announce(&message, severity),
                Effect::NotifyOs { title, body } => notifier.notify_os(&title, &body),
                Effect::Event(event) => {
                    for listener in listeners {
                        listener.on_event(&event);
                    }
                }
            }
        }
    }
}
