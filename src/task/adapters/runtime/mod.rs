//! Production adapters backed by the tokio runtime and `tracing`.

mod notifier;
mod scheduler;

pub use notifier::TracingNotifier;
pub use scheduler::TokioScheduler;
