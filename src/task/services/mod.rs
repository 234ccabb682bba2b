//! Application services for task lifecycle orchestration.

mod effects;
mod lifecycle;
mod messages;
mod policy;
mod timers;

pub use lifecycle::{
    AppliedTransition, CreateTaskRequest, LifecycleEngine, LifecycleError, LifecycleResult,
    ReloadReport, SweepReport,
};
pub use policy::LifecyclePolicy;
