//! Domain model for task tracking and lifecycle rules.

mod board;
mod collection;
mod countdown;
mod draft;
mod error;
mod event;
mod ids;
mod priority;
mod status;
mod task;

pub use board::{TaskBoard, sort_for_display};
pub use collection::TaskCollection;
pub use countdown::{TimeLeft, Urgency};
pub use draft::{TaskDraft, TaskPatch};
pub use error::{ParsePriorityError, ParseTaskStatusError, TaskDomainError};
pub use event::{LifecycleEvent, TransitionCause};
pub use ids::{TaskId, TaskTitle};
pub use priority::Priority;
pub use status::{StatusChange, TaskStatus};
pub use task::{PersistedTaskData, Task};
