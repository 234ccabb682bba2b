//! Stateless CRUD access to the task collection.
//!
//! [`TaskApi`] maps list, create, update and delete requests onto a
//! [`crate::task::ports::TaskStore`], re-reading the stored collection on
//! every request. [`http`] exposes it over HTTP under `/api/tasks`. The API
//! does not touch per-task timers; an optional change hook lets an
//! in-process lifecycle engine reload after each write.

mod facade;
pub mod http;

pub use facade::{ApiError, ApiResult, ChangeHook, TaskApi};
pub use http::{ApiServer, ServerError, router};
