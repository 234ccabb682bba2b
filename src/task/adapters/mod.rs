//! Adapter implementations of the task ports.
//!
//! - [`memory`]: deterministic in-process doubles driven by a manual clock
//! - [`file`]: JSON file persistence
//! - [`runtime`]: tokio timers and tracing-backed notifications

pub mod file;
pub mod memory;
pub mod runtime;
