//! Tasktide: a personal task tracker with a timer-driven lifecycle.
//!
//! Tasks carry a title, description, priority and due date, and move
//! through the `upcoming`, `ongoing`, `completed` and `missed` buckets
//! either automatically as time passes or when the user moves them.
//!
//! # Architecture
//!
//! Tasktide follows hexagonal architecture principles:
//!
//! - **Domain**: task model and transition rules, free of infrastructure
//! - **Ports**: traits for storage, timers, notification and observation
//! - **Adapters**: JSON file and in-memory stores, tokio and manual
//!   schedulers, notifiers
//!
//! # Modules
//!
//! - [`task`]: domain, ports, adapters and the lifecycle engine
//! - [`api`]: stateless CRUD facade and its HTTP surface
//! - [`config`]: TOML configuration with environment overrides
//! - [`telemetry`]: logging bootstrap

pub mod api;
pub mod config;
pub mod task;
pub mod telemetry;
