//! Task tracking and lifecycle management.
//!
//! The lifecycle engine owns the task status state machine: it creates
//! tasks, applies manual moves, and drives the automatic `upcoming →
//! ongoing → missed` transitions from per-task due timers and a periodic
//! sweep. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
