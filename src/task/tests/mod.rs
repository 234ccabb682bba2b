//! Unit tests for the task domain, adapters and lifecycle engine.
