//! JSON file persistence for the task collection.

mod store;

pub use store::JsonFileTaskStore;
