//! Input handling module
//! Loads job and candidate records from disk and persists engine state

pub mod file_detector;
pub mod manager;
pub mod store;

pub use manager::RecordLoader;
pub use store::{JsonFileStore, MemoryStore, SkillStore};
