//! Skill aligner library

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod llm;
pub mod market;
pub mod output;
pub mod processing;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use engine::{EnginePorts, SkillEngine};
pub use error::{Result, SkillAlignerError};
