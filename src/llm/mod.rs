//! Reasoning, embedding and vector-index integration

pub mod analyzer;
pub mod offline;
pub mod prompts;
pub mod retry;
pub mod schema;
pub mod service;

pub use analyzer::ReasoningClient;
pub use offline::OfflineReasoner;
pub use retry::RetryPolicy;
pub use service::{EmbeddingService, MemoryVectorIndex, ReasoningService, VectorIndex};
