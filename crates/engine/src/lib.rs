//! Asynchronous job orchestration for visual generation.
//!
//! [`GenerationEngine`] expands batches of posts into generation jobs,
//! queues them, and drives them through a bounded pool of tokio workers
//! that call a [`Provider`](vizgen_provider::Provider). Callers never
//! block on generation: they submit, then poll job or campaign status.
//!
//! The engine is an explicit value owned by the host process, which is
//! responsible for calling [`GenerationEngine::start_workers`] at startup
//! and [`GenerationEngine::stop_workers`] at shutdown.

pub mod config;
pub mod engine;
pub mod error;
mod lifecycle;
pub mod queue;
pub mod registry;
mod status;
mod submission;
mod worker;

pub use config::EngineConfig;
pub use engine::GenerationEngine;
pub use error::EngineError;
pub use status::EngineStats;
pub use submission::SubmitBatch;
