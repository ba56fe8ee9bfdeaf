//! Domain types and pure logic for the visual-generation job engine.
//!
//! Everything in this crate is synchronous and free of I/O: content-type
//! policy, post validation, the job state machine, progress milestones,
//! and the campaign rollup. The engine and API crates build on top of it.

pub mod batch;
pub mod content;
pub mod error;
pub mod job;
pub mod job_events;
pub mod milestones;
pub mod post;
pub mod prompt;
pub mod types;
