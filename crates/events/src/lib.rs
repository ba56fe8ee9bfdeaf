//! In-process event bus for job lifecycle notifications.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`JobEvent`]: the event envelope published by the engine.

pub mod bus;

pub use bus::{EventBus, JobEvent};
