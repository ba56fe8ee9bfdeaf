//! Generation provider contract and implementations.
//!
//! The engine talks to image/video synthesis backends only through the
//! [`Provider`] trait. Two implementations ship here:
//!
//! - [`comfyui::ComfyUIProvider`] queues a workflow on a ComfyUI server
//!   over its REST API and polls the execution history for the output.
//! - [`placeholder::PlaceholderProvider`] returns deterministic URLs
//!   after a fixed delay, for local development without a GPU.

pub mod api;
pub mod comfyui;
pub mod placeholder;
pub mod provider;

pub use provider::{GenerationError, GenerationOutcome, GenerationRequest, Provider};
