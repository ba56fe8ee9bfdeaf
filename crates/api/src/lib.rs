//! Vizgen API server library.
//!
//! Exposes config, state, error handling, provider wiring and routes so
//! integration tests and the binary entrypoint can both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod provider;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
