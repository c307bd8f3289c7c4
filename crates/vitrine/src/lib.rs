//! Vitrine HTTP service.
//!
//! The binary in `main.rs` wires configuration, logging and the CLI around
//! the router built here, so the router can be driven in-process by tests.

pub mod server;

pub use server::{build_router, start_server, AppState};
