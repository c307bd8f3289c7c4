//! CLI command implementations.

pub mod catalog;
pub mod config;
pub mod models;
pub mod serve;
