//! HTTP listener implementation
//!
//! Provides the concrete axum server the registry creates, and the routes it serves.

pub mod handlers;
pub mod server;
