//! Axum HTTP handlers served by every listener
//!
//! Listeners only answer their own health and diagnostics routes; everything else
//! is reported as unrouted.

use axum::{extract::State, http::Uri, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::http::server::HandlerListing;
use crate::ListenerState;

pub const HEALTH_PATH: &str = "/health";
pub const HANDLERS_PATH: &str = "/handlers";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct HandlersResponse {
    pub port: u16,
    pub handlers: Vec<HandlerListing>,
}

pub async fn health(State(state): State<ListenerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        port: state.port,
    })
}

pub async fn list_handlers(State(state): State<ListenerState>) -> Json<HandlersResponse> {
    Json(HandlersResponse {
        port: state.port,
        handlers: state.handlers.listing(),
    })
}

pub async fn unrouted(uri: Uri) -> AppError {
    AppError::not_found(
        "handler_not_found",
        format!("no handler registered for {}", uri.path()),
    )
}
