use std::net::IpAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP listener for port {port} must already be registered to be set as the default")]
    NotRegistered { port: u16 },
    #[error("HTTP listener for port {port} already exists")]
    PortConflict { port: u16 },
    #[error("no default HTTP listener has been set")]
    NoDefault,
    #[error(transparent)]
    ListenerStart(#[from] ListenerError),
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind HTTP listener to {address}:{port}")]
    Bind {
        address: IpAddr,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP listener on port {port} is already started")]
    AlreadyStarted { port: u16 },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
                details: json!({}),
            }),
        )
            .into_response()
    }
}
