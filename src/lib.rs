use std::sync::Arc;

use axum::{middleware, routing::get, Router};

pub mod config;
pub mod console;
pub mod errors;
pub mod http;
pub mod listener;
pub mod logging;
pub mod registry;

use http::server::HandlerKeys;

pub use errors::{ListenerError, RegistryError};
pub use listener::{HandlerCategory, Listener, ListenerFactory};
pub use registry::{ListenerRegistry, ListenerSnapshot, SharedListener, DEFAULT_PORT};

#[derive(Clone)]
pub struct ListenerState {
    pub port: u16,
    pub handlers: Arc<HandlerKeys>,
}

impl ListenerState {
    pub fn new(port: u16, handlers: Arc<HandlerKeys>) -> Self {
        Self { port, handlers }
    }
}

pub fn build_app(state: ListenerState) -> Router {
    Router::new()
        .route(http::handlers::HEALTH_PATH, get(http::handlers::health))
        .route(http::handlers::HANDLERS_PATH, get(http::handlers::list_handlers))
        .fallback(http::handlers::unrouted)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            logging::request_logging_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let handlers = Arc::new(HandlerKeys::default());
        handlers.register(HandlerCategory::Http, http::handlers::HEALTH_PATH);
        handlers.register(HandlerCategory::JsonRpc, "get_status");
        build_app(ListenerState::new(9000, handlers))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&body).expect("valid json response")
    }

    #[tokio::test]
    async fn health_reports_listener_port() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        assert_eq!(body, "{\"status\":\"ok\",\"port\":9000}");
    }

    #[tokio::test]
    async fn handlers_lists_every_category() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/handlers")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["port"], 9000);

        let handlers = body["handlers"].as_array().expect("handlers array");
        assert_eq!(handlers.len(), HandlerCategory::ALL.len());
        assert_eq!(handlers[1]["category"], "http");
        assert_eq!(handlers[1]["keys"], serde_json::json!(["/health"]));
        assert_eq!(handlers[3]["category"], "json_rpc");
        assert_eq!(handlers[3]["keys"], serde_json::json!(["get_status"]));
        assert_eq!(handlers[5]["keys"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/assets/1234")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["code"], "handler_not_found");
        assert_eq!(body["message"], "no handler registered for /assets/1234");
    }

    #[tokio::test]
    async fn health_rejects_post() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("POST")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
