mod error;
mod handlers;

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures::FutureExt;

use crate::{classifier::IssueClassifier, config::AppConfig};

use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub classifier: Arc<dyn IssueClassifier>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, classifier: Arc<dyn IssueClassifier>) -> Self {
        Self { config, classifier }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::landing_handler))
        .route("/api/health", get(handlers::health_handler))
        .route(
            "/api/classify",
            post(handlers::classify_handler).options(handlers::classify_preflight_handler),
        )
        .layer(from_fn(fault_boundary_middleware))
        .layer(from_fn(cors_middleware))
        .with_state(state)
}

/// Any origin may call the API; preflights echo the requested headers back.
async fn cors_middleware(req: Request, next: Next) -> Response {
    let preflight = req.method() == Method::OPTIONS;
    let requested_headers = req
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned();
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if preflight {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,POST,OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            requested_headers.unwrap_or_else(|| HeaderValue::from_static("content-type")),
        );
    }
    resp
}

/// Turns a panicking handler into a JSON 500 so the server keeps serving.
async fn fault_boundary_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(resp) => resp,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(
                target: "http",
                method = %method,
                path = %path,
                error = %message,
                "handler panicked"
            );
            ApiError::Internal(message).into_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal server error".to_string()
    }
}
