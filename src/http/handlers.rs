use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{Classification, IssueReport};

use super::{error::ApiError, AppState};

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    gemini: &'static str,
}

pub(crate) async fn landing_handler() -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "message": "Campus Issue Reporter API",
        "endpoints": {
            "/api/classify": "POST - Classify issue with AI",
            "/api/health": "GET - Health check",
        },
    }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let gemini = if state.config.gemini.is_configured() {
        "configured"
    } else {
        "not configured"
    };
    Json(HealthResponse {
        status: "healthy",
        gemini,
    })
}

pub(crate) async fn classify_preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub(crate) async fn classify_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Classification>, ApiError> {
    let report = parse_report(&body)?;
    tracing::info!(
        target: "http",
        strategy = state.classifier.name(),
        description = %report.preview(PREVIEW_CHARS),
        location = ?report.location,
        "classifying issue"
    );

    let classification = state
        .classifier
        .classify(&report.description)
        .await
        .map_err(ApiError::internal)?;

    tracing::info!(
        target: "http",
        category = %classification.category,
        severity = %classification.severity,
        confidence = classification.confidence,
        "classification result"
    );
    Ok(Json(classification))
}

fn parse_report(body: &[u8]) -> Result<IssueReport, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| ApiError::NoData)?;
    let Value::Object(mut fields) = payload else {
        return Err(ApiError::NoData);
    };

    let description = match fields.remove("description") {
        None | Some(Value::Null) => return Err(ApiError::MissingDescription),
        Some(Value::String(text)) if text.is_empty() => return Err(ApiError::MissingDescription),
        Some(Value::Bool(false)) => return Err(ApiError::MissingDescription),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
            return Err(ApiError::MissingDescription)
        }
        Some(Value::Array(items)) if items.is_empty() => return Err(ApiError::MissingDescription),
        Some(Value::Object(fields)) if fields.is_empty() => {
            return Err(ApiError::MissingDescription)
        }
        Some(Value::String(text)) => text,
        Some(_) => return Err(ApiError::internal("description must be a string")),
    };
    let location = fields.remove("location").filter(|value| !value.is_null());

    Ok(IssueReport {
        description,
        location,
    })
}
