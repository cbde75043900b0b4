use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::NlqError;
use crate::models::AskReport;
use crate::service::NlqService;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for NlqError {
    fn into_response(self) -> Response {
        let status = match &self {
            NlqError::Validation(_) => StatusCode::BAD_REQUEST,
            NlqError::Model(_) | NlqError::Http(_) => StatusCode::BAD_GATEWAY,
            NlqError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn ask(
    State(service): State<Arc<NlqService>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskReport>, NlqError> {
    Ok(Json(service.ask(&req.question).await?))
}

async fn collections(
    State(service): State<Arc<NlqService>>,
) -> Result<Json<Vec<String>>, NlqError> {
    Ok(Json(service.collections().await?))
}

/// Build the HTTP router; `bearer_token` guards everything but `/health`
pub fn router(service: Arc<NlqService>, bearer_token: Option<String>) -> Router {
    let mut router = Router::new()
        .route("/ask", post(ask))
        .route("/collections", get(collections))
        .with_state(service);

    if let Some(expected) = bearer_token {
        router = router.layer(middleware::from_fn_with_state(
            Arc::new(expected),
            require_bearer,
        ));
    }

    router.route("/health", get(|| async { "ok" }))
}

async fn require_bearer(
    State(expected): State<Arc<String>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let headers: &HeaderMap = req.headers();
    let authorized = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected.as_str());
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    next.run(req).await
}
