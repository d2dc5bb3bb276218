use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use relay::errors::ExchangeError;
use serde::{Deserialize, Serialize};

const METHOD_NOT_ALLOWED: &str = "Only POST requests allowed";
const MISSING_MESSAGE: &str = "userMessage is required";
const ASSISTANT_FAILED: &str = "Failed to communicate with Assistant";
const COMPLETION_FAILED: &str = "Failed to contact OpenAI";

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(rename = "userMessage")]
    user_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// A body that isn't json, or has no usable message, is treated as missing input
fn user_message(payload: Result<Json<ChatRequest>, JsonRejection>) -> Option<String> {
    match payload {
        Ok(Json(request)) => request.user_message.filter(|m| !m.trim().is_empty()),
        Err(rejection) => {
            tracing::debug!("Rejected chat request body: {}", rejection);
            None
        }
    }
}

// Raw remote errors are logged only, callers get a fixed message
fn exchange_response(result: Result<String, ExchangeError>, failure: &str) -> Response {
    match result {
        Ok(reply) => (StatusCode::OK, Json(ChatResponse { reply })).into_response(),
        Err(ExchangeError::InvalidInput) => error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGE),
        Err(err) => {
            tracing::error!("Exchange failed: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, failure)
        }
    }
}

async fn assistant_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Some(message) = user_message(payload) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGE);
    };

    let cancel = state.shutdown.child_token();
    let result = state.coordinator.complete_exchange(&message, &cancel).await;
    exchange_response(result, ASSISTANT_FAILED)
}

// simple single-shot completion, no thread or run on the service
async fn completion_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Some(message) = user_message(payload) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGE);
    };

    let cancel = state.shutdown.child_token();
    let result = state.completion.complete_exchange(&message, &cancel).await;
    exchange_response(result, COMPLETION_FAILED)
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/chat",
            post(assistant_handler).fallback(method_not_allowed),
        )
        .route(
            "/api/chat/completion",
            post(completion_handler).fallback(method_not_allowed),
        )
        .with_state(state)
}
