//! HTTP routes.
//!
//! - `POST /invoke`: run one conversation turn
//! - `GET /`: health check
//! - `GET /threads/{thread_id}/history`: every checkpoint of a thread

use crate::app::AppContext;
use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use docgraph_conversation::ConversationState;
use docgraph_workflow::Checkpoint;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Body of `POST /invoke`.
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    /// The user driving the conversation.
    pub user_id: String,
    /// The conversation thread to continue.
    pub thread_id: String,
    /// The new user message.
    pub message: String,
    /// Caller-reported invocation counter, recorded as metadata.
    #[serde(default)]
    pub invoke_count: u32,
}

/// Successful response of `POST /invoke`.
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// The full conversation state after the turn.
    pub result: ConversationState,
    /// Completion time, RFC 3339.
    pub timestamp: String,
}

/// Response of `GET /threads/{thread_id}/history`.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// The thread that was inspected.
    pub thread_id: String,
    /// Every checkpoint of the thread, oldest first.
    pub checkpoints: Vec<Checkpoint>,
}

/// Builds the application router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/invoke", post(invoke))
        .route("/threads/{thread_id}/history", get(history))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Runs one conversation turn.
pub async fn invoke(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::InvalidRequest {
        detail: rejection.body_text(),
    })?;

    let outcome = ctx
        .service
        .handle(
            &request.user_id,
            &request.thread_id,
            request.message,
            request.invoke_count,
        )
        .await?;

    Ok(Json(InvokeResponse {
        status: "success",
        result: outcome.state,
        timestamp: outcome.timestamp.to_rfc3339(),
    }))
}

/// Liveness probe; never touches the store.
pub async fn health() -> Json<Value> {
    Json(json!({ "message": "OK" }))
}

/// Lists a thread's checkpoints, oldest first.
pub async fn history(
    State(ctx): State<Arc<AppContext>>,
    Path(thread_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let checkpoints = ctx.service.history(&thread_id).await?;
    Ok(Json(HistoryResponse {
        thread_id,
        checkpoints,
    }))
}
