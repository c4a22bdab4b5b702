//! Domain error types for server operations.
//!
//! - `StartupError`: fatal failures while bringing the service up
//! - `InvocationError`: what the invocation service reports per request
//! - `ApiError`: the HTTP rendering of a failed request

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docgraph_conversation::ConversationError;
use docgraph_workflow::WorkflowError;
use serde_json::json;
use std::fmt;

/// Errors that stop the service from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The checkpoint store is missing, unreachable or cannot be provisioned.
    StorageUnavailable { details: String },
    /// The workflow graph failed validation.
    InvalidGraph { details: String },
    /// The listener could not bind its address.
    Bind { addr: String, details: String },
    /// The HTTP server stopped with an error.
    Server { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::StorageUnavailable { details } => {
                write!(f, "checkpoint storage unavailable: {details}")
            }
            Self::InvalidGraph { details } => write!(f, "invalid workflow graph: {details}"),
            Self::Bind { addr, details } => write!(f, "failed to bind {addr}: {details}"),
            Self::Server { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Errors from handling one invocation.
#[derive(Debug)]
pub enum InvocationError {
    /// The request carried an invalid identifier.
    InvalidRequest(ConversationError),
    /// The workflow engine or its store failed.
    Workflow(WorkflowError),
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(e) => write!(f, "invalid request: {e}"),
            Self::Workflow(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRequest(e) => Some(e),
            Self::Workflow(e) => Some(e),
        }
    }
}

impl From<ConversationError> for InvocationError {
    fn from(e: ConversationError) -> Self {
        Self::InvalidRequest(e)
    }
}

impl From<WorkflowError> for InvocationError {
    fn from(e: WorkflowError) -> Self {
        Self::Workflow(e)
    }
}

/// An error rendered as an HTTP response with a `{"detail": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    /// The request body or its fields are invalid (422).
    InvalidRequest { detail: String },
    /// Processing failed on the server side (500).
    Internal { detail: String },
}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the human-readable detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidRequest { detail } | Self::Internal { detail } => detail,
        }
    }
}

impl From<InvocationError> for ApiError {
    fn from(e: InvocationError) -> Self {
        match e {
            InvocationError::InvalidRequest(e) => Self::InvalidRequest {
                detail: e.to_string(),
            },
            InvocationError::Workflow(e) => Self::Internal {
                detail: format!("Internal server error: {e}"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::InvalidRequest { detail } => tracing::debug!(%detail, "rejected request"),
            Self::Internal { detail } => tracing::error!(%detail, "request failed"),
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
