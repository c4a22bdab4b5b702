//! Invocation service.
//!
//! Turns one validated request into one workflow turn. Identifiers are
//! checked before the engine is touched, so a bad request never reads or
//! writes a checkpoint.

use crate::error::InvocationError;
use chrono::{DateTime, Utc};
use docgraph_conversation::{ConversationError, ConversationState, Message, ThreadContext};
use docgraph_core::{InvocationId, ThreadId};
use docgraph_workflow::{Checkpoint, CompiledWorkflow, WorkflowError};
use tracing::{info, instrument};

/// The result of one successful invocation.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    /// Conversation state after the turn.
    pub state: ConversationState,
    /// When the turn completed.
    pub timestamp: DateTime<Utc>,
}

/// Runs conversation turns against a compiled workflow.
#[derive(Debug, Clone)]
pub struct InvocationService {
    workflow: CompiledWorkflow,
}

impl InvocationService {
    /// Creates a service over `workflow`.
    #[must_use]
    pub fn new(workflow: CompiledWorkflow) -> Self {
        Self { workflow }
    }

    /// Appends `message` as a user turn on `thread_id` and runs the workflow.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::InvalidRequest`] if either identifier is empty
    /// - [`InvocationError::Workflow`] if the engine or store fails
    #[instrument(
        skip(self, message),
        fields(invocation_id = %InvocationId::new())
    )]
    pub async fn handle(
        &self,
        user_id: &str,
        thread_id: &str,
        message: String,
        invoke_count: u32,
    ) -> Result<InvocationOutcome, InvocationError> {
        info!("Invoke endpoint called");
        let context = ThreadContext::from_raw(thread_id, user_id)?.with_invoke_count(invoke_count);

        let state = self
            .workflow
            .invoke(ConversationState::from(Message::user(message)), &context)
            .await?;

        info!(messages = state.len(), "Workflow invocation completed");
        Ok(InvocationOutcome {
            state,
            timestamp: Utc::now(),
        })
    }

    /// Returns every checkpoint recorded for `thread_id`, oldest first.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::InvalidRequest`] if the identifier is empty
    /// - [`InvocationError::Workflow`] if the store fails
    pub async fn history(&self, thread_id: &str) -> Result<Vec<Checkpoint>, InvocationError> {
        let thread_id = ThreadId::new(thread_id).map_err(|e| {
            InvocationError::InvalidRequest(ConversationError::InvalidField {
                field: "thread_id",
                reason: e.reason,
            })
        })?;
        self.workflow
            .store()
            .history(&thread_id)
            .await
            .map_err(|e| InvocationError::Workflow(WorkflowError::from(e)))
    }
}
