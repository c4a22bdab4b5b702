//! Per-invocation thread context.

use crate::error::ConversationError;
use docgraph_core::{ThreadId, UserId};
use serde::{Deserialize, Serialize};

/// Identifies the thread an invocation runs against.
///
/// `thread_id` partitions checkpoints. `user_id` and `invoke_count` are
/// carried alongside as metadata and never affect execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadContext {
    /// The conversation thread.
    pub thread_id: ThreadId,
    /// The user driving the conversation.
    pub user_id: UserId,
    /// Number of prior invocations the caller reports for this turn.
    pub invoke_count: u32,
}

impl ThreadContext {
    /// Creates a context with an invoke count of zero.
    #[must_use]
    pub fn new(thread_id: ThreadId, user_id: UserId) -> Self {
        Self {
            thread_id,
            user_id,
            invoke_count: 0,
        }
    }

    /// Builds a context from unvalidated request fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::InvalidField`] naming the first empty field.
    pub fn from_raw(thread_id: &str, user_id: &str) -> Result<Self, ConversationError> {
        let thread_id = ThreadId::new(thread_id).map_err(|e| ConversationError::InvalidField {
            field: "thread_id",
            reason: e.reason,
        })?;
        let user_id = UserId::new(user_id).map_err(|e| ConversationError::InvalidField {
            field: "user_id",
            reason: e.reason,
        })?;
        Ok(Self::new(thread_id, user_id))
    }

    /// Sets the invoke count.
    #[must_use]
    pub fn with_invoke_count(mut self, invoke_count: u32) -> Self {
        self.invoke_count = invoke_count;
        self
    }
}
