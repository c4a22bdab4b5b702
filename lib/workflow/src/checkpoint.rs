//! Checkpoint types and the storage trait.
//!
//! A checkpoint is an immutable snapshot of a thread's conversation state.
//! Each thread owns an append-only log of checkpoints ordered by sequence
//! number; the latest one is the thread's resumable state.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docgraph_conversation::ConversationState;
use docgraph_core::{ThreadId, UserId};
use serde::{Deserialize, Serialize};

/// Pass-through metadata recorded with a checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// The user whose turn produced this checkpoint.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Invoke count reported by the caller.
    #[serde(default)]
    pub invoke_count: u32,
    /// Nodes that ran to produce the state, in order.
    #[serde(default)]
    pub ran_nodes: Vec<String>,
}

/// A durably stored snapshot of conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The thread this checkpoint belongs to.
    pub thread_id: ThreadId,
    /// Position in the thread's log, starting at 1.
    pub sequence_number: i64,
    /// The snapshot.
    pub state: ConversationState,
    /// Metadata about the step that produced the snapshot.
    pub metadata: CheckpointMetadata,
    /// When the checkpoint was written.
    pub created_at: DateTime<Utc>,
}

/// Durable, thread-partitioned checkpoint storage.
///
/// Implementations must:
/// - make `save` atomic, so a `load` never observes a partial state
/// - serialize concurrent `save` calls for the same thread
/// - never block operations on one thread behind another thread
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Provisions the storage schema. Safe to call on every start.
    async fn setup(&self) -> Result<(), StoreError>;

    /// Returns the latest checkpoint for a thread, if any.
    async fn latest(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, StoreError>;

    /// Appends a checkpoint with the next sequence number.
    async fn save(
        &self,
        thread_id: &ThreadId,
        state: ConversationState,
        metadata: CheckpointMetadata,
    ) -> Result<Checkpoint, StoreError>;

    /// Returns every checkpoint of a thread, oldest first.
    async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, StoreError>;

    /// Releases the backing connection. Later calls fail with
    /// [`StoreError::Unavailable`].
    async fn close(&self);

    /// Returns the thread's current state, or an empty state for a thread
    /// that has never been saved.
    async fn load(&self, thread_id: &ThreadId) -> Result<ConversationState, StoreError> {
        Ok(self
            .latest(thread_id)
            .await?
            .map(|checkpoint| checkpoint.state)
            .unwrap_or_default())
    }
}
