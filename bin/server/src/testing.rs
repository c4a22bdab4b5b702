//! Test doubles shared by the server's unit tests.

use async_trait::async_trait;
use docgraph_conversation::ConversationState;
use docgraph_core::ThreadId;
use docgraph_workflow::{
    Checkpoint, CheckpointMetadata, CheckpointStore, MemoryCheckpointStore, StoreError,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory store that records every read and write it serves.
#[derive(Debug, Default)]
pub(crate) struct CountingStore {
    inner: MemoryCheckpointStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of `latest` and `history` calls, including those made by `load`.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.reads() + self.writes()
    }
}

#[async_trait]
impl CheckpointStore for CountingStore {
    async fn setup(&self) -> Result<(), StoreError> {
        self.inner.setup().await
    }

    async fn latest(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.latest(thread_id).await
    }

    async fn save(
        &self,
        thread_id: &ThreadId,
        state: ConversationState,
        metadata: CheckpointMetadata,
    ) -> Result<Checkpoint, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save(thread_id, state, metadata).await
    }

    async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.history(thread_id).await
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}
