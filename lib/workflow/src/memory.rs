//! In-process checkpoint store.
//!
//! Keeps every thread's log in memory. Each thread has its own lock, so
//! saves to one thread are serialized while other threads proceed
//! independently. The outer map lock is held only long enough to find or
//! insert a thread's log.

use crate::checkpoint::{Checkpoint, CheckpointMetadata, CheckpointStore};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use docgraph_conversation::ConversationState;
use docgraph_core::ThreadId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

type ThreadLog = Arc<Mutex<Vec<Checkpoint>>>;

/// A [`CheckpointStore`] that keeps checkpoints in process memory.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    threads: RwLock<HashMap<ThreadId, ThreadLog>>,
    closed: AtomicBool,
}

impl MemoryCheckpointStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of threads with at least one checkpoint.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads.read().map(|threads| threads.len()).unwrap_or(0)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::unavailable("store is closed"));
        }
        Ok(())
    }

    fn existing_log(&self, thread_id: &ThreadId) -> Result<Option<ThreadLog>, StoreError> {
        let threads = self
            .threads
            .read()
            .map_err(|_| StoreError::unavailable("thread map lock poisoned"))?;
        Ok(threads.get(thread_id).cloned())
    }

    fn log_for(&self, thread_id: &ThreadId) -> Result<ThreadLog, StoreError> {
        if let Some(log) = self.existing_log(thread_id)? {
            return Ok(log);
        }
        let mut threads = self
            .threads
            .write()
            .map_err(|_| StoreError::unavailable("thread map lock poisoned"))?;
        Ok(threads.entry(thread_id.clone()).or_default().clone())
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn setup(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }

    async fn latest(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, StoreError> {
        self.ensure_open()?;
        let Some(log) = self.existing_log(thread_id)? else {
            return Ok(None);
        };
        let log = log
            .lock()
            .map_err(|_| StoreError::unavailable("thread log lock poisoned"))?;
        Ok(log.last().cloned())
    }

    async fn save(
        &self,
        thread_id: &ThreadId,
        state: ConversationState,
        metadata: CheckpointMetadata,
    ) -> Result<Checkpoint, StoreError> {
        self.ensure_open()?;
        let log = self.log_for(thread_id)?;
        let mut log = log
            .lock()
            .map_err(|_| StoreError::unavailable("thread log lock poisoned"))?;

        let sequence_number = log.last().map_or(1, |c| c.sequence_number + 1);
        let checkpoint = Checkpoint {
            thread_id: thread_id.clone(),
            sequence_number,
            state,
            metadata,
            created_at: Utc::now(),
        };
        log.push(checkpoint.clone());

        debug!(thread_id = %thread_id, sequence_number, "saved checkpoint");
        Ok(checkpoint)
    }

    async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, StoreError> {
        self.ensure_open()?;
        let Some(log) = self.existing_log(thread_id)? else {
            return Ok(Vec::new());
        };
        let log = log
            .lock()
            .map_err(|_| StoreError::unavailable("thread log lock poisoned"))?;
        Ok(log.clone())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
