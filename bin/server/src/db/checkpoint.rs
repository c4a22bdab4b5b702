//! PostgreSQL-backed checkpoint store.
//!
//! Checkpoints live in a single `checkpoints` table keyed by
//! `(thread_id, sequence_number)`. Saves take a transaction-scoped advisory
//! lock on the thread id, so concurrent writers to one thread queue up
//! while writers to other threads never wait on each other.

use crate::config::PoolConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docgraph_conversation::ConversationState;
use docgraph_core::ThreadId;
use docgraph_workflow::{Checkpoint, CheckpointMetadata, CheckpointStore, StoreError};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tracing::{debug, info, instrument};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Row type for checkpoint queries.
#[derive(Debug, FromRow)]
struct CheckpointRow {
    thread_id: String,
    sequence_number: i64,
    state: serde_json::Value,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl CheckpointRow {
    fn try_into_checkpoint(self) -> Result<Checkpoint, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            thread_id: self.thread_id.clone(),
            sequence_number: self.sequence_number,
            reason,
        };

        let thread_id = ThreadId::new(self.thread_id.clone())
            .map_err(|e| corrupt(format!("invalid thread id: {e}")))?;
        let state: ConversationState = serde_json::from_value(self.state.clone())
            .map_err(|e| corrupt(format!("invalid state: {e}")))?;
        let metadata: CheckpointMetadata = serde_json::from_value(self.metadata.clone())
            .map_err(|e| corrupt(format!("invalid metadata: {e}")))?;

        Ok(Checkpoint {
            thread_id,
            sequence_number: self.sequence_number,
            state,
            metadata,
            created_at: self.created_at,
        })
    }
}

/// A [`CheckpointStore`] backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresCheckpointStore {
    pool: PgPool,
}

impl PostgresCheckpointStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_uri`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URI is malformed or the
    /// database cannot be reached.
    pub async fn connect(database_uri: &str, config: &PoolConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(database_uri)
            .await
            .map_err(StoreError::unavailable)?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CheckpointStore for PostgresCheckpointStore {
    async fn setup(&self) -> Result<(), StoreError> {
        info!("Running checkpoint migrations...");
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::unavailable(format!("migration failed: {e}")))
    }

    #[instrument(skip(self), fields(thread_id = %thread_id))]
    async fn latest(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, StoreError> {
        let row: Option<CheckpointRow> = sqlx::query_as(
            r#"
            SELECT thread_id, sequence_number, state, metadata, created_at
            FROM checkpoints
            WHERE thread_id = $1
            ORDER BY sequence_number DESC
            LIMIT 1
            "#,
        )
        .bind(thread_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        row.map(CheckpointRow::try_into_checkpoint).transpose()
    }

    #[instrument(skip(self, state, metadata), fields(thread_id = %thread_id))]
    async fn save(
        &self,
        thread_id: &ThreadId,
        state: ConversationState,
        metadata: CheckpointMetadata,
    ) -> Result<Checkpoint, StoreError> {
        let state = serde_json::to_value(&state)
            .map_err(|e| StoreError::unavailable(format!("failed to encode state: {e}")))?;
        let metadata = serde_json::to_value(&metadata)
            .map_err(|e| StoreError::unavailable(format!("failed to encode metadata: {e}")))?;

        let mut tx = self.pool.begin().await.map_err(StoreError::unavailable)?;

        // Released on commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(thread_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::unavailable)?;

        let row: CheckpointRow = sqlx::query_as(
            r#"
            INSERT INTO checkpoints (thread_id, sequence_number, state, metadata)
            SELECT $1, COALESCE(MAX(sequence_number), 0) + 1, $2, $3
            FROM checkpoints
            WHERE thread_id = $1
            RETURNING thread_id, sequence_number, state, metadata, created_at
            "#,
        )
        .bind(thread_id.as_str())
        .bind(state)
        .bind(metadata)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::unavailable)?;

        // Dropping the transaction on a decode error rolls the insert back.
        let checkpoint = row.try_into_checkpoint()?;
        tx.commit().await.map_err(StoreError::unavailable)?;

        debug!(
            thread_id = %thread_id,
            sequence_number = checkpoint.sequence_number,
            "saved checkpoint"
        );
        Ok(checkpoint)
    }

    #[instrument(skip(self), fields(thread_id = %thread_id))]
    async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Checkpoint>, StoreError> {
        let rows: Vec<CheckpointRow> = sqlx::query_as(
            r#"
            SELECT thread_id, sequence_number, state, metadata, created_at
            FROM checkpoints
            WHERE thread_id = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(thread_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::unavailable)?;

        rows.into_iter()
            .map(CheckpointRow::try_into_checkpoint)
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed checkpoint database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_conversation::Message;
    use serde_json::json;

    fn row(thread_id: &str, state: serde_json::Value) -> CheckpointRow {
        CheckpointRow {
            thread_id: thread_id.to_string(),
            sequence_number: 3,
            state,
            metadata: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_decodes_into_checkpoint() {
        let checkpoint = row(
            "t1",
            json!({
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "Echo: hi"}
                ]
            }),
        )
        .try_into_checkpoint()
        .expect("valid row");

        assert_eq!(checkpoint.thread_id.as_str(), "t1");
        assert_eq!(checkpoint.sequence_number, 3);
        assert_eq!(
            checkpoint.state,
            ConversationState::from_messages(vec![
                Message::user("hi"),
                Message::assistant("Echo: hi"),
            ])
        );
        assert_eq!(checkpoint.metadata, CheckpointMetadata::default());
    }

    #[test]
    fn row_with_unknown_role_is_corrupt() {
        let err = row(
            "t1",
            json!({"messages": [{"role": "system", "content": "x"}]}),
        )
        .try_into_checkpoint()
        .unwrap_err();

        match err {
            StoreError::Corrupt {
                thread_id,
                sequence_number,
                ..
            } => {
                assert_eq!(thread_id, "t1");
                assert_eq!(sequence_number, 3);
            }
            other => panic!("expected corrupt checkpoint, got {other:?}"),
        }
    }

    #[test]
    fn row_with_empty_thread_id_is_corrupt() {
        let err = row("", json!({"messages": []}))
            .try_into_checkpoint()
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn malformed_uri_is_unavailable() {
        let err = PostgresCheckpointStore::connect("not a uri", &PoolConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    /// Runs against a live database when `TEST_DATABASE_URI` is set.
    #[tokio::test]
    async fn live_database_appends_in_order() {
        let Ok(uri) = std::env::var("TEST_DATABASE_URI") else {
            return;
        };
        let store = PostgresCheckpointStore::connect(&uri, &PoolConfig::default())
            .await
            .expect("connects");
        store.setup().await.expect("migrates");
        store.setup().await.expect("migrations are idempotent");

        let suffix = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let thread = ThreadId::new(format!("test-{suffix}")).expect("valid id");
        assert!(store.load(&thread).await.expect("loads").is_empty());

        let first = store
            .save(
                &thread,
                ConversationState::from(Message::user("one")),
                CheckpointMetadata::default(),
            )
            .await
            .expect("saves");
        let second = store
            .save(
                &thread,
                ConversationState::from(Message::user("two")),
                CheckpointMetadata::default(),
            )
            .await
            .expect("saves");

        assert_eq!(first.sequence_number, 1);
        assert_eq!(second.sequence_number, 2);
        let durable = store.latest(&thread).await.expect("latest");
        assert_eq!(durable.as_ref(), Some(&second));
        let loaded = store.load(&thread).await.expect("loads");
        assert_eq!(loaded.last_message().expect("message").content(), "two");
        assert_eq!(store.history(&thread).await.expect("history").len(), 2);

        store.close().await;
        assert!(matches!(
            store.latest(&thread).await.unwrap_err(),
            StoreError::Unavailable { .. }
        ));
    }
}
