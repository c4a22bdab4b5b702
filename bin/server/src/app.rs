//! Application lifecycle.
//!
//! Owns the compiled workflow and the checkpoint store for the life of the
//! process. The store is opened and provisioned once at startup and closed
//! exactly once at shutdown, including when startup itself fails partway.

use crate::config::ServerConfig;
use crate::db::PostgresCheckpointStore;
use crate::error::StartupError;
use crate::service::InvocationService;
use docgraph_workflow::{CheckpointStore, CompiledWorkflow, StoreError, echo_workflow};
use rootcause::Report;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Shared application state.
pub struct AppContext {
    /// Runs conversation turns.
    pub service: InvocationService,
    store: Arc<dyn CheckpointStore>,
    closed: AtomicBool,
}

impl AppContext {
    /// Connects to Postgres, provisions the checkpoint schema and compiles
    /// the echo workflow.
    ///
    /// # Errors
    ///
    /// - [`StartupError::StorageUnavailable`] if `DATABASE_URI` is unset,
    ///   the database is unreachable, or migrations fail
    /// - [`StartupError::InvalidGraph`] if the workflow fails validation
    pub async fn init(config: &ServerConfig) -> Result<Self, Report<StartupError>> {
        let Some(database_uri) = config.database_uri.as_deref() else {
            return Err(StartupError::StorageUnavailable {
                details: "DATABASE_URI is not set".to_string(),
            }
            .into());
        };

        info!("Connecting to checkpoint database...");
        let store = PostgresCheckpointStore::connect(database_uri, &config.pool)
            .await
            .map_err(storage_unavailable)?;
        let store: Arc<dyn CheckpointStore> = Arc::new(store);

        if let Err(e) = store.setup().await {
            store.close().await;
            return Err(storage_unavailable(e).into());
        }

        match Self::from_store(Arc::clone(&store)) {
            Ok(ctx) => Ok(ctx),
            Err(e) => {
                store.close().await;
                Err(e.into())
            }
        }
    }

    /// Builds the context over an already provisioned store.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::InvalidGraph`] if the workflow fails validation.
    pub fn from_store(store: Arc<dyn CheckpointStore>) -> Result<Self, StartupError> {
        let workflow = echo_workflow(store).map_err(|e| StartupError::InvalidGraph {
            details: e.to_string(),
        })?;
        Ok(Self::from_workflow(workflow))
    }

    /// Builds the context around an already compiled workflow, releasing
    /// the workflow's store on teardown.
    #[must_use]
    pub fn from_workflow(workflow: CompiledWorkflow) -> Self {
        info!(nodes = ?workflow.node_names(), "Compiled workflow");
        let store = Arc::clone(workflow.store());
        Self {
            service: InvocationService::new(workflow),
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// Releases the checkpoint store. Later calls are no-ops.
    pub async fn teardown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Shutting down, releasing checkpoint store");
        self.store.close().await;
    }
}

/// Keeps only the store's reason so the startup report names the
/// failure once.
fn storage_unavailable(e: StoreError) -> StartupError {
    let details = match e {
        StoreError::Unavailable { reason } => reason,
        other => other.to_string(),
    };
    StartupError::StorageUnavailable { details }
}
