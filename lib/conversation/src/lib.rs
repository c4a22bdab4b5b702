//! Conversation types for docgraph.
//!
//! This crate provides:
//!
//! - **Messages**: Immutable role-tagged chat messages
//! - **Conversation State**: The chronological message list threaded
//!   through the workflow and persisted in checkpoints
//! - **Thread Context**: Per-invocation thread and user metadata

pub mod context;
pub mod error;
pub mod message;
pub mod state;

pub use context::ThreadContext;
pub use error::ConversationError;
pub use message::{Message, MessageRole};
pub use state::ConversationState;
