//! Core domain types and utilities for docgraph.
//!
//! This crate provides the identifier types and the error handling
//! foundation shared by the conversation, workflow, and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{InvocationId, ParseIdError, ThreadId, UserId};
