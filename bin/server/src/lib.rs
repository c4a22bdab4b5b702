//! docgraph HTTP server.
//!
//! Exposes the echo workflow over HTTP and persists every conversation
//! turn to PostgreSQL so threads survive restarts.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod service;

#[cfg(test)]
mod testing;
