//! # Chatstore - conversation history and session state persistence
//!
//! Chatstore keeps two things for a chat application:
//! - an append-only log of messages per user
//! - a single, last-write-wins session state row per user
//!
//! Storage goes through the [`StorageBackend`] trait so the engine underneath
//! can be swapped. SQLite is the working reference backend; PostgreSQL and MySQL
//! are declared but refuse construction until a driver is wired in.
//! A [`BackendRegistry`] maps logical names to backends and decides which one
//! serves a call.

pub mod backend;
pub mod config;
pub mod message;
pub mod registry;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use backend::{
    BackendConfig, BackendKind, ConnectionInfo, Row, SqlExecutor, SqliteBackend, StorageBackend,
    create_backend, transact,
};
pub use message::{Message, SessionLabels, SessionState};
pub use registry::{BackendHandle, BackendRegistry, Route};
pub use storage::ChatStore;

/// Result type alias for Chatstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Chatstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection error ({target}): {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Provider not registered: {0}")]
    NotFound(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}
