//! Storage Layer - chat persistence on top of a `StorageBackend`
//!
//! Tables:
//! - messages(id, user_id, role, content, created_at)
//! - sessions(user_id, state, incident_type, emotion, updated_at)

pub mod chat;
pub mod schema;

pub use chat::{ChatStore, DEFAULT_HISTORY_LIMIT};
