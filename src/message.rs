//! Records persisted by the chat store
//!
//! - `Message`: one immutable entry in a user's conversation
//! - `SessionState`: the single current label set for a user

use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// A stored conversational message.
///
/// `id` and `created_at` are assigned by the engine at insert time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user_id: String,
    /// Free-form, conventionally "user" or "assistant"
    pub role: String,
    pub content: String,
    /// `YYYY-MM-DD HH:MM:SS.SSS`, engine clock, no timezone
    pub created_at: String,
}

/// Current session labels for one user.
///
/// Each write replaces the whole row; no history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_id: String,
    /// e.g. "calm" or "charged"
    pub state: Option<String>,
    pub incident_type: Option<String>,
    pub emotion: Option<String>,
    pub updated_at: Option<String>,
}

impl SessionState {
    /// The record reported for a user who has never been written.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: None,
            incident_type: None,
            emotion: None,
            updated_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.incident_type.is_none() && self.emotion.is_none()
    }
}

/// Labels written by a session upsert. Unset fields are stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLabels {
    pub state: Option<String>,
    pub incident_type: Option<String>,
    pub emotion: Option<String>,
}

impl SessionLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_incident_type(mut self, incident_type: impl Into<String>) -> Self {
        self.incident_type = Some(incident_type.into());
        self
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }
}
