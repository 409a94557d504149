//! Database schema definitions

/// SQL to create the messages table
pub const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at DATETIME DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
)
"#;

/// SQL to create the sessions table
/// One row per user holding the latest state, incident type and emotion
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    user_id TEXT PRIMARY KEY,
    state TEXT,
    incident_type TEXT,
    emotion TEXT,
    updated_at DATETIME DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_messages_user_created ON messages(user_id, created_at)",
];

pub const INSERT_MESSAGE: &str =
    "INSERT INTO messages (user_id, role, content) VALUES (?1, ?2, ?3)";

pub const SELECT_HISTORY: &str = r#"
SELECT id, user_id, role, content, created_at
FROM messages
WHERE user_id = ?1
ORDER BY created_at ASC, id ASC
LIMIT ?2
"#;

pub const SELECT_SESSION: &str =
    "SELECT user_id, state, incident_type, emotion, updated_at FROM sessions WHERE user_id = ?1";

/// Full-replace upsert keyed on `user_id`
pub const UPSERT_SESSION: &str = r#"
INSERT INTO sessions (user_id, state, incident_type, emotion, updated_at)
VALUES (?1, ?2, ?3, ?4, strftime('%Y-%m-%d %H:%M:%f', 'now'))
ON CONFLICT(user_id) DO UPDATE SET
    state = excluded.state,
    incident_type = excluded.incident_type,
    emotion = excluded.emotion,
    updated_at = excluded.updated_at
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_MESSAGES_TABLE, CREATE_SESSIONS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
