//! Chat history and session state operations

use super::schema;
use crate::backend::{Row, transact};
use crate::message::{Message, SessionLabels, SessionState};
use crate::registry::{BackendRegistry, Route};
use crate::Result;
use rusqlite::types::Value;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// High-level chat persistence.
///
/// Every operation resolves its backend through the registry using the
/// caller's [`Route`].
pub struct ChatStore<'r> {
    registry: &'r BackendRegistry,
}

impl<'r> ChatStore<'r> {
    pub fn new(registry: &'r BackendRegistry) -> Self {
        Self { registry }
    }

    /// Create the tables if they are missing. Returns the backend's location.
    pub fn init_schema(&self, route: &Route) -> Result<String> {
        let backend = self.registry.resolve(route)?;
        transact(backend.as_ref(), |conn| {
            for stmt in schema::all_schema_statements() {
                conn.run(stmt, &[])?;
            }
            Ok(())
        })?;

        let location = backend.connection_info().location();
        tracing::info!("Chat schema ready at {}", location);
        Ok(location)
    }

    /// Append one message to `user_id`'s conversation.
    pub fn append_message(&self, user_id: &str, role: &str, content: &str, route: &Route) -> Result<()> {
        let backend = self.registry.resolve(route)?;
        backend.execute(
            schema::INSERT_MESSAGE,
            &[text_param(user_id), text_param(role), text_param(content)],
        )
    }

    /// Oldest-first conversation for `user_id`, at most `limit` messages.
    pub fn get_history(&self, user_id: &str, limit: usize, route: &Route) -> Result<Vec<Message>> {
        let backend = self.registry.resolve(route)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = backend.fetch_all(schema::SELECT_HISTORY, &[text_param(user_id), Value::Integer(limit)])?;

        let messages = rows
            .iter()
            .map(row_to_message)
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Session labels for `user_id`; an all-empty record if none were stored.
    pub fn get_session_state(&self, user_id: &str, route: &Route) -> Result<SessionState> {
        let backend = self.registry.resolve(route)?;
        match backend.fetch_one(schema::SELECT_SESSION, &[text_param(user_id)])? {
            Some(row) => Ok(row_to_session(&row)?),
            None => Ok(SessionState::empty(user_id)),
        }
    }

    /// Replace `user_id`'s session labels, inserting the row if needed.
    ///
    /// Labels left unset are stored as NULL rather than kept from the previous row.
    pub fn set_session_state(&self, user_id: &str, labels: &SessionLabels, route: &Route) -> Result<()> {
        let backend = self.registry.resolve(route)?;
        backend.execute(
            schema::UPSERT_SESSION,
            &[
                text_param(user_id),
                Value::from(labels.state.clone()),
                Value::from(labels.incident_type.clone()),
                Value::from(labels.emotion.clone()),
            ],
        )
    }
}

fn text_param(s: &str) -> Value {
    Value::Text(s.to_string())
}

const MESSAGE_COLUMNS: [&str; 5] = ["id", "user_id", "role", "content", "created_at"];
const SESSION_COLUMNS: [&str; 5] = ["user_id", "state", "incident_type", "emotion", "updated_at"];

fn cell<'a>(row: &'a Row, idx: usize) -> rusqlite::Result<&'a Value> {
    row.get(idx).ok_or(rusqlite::Error::InvalidColumnIndex(idx))
}

fn column_type_error(idx: usize, name: &str, value: &Value) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, name.to_string(), value.data_type())
}

fn integer_at(row: &Row, idx: usize, name: &str) -> rusqlite::Result<i64> {
    match cell(row, idx)? {
        Value::Integer(n) => Ok(*n),
        other => Err(column_type_error(idx, name, other)),
    }
}

fn text_at(row: &Row, idx: usize, name: &str) -> rusqlite::Result<String> {
    match cell(row, idx)? {
        Value::Text(s) => Ok(s.clone()),
        other => Err(column_type_error(idx, name, other)),
    }
}

fn optional_text_at(row: &Row, idx: usize, name: &str) -> rusqlite::Result<Option<String>> {
    match cell(row, idx)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s.clone())),
        other => Err(column_type_error(idx, name, other)),
    }
}

fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    let c = &MESSAGE_COLUMNS;
    Ok(Message {
        id: integer_at(row, 0, c[0])?,
        user_id: text_at(row, 1, c[1])?,
        role: text_at(row, 2, c[2])?,
        content: text_at(row, 3, c[3])?,
        created_at: text_at(row, 4, c[4])?,
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<SessionState> {
    let c = &SESSION_COLUMNS;
    Ok(SessionState {
        user_id: text_at(row, 0, c[0])?,
        state: optional_text_at(row, 1, c[1])?,
        incident_type: optional_text_at(row, 2, c[2])?,
        emotion: optional_text_at(row, 3, c[3])?,
        updated_at: optional_text_at(row, 4, c[4])?,
    })
}
