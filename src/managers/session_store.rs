//! Saved tab sessions.
//!
//! Stores the open tab list as JSON in SQLite so the next launch can
//! recreate it.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::params;
use uuid::Uuid;

use crate::database::connection::Database;
use crate::types::errors::SessionError;
use crate::types::session::{SessionData, SessionTab};
use crate::types::tab::TabsSnapshot;

/// Trait defining session persistence operations.
pub trait SessionStoreTrait {
    fn save_session(&self, data: &SessionData) -> Result<(), SessionError>;
    fn restore_session(&self) -> Result<Option<SessionData>, SessionError>;
    fn has_session(&self) -> bool;
    fn clear_session(&self) -> Result<(), SessionError>;
}

pub struct SessionStore {
    db: Arc<Database>,
}

impl SessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl SessionStoreTrait for SessionStore {
    fn save_session(&self, data: &SessionData) -> Result<(), SessionError> {
        let json = serde_json::to_string(data)
            .map_err(|e| SessionError::SerializationError(e.to_string()))?;
        self.db
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO sessions (id, data, tab_count, timestamp) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        Uuid::new_v4().to_string(),
                        json,
                        data.tabs.len() as i64,
                        data.timestamp
                    ],
                )
            })
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Most recently saved session, if any.
    fn restore_session(&self) -> Result<Option<SessionData>, SessionError> {
        let row = self.db.with_connection(|conn| {
            conn.query_row(
                "SELECT data FROM sessions ORDER BY timestamp DESC, rowid DESC LIMIT 1",
                [],
                |row| row.get::<_, String>(0),
            )
        });
        match row {
            Ok(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| SessionError::SerializationError(e.to_string())),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SessionError::DatabaseError(e.to_string())),
        }
    }

    fn has_session(&self) -> bool {
        self.db
            .with_connection(|conn| {
                conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, i64>(0))
            })
            .map(|count| count > 0)
            .unwrap_or(false)
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        self.db
            .with_connection(|conn| conn.execute("DELETE FROM sessions", []))
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

/// Capture a broadcast snapshot in persistable form.
pub fn session_from_snapshot(snapshot: &TabsSnapshot) -> SessionData {
    let tabs = snapshot
        .tabs
        .iter()
        .map(|t| SessionTab {
            url: t.url.clone(),
            title: t.title.clone(),
        })
        .collect();
    let active_index = snapshot
        .active_tab_id
        .as_deref()
        .and_then(|id| snapshot.tabs.iter().position(|t| t.id == id));
    SessionData {
        tabs,
        active_index,
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64,
    }
}
