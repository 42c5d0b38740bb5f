use serde::{Deserialize, Serialize};

/// Tab collection as persisted between runs.
///
/// Tab ids are not stored; restored tabs get fresh ids and view instances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub tabs: Vec<SessionTab>,
    /// Index into `tabs` of the tab that was active when saved.
    pub active_index: Option<usize>,
    pub timestamp: i64,
}

/// A tab's state as stored in a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionTab {
    pub url: String,
    pub title: String,
}
