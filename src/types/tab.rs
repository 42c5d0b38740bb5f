use serde::{Deserialize, Serialize};

/// Host-side record of one open browsing session.
///
/// `id` never changes after creation. `view_instance_id` changes only when
/// the view process is lost and the tab gets a new instance; old instance
/// ids are never reused. The remaining fields mirror what the view last
/// reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub view_instance_id: String,
    pub url: String,
    pub title: String,
    pub is_active: bool,
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Full state broadcast to observers after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TabsSnapshot {
    pub tabs: Vec<Tab>,
    pub active_tab_id: Option<String>,
}

impl TabsSnapshot {
    pub fn active_tab(&self) -> Option<&Tab> {
        let id = self.active_tab_id.as_deref()?;
        self.tabs.iter().find(|t| t.id == id)
    }
}

/// Correlates the active Tab with its live view instance, for collaborators
/// that need to reach the visible surface directly (e.g. action recording).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInstance {
    pub tab_id: String,
    pub instance_id: String,
}
