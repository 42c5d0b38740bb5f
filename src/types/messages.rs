//! Messages crossing the host/view boundary.
//!
//! Commands flow host → view, events flow view → host. Both serialize as
//! internally tagged JSON objects, e.g.
//! `{"type":"navigateView","instanceId":"…","url":"https://…"}`.

use serde::{Deserialize, Serialize};

/// Chromium's `net::ERR_ABORTED`: the load was cancelled, typically because
/// the user navigated away before it finished.
pub const ERR_ABORTED: i32 = -3;

/// Host → view instruction addressed to one view instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ViewCommand {
    CreateView {
        tab_id: String,
        instance_id: String,
        url: String,
    },
    RemoveView {
        instance_id: String,
    },
    ShowView {
        instance_id: String,
    },
    NavigateView {
        instance_id: String,
        url: String,
    },
    GoBackView {
        instance_id: String,
    },
    GoForwardView {
        instance_id: String,
    },
    ReloadView {
        instance_id: String,
    },
}

impl ViewCommand {
    /// The view instance this command targets.
    pub fn instance_id(&self) -> &str {
        match self {
            ViewCommand::CreateView { instance_id, .. }
            | ViewCommand::RemoveView { instance_id }
            | ViewCommand::ShowView { instance_id }
            | ViewCommand::NavigateView { instance_id, .. }
            | ViewCommand::GoBackView { instance_id }
            | ViewCommand::GoForwardView { instance_id }
            | ViewCommand::ReloadView { instance_id } => instance_id,
        }
    }
}

/// View → host notification, tagged with the Tab id handed over at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ViewEvent {
    TitleUpdated {
        tab_id: String,
        title: String,
    },
    UrlChanged {
        tab_id: String,
        url: String,
    },
    LoadingChanged {
        tab_id: String,
        is_loading: bool,
    },
    NavigationStateChanged {
        tab_id: String,
        can_go_back: bool,
        can_go_forward: bool,
    },
    NewWindowRequested {
        tab_id: String,
        url: String,
    },
    /// Diagnostic only; the host logs it and changes nothing.
    LoadFailed {
        tab_id: String,
        url: String,
        code: i32,
        description: String,
    },
}

impl ViewEvent {
    pub fn tab_id(&self) -> &str {
        match self {
            ViewEvent::TitleUpdated { tab_id, .. }
            | ViewEvent::UrlChanged { tab_id, .. }
            | ViewEvent::LoadingChanged { tab_id, .. }
            | ViewEvent::NavigationStateChanged { tab_id, .. }
            | ViewEvent::NewWindowRequested { tab_id, .. }
            | ViewEvent::LoadFailed { tab_id, .. } => tab_id,
        }
    }
}
