//! Host-side authoritative tab state.
//!
//! `TabManager` owns the tab collection and is the only thing that mutates
//! it. Each operation applies its whole change, queues the resulting view
//! commands, and publishes exactly one snapshot before returning, so
//! observers never see a half-updated collection.

use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::CommandSender;
use crate::managers::observers::Observers;
use crate::types::errors::SessionError;
use crate::types::messages::{ViewCommand, ViewEvent};
use crate::types::settings::ActivationPolicy;
use crate::types::tab::{ActiveInstance, Tab, TabsSnapshot};

const NEW_TAB_TITLE: &str = "New Tab";

/// Schemes that are complete without a `//` authority part.
const OPAQUE_SCHEMES: &[&str] = &[
    "about:",
    "data:",
    "blob:",
    "file:",
    "javascript:",
    "mailto:",
    "view-source:",
];

/// Trait defining the tab session interface.
///
/// Lookups by unknown id are not errors: mutators return `false` and leave
/// state untouched.
pub trait TabManagerTrait {
    fn create_tab(&mut self, url: Option<&str>, activate: bool) -> Tab;
    fn close_tab(&mut self, tab_id: &str) -> bool;
    fn switch_tab(&mut self, tab_id: &str) -> bool;
    fn navigate_tab(&mut self, tab_id: &str, url: &str) -> bool;
    fn go_back(&mut self, tab_id: &str) -> bool;
    fn go_forward(&mut self, tab_id: &str) -> bool;
    fn reload_tab(&mut self, tab_id: &str) -> bool;
    fn apply_event(&mut self, event: ViewEvent) -> bool;
    fn reconcile_view_loss(&mut self) -> usize;
    fn get_tab(&self, tab_id: &str) -> Option<&Tab>;
    fn get_tabs(&self) -> &[Tab];
    fn get_active_tab(&self) -> Option<&Tab>;
    fn active_instance(&self) -> Option<ActiveInstance>;
    fn tab_count(&self) -> usize;
    fn snapshot(&self) -> TabsSnapshot;
}

/// In-memory tab session, wired to the view side through a command channel.
pub struct TabManager {
    /// Insertion order.
    tabs: Vec<Tab>,
    active_tab_id: Option<String>,
    /// Tab ids ordered by last activation, most recent last.
    activation_history: Vec<String>,
    policy: ActivationPolicy,
    default_url: String,
    commands: CommandSender,
    observers: Observers,
}

impl TabManager {
    pub fn new(commands: CommandSender) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: None,
            activation_history: Vec::new(),
            policy: ActivationPolicy::default(),
            default_url: "about:blank".to_string(),
            commands,
            observers: Observers::new(),
        }
    }

    pub fn with_policy(mut self, policy: ActivationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_url(mut self, url: &str) -> Self {
        self.default_url = normalize_url(url);
        self
    }

    pub fn policy(&self) -> ActivationPolicy {
        self.policy
    }

    /// Register an observer; it first receives the current snapshot.
    pub fn subscribe(&mut self) -> UnboundedReceiver<TabsSnapshot> {
        let current = self.snapshot();
        self.observers.subscribe(current)
    }

    /// Latest published snapshot, readable from any task without locking.
    pub fn watch(&self) -> watch::Receiver<TabsSnapshot> {
        self.observers.watch()
    }

    /// Verify the structural invariants of the collection.
    pub fn check_invariants(&self) -> Result<(), SessionError> {
        let active: Vec<&Tab> = self.tabs.iter().filter(|t| t.is_active).collect();
        if active.len() > 1 {
            return Err(SessionError::InvariantViolation(format!(
                "{} tabs flagged active",
                active.len()
            )));
        }
        if self.tabs.is_empty() != active.is_empty() {
            return Err(SessionError::InvariantViolation(format!(
                "{} tabs but {} active",
                self.tabs.len(),
                active.len()
            )));
        }
        let flagged = active.first().map(|t| t.id.as_str());
        if flagged != self.active_tab_id.as_deref() {
            return Err(SessionError::InvariantViolation(format!(
                "active id {:?} disagrees with flagged tab {:?}",
                self.active_tab_id, flagged
            )));
        }
        let mut instances = HashSet::new();
        for tab in &self.tabs {
            if !instances.insert(tab.view_instance_id.as_str()) {
                return Err(SessionError::InvariantViolation(format!(
                    "view instance {} shared by more than one tab",
                    tab.view_instance_id
                )));
            }
        }
        Ok(())
    }

    fn find_tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    fn dispatch(&self, command: ViewCommand) {
        // A dead view side is the supervisor's concern; the channel logs it.
        let _ = self.commands.send(command);
    }

    fn broadcast(&mut self) {
        let snapshot = self.snapshot();
        self.observers.broadcast(snapshot);
    }

    /// Flag `tab_id` active, clear every other flag, and show its view.
    fn activate(&mut self, tab_id: &str) {
        let mut instance_id = None;
        for tab in &mut self.tabs {
            tab.is_active = tab.id == tab_id;
            if tab.is_active {
                instance_id = Some(tab.view_instance_id.clone());
            }
        }
        let Some(instance_id) = instance_id else {
            return;
        };
        self.active_tab_id = Some(tab_id.to_string());
        self.activation_history.retain(|id| id != tab_id);
        self.activation_history.push(tab_id.to_string());
        self.dispatch(ViewCommand::ShowView { instance_id });
    }

    /// Pick the successor after the active tab was removed.
    fn successor(&self) -> Option<String> {
        match self.policy {
            ActivationPolicy::FirstRemaining => self.tabs.first().map(|t| t.id.clone()),
            ActivationPolicy::MostRecentlyActive => self
                .activation_history
                .iter()
                .rev()
                .find(|id| self.find_tab_index(id).is_some())
                .cloned()
                .or_else(|| self.tabs.first().map(|t| t.id.clone())),
        }
    }

    /// Apply `update` to a known tab and broadcast; unknown ids are ignored.
    fn update_tab(&mut self, tab_id: &str, update: impl FnOnce(&mut Tab)) -> bool {
        let Some(idx) = self.find_tab_index(tab_id) else {
            debug!(tab_id, "event for unknown tab ignored");
            return false;
        };
        update(&mut self.tabs[idx]);
        self.broadcast();
        true
    }
}

impl TabManagerTrait for TabManager {
    /// Allocate a tab and ask the view side to build its instance.
    ///
    /// The record exists before the view confirms anything. The first tab
    /// of an empty collection is always activated.
    fn create_tab(&mut self, url: Option<&str>, activate: bool) -> Tab {
        let url = normalize_url(url.unwrap_or(self.default_url.as_str()));
        let tab = Tab {
            id: Uuid::new_v4().to_string(),
            view_instance_id: Uuid::new_v4().to_string(),
            url: url.clone(),
            title: NEW_TAB_TITLE.to_string(),
            is_active: false,
            is_loading: true,
            can_go_back: false,
            can_go_forward: false,
        };
        let was_empty = self.tabs.is_empty();
        self.tabs.push(tab.clone());
        self.dispatch(ViewCommand::CreateView {
            tab_id: tab.id.clone(),
            instance_id: tab.view_instance_id.clone(),
            url,
        });
        if activate || was_empty {
            self.activate(&tab.id);
        }
        info!(tab_id = %tab.id, url = %tab.url, "tab created");
        self.broadcast();
        self.get_tab(&tab.id).cloned().unwrap_or(tab)
    }

    /// Remove a tab. The record is gone before this returns, even though
    /// the view instance may still be tearing down.
    fn close_tab(&mut self, tab_id: &str) -> bool {
        let Some(idx) = self.find_tab_index(tab_id) else {
            return false;
        };
        let removed = self.tabs.remove(idx);
        self.dispatch(ViewCommand::RemoveView {
            instance_id: removed.view_instance_id.clone(),
        });
        self.activation_history.retain(|id| id != tab_id);

        if removed.is_active {
            self.active_tab_id = None;
            if let Some(next) = self.successor() {
                self.activate(&next);
            }
        }
        info!(tab_id, remaining = self.tabs.len(), "tab closed");
        self.broadcast();
        true
    }

    fn switch_tab(&mut self, tab_id: &str) -> bool {
        if self.find_tab_index(tab_id).is_none() {
            return false;
        }
        self.activate(tab_id);
        self.broadcast();
        true
    }

    fn navigate_tab(&mut self, tab_id: &str, url: &str) -> bool {
        let Some(idx) = self.find_tab_index(tab_id) else {
            return false;
        };
        let url = normalize_url(url);
        let tab = &mut self.tabs[idx];
        tab.is_loading = true;
        let instance_id = tab.view_instance_id.clone();
        debug!(tab_id, %url, "navigate");
        self.dispatch(ViewCommand::NavigateView { instance_id, url });
        self.broadcast();
        true
    }

    fn go_back(&mut self, tab_id: &str) -> bool {
        match self.get_tab(tab_id) {
            Some(tab) if tab.can_go_back => {
                let instance_id = tab.view_instance_id.clone();
                self.dispatch(ViewCommand::GoBackView { instance_id });
                true
            }
            _ => false,
        }
    }

    fn go_forward(&mut self, tab_id: &str) -> bool {
        match self.get_tab(tab_id) {
            Some(tab) if tab.can_go_forward => {
                let instance_id = tab.view_instance_id.clone();
                self.dispatch(ViewCommand::GoForwardView { instance_id });
                true
            }
            _ => false,
        }
    }

    fn reload_tab(&mut self, tab_id: &str) -> bool {
        let Some(idx) = self.find_tab_index(tab_id) else {
            return false;
        };
        let tab = &mut self.tabs[idx];
        tab.is_loading = true;
        let instance_id = tab.view_instance_id.clone();
        self.dispatch(ViewCommand::ReloadView { instance_id });
        self.broadcast();
        true
    }

    /// Fold one view event into the collection. Returns whether state
    /// changed (and a snapshot was broadcast).
    fn apply_event(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::TitleUpdated { tab_id, title } => {
                self.update_tab(&tab_id, |tab| tab.title = title)
            }
            ViewEvent::UrlChanged { tab_id, url } => self.update_tab(&tab_id, |tab| tab.url = url),
            ViewEvent::LoadingChanged { tab_id, is_loading } => {
                self.update_tab(&tab_id, |tab| tab.is_loading = is_loading)
            }
            ViewEvent::NavigationStateChanged {
                tab_id,
                can_go_back,
                can_go_forward,
            } => self.update_tab(&tab_id, |tab| {
                tab.can_go_back = can_go_back;
                tab.can_go_forward = can_go_forward;
            }),
            ViewEvent::NewWindowRequested { tab_id, url } => {
                if self.find_tab_index(&tab_id).is_none() {
                    debug!(opener = %tab_id, %url, "popup from closed tab ignored");
                    return false;
                }
                debug!(opener = %tab_id, %url, "page requested a new window");
                self.create_tab(Some(&url), true);
                true
            }
            ViewEvent::LoadFailed {
                tab_id,
                url,
                code,
                description,
            } => {
                warn!(%tab_id, %url, code, %description, "page load failed");
                false
            }
        }
    }

    /// Rebuild every view instance after the view process was lost.
    ///
    /// Old instance ids are retired, never reused. Returns the number of
    /// instances requested.
    fn reconcile_view_loss(&mut self) -> usize {
        let mut recreated = Vec::with_capacity(self.tabs.len());
        for tab in &mut self.tabs {
            tab.view_instance_id = Uuid::new_v4().to_string();
            tab.is_loading = true;
            tab.can_go_back = false;
            tab.can_go_forward = false;
            recreated.push(ViewCommand::CreateView {
                tab_id: tab.id.clone(),
                instance_id: tab.view_instance_id.clone(),
                url: tab.url.clone(),
            });
        }
        let count = recreated.len();
        for command in recreated {
            self.dispatch(command);
        }
        if let Some(active) = self.get_active_tab() {
            let instance_id = active.view_instance_id.clone();
            self.dispatch(ViewCommand::ShowView { instance_id });
        }
        warn!(count, "view instances recreated after view loss");
        self.broadcast();
        count
    }

    fn get_tab(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    fn get_tabs(&self) -> &[Tab] {
        &self.tabs
    }

    fn get_active_tab(&self) -> Option<&Tab> {
        self.active_tab_id
            .as_deref()
            .and_then(|id| self.get_tab(id))
    }

    fn active_instance(&self) -> Option<ActiveInstance> {
        self.get_active_tab().map(|t| ActiveInstance {
            tab_id: t.id.clone(),
            instance_id: t.view_instance_id.clone(),
        })
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn snapshot(&self) -> TabsSnapshot {
        TabsSnapshot {
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id.clone(),
        }
    }
}

/// Best-effort address fix-up: anything without a scheme gets `https://`.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return "about:blank".to_string();
    }
    let lower = trimmed.to_ascii_lowercase();
    if has_authority_scheme(&lower) || OPAQUE_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return trimmed.to_string();
    }
    format!("https://{}", trimmed)
}

fn has_authority_scheme(url: &str) -> bool {
    match url.find("://") {
        Some(0) | None => false,
        Some(end) => {
            let scheme = &url[..end];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
    }
}
