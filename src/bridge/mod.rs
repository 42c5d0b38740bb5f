//! View-side bridge.
//!
//! `ViewBridge` owns the registry of live view instances, turns host
//! commands into adapter calls, and turns raw adapter events into
//! `ViewEvent`s tagged with the Tab id the host supplied at creation, so the
//! host never has to map instance ids back to tabs.

pub mod adapter;
pub mod headless;
pub mod history;

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::channel::{CommandReceiver, EventSender};
use crate::types::errors::ViewError;
use crate::types::messages::{ViewCommand, ViewEvent, ERR_ABORTED};

pub use adapter::{
    queue_delivery, AdapterEvent, AdapterEventSink, AdapterFactory, AdapterNotice, NoticeFn,
    ViewAdapter,
};
pub use headless::{HeadlessAdapter, HeadlessFactory};
pub use history::NavHistory;

/// Code reported when the engine could not build a view at all.
pub const ERR_VIEW_CREATION: i32 = -1000;

struct Registered<A> {
    tab_id: String,
    adapter: A,
}

pub struct ViewBridge<F: AdapterFactory> {
    factory: F,
    instances: HashMap<String, Registered<F::Adapter>>,
    visible: Option<String>,
    events: EventSender,
    deliver: NoticeFn,
}

impl<F: AdapterFactory> ViewBridge<F> {
    /// `deliver` routes adapter notices back into `handle_notice`.
    pub fn new(factory: F, events: EventSender, deliver: NoticeFn) -> Self {
        Self {
            factory,
            instances: HashMap::new(),
            visible: None,
            events,
            deliver,
        }
    }

    pub fn handle_command(&mut self, command: ViewCommand) {
        debug!(?command, "view command");
        match command {
            ViewCommand::CreateView {
                tab_id,
                instance_id,
                url,
            } => self.create(&tab_id, &instance_id, &url),
            ViewCommand::RemoveView { instance_id } => {
                self.remove(&instance_id);
            }
            ViewCommand::ShowView { instance_id } => {
                self.show(&instance_id);
            }
            ViewCommand::NavigateView { instance_id, url } => {
                self.navigate(&instance_id, &url);
            }
            ViewCommand::GoBackView { instance_id } => {
                self.go_back(&instance_id);
            }
            ViewCommand::GoForwardView { instance_id } => {
                self.go_forward(&instance_id);
            }
            ViewCommand::ReloadView { instance_id } => {
                self.reload(&instance_id);
            }
        }
    }

    /// Build a hidden instance for `tab_id` and register it.
    pub fn create(&mut self, tab_id: &str, instance_id: &str, url: &str) {
        if self.instances.contains_key(instance_id) {
            warn!(instance_id, tab_id, "instance id already registered, create refused");
            return;
        }
        let sink = AdapterEventSink::new(instance_id, self.deliver.clone());
        match self.factory.create(instance_id, url, sink) {
            Ok(mut adapter) => {
                if let Err(e) = adapter.set_visible(false) {
                    warn!(instance_id, error = %e, "could not hide new view");
                }
                self.instances.insert(
                    instance_id.to_string(),
                    Registered {
                        tab_id: tab_id.to_string(),
                        adapter,
                    },
                );
                info!(instance_id, tab_id, url, "view created");
            }
            Err(e) => {
                error!(instance_id, tab_id, error = %e, "view creation failed");
                self.emit(ViewEvent::LoadFailed {
                    tab_id: tab_id.to_string(),
                    url: url.to_string(),
                    code: ERR_VIEW_CREATION,
                    description: e.to_string(),
                });
            }
        }
    }

    /// Dispose and unregister; later commands for the id are no-ops.
    pub fn remove(&mut self, instance_id: &str) -> bool {
        let Some(mut entry) = self.instances.remove(instance_id) else {
            return false;
        };
        if self.visible.as_deref() == Some(instance_id) {
            self.visible = None;
        }
        entry.adapter.dispose();
        info!(instance_id, tab_id = %entry.tab_id, "view removed");
        true
    }

    /// Hide the previously visible instance, reveal this one, focus it.
    pub fn show(&mut self, instance_id: &str) -> bool {
        if !self.instances.contains_key(instance_id) {
            return false;
        }
        if let Some(previous) = self.visible.take() {
            if previous != instance_id {
                if let Some(entry) = self.instances.get_mut(&previous) {
                    log_failure(&previous, "hide", entry.adapter.set_visible(false));
                }
            }
        }
        if let Some(entry) = self.instances.get_mut(instance_id) {
            log_failure(instance_id, "show", entry.adapter.set_visible(true));
            log_failure(instance_id, "focus", entry.adapter.focus());
        }
        self.visible = Some(instance_id.to_string());
        true
    }

    pub fn navigate(&mut self, instance_id: &str, url: &str) -> bool {
        self.with_adapter(instance_id, "navigate", |a| a.navigate(url))
    }

    pub fn go_back(&mut self, instance_id: &str) -> bool {
        self.with_adapter(instance_id, "back", |a| a.go_back())
    }

    pub fn go_forward(&mut self, instance_id: &str) -> bool {
        self.with_adapter(instance_id, "forward", |a| a.go_forward())
    }

    pub fn reload(&mut self, instance_id: &str) -> bool {
        self.with_adapter(instance_id, "reload", |a| a.reload())
    }

    fn with_adapter(
        &mut self,
        instance_id: &str,
        action: &str,
        f: impl FnOnce(&mut F::Adapter) -> Result<(), ViewError>,
    ) -> bool {
        match self.instances.get_mut(instance_id) {
            Some(entry) => {
                log_failure(instance_id, action, f(&mut entry.adapter));
                true
            }
            None => {
                debug!(instance_id, action, "command for unknown instance ignored");
                false
            }
        }
    }

    /// Normalize one raw adapter event and forward it to the host.
    pub fn handle_notice(&mut self, notice: AdapterNotice) {
        let AdapterNotice { instance_id, event } = notice;
        let Some(entry) = self.instances.get_mut(&instance_id) else {
            debug!(%instance_id, "notice from unregistered instance dropped");
            return;
        };
        let tab_id = entry.tab_id.clone();
        let outbound = match event {
            AdapterEvent::TitleChanged { title } => vec![ViewEvent::TitleUpdated { tab_id, title }],
            AdapterEvent::NavigationStarted { url } => vec![ViewEvent::UrlChanged { tab_id, url }],
            AdapterEvent::NavigationSettled { url } => {
                entry.adapter.on_settled(&url);
                vec![
                    ViewEvent::UrlChanged {
                        tab_id: tab_id.clone(),
                        url,
                    },
                    ViewEvent::NavigationStateChanged {
                        tab_id,
                        can_go_back: entry.adapter.can_go_back(),
                        can_go_forward: entry.adapter.can_go_forward(),
                    },
                ]
            }
            AdapterEvent::LoadingStarted => vec![ViewEvent::LoadingChanged {
                tab_id,
                is_loading: true,
            }],
            AdapterEvent::LoadingStopped => vec![ViewEvent::LoadingChanged {
                tab_id,
                is_loading: false,
            }],
            AdapterEvent::NewWindowRequested { url } => {
                vec![ViewEvent::NewWindowRequested { tab_id, url }]
            }
            AdapterEvent::LoadFailed { url, code, .. } if code == ERR_ABORTED => {
                debug!(%instance_id, %url, "aborted load suppressed");
                Vec::new()
            }
            AdapterEvent::LoadFailed {
                url,
                code,
                description,
            } => vec![ViewEvent::LoadFailed {
                tab_id,
                url,
                code,
                description,
            }],
        };
        for event in outbound {
            self.emit(event);
        }
    }

    fn emit(&self, event: ViewEvent) {
        let _ = self.events.send(event);
    }

    /// Inject a script into the visible instance. `Ok(false)` when nothing
    /// is visible.
    pub fn evaluate_in_visible(&mut self, js: &str) -> Result<bool, ViewError> {
        let Some(id) = self.visible.as_deref() else {
            return Ok(false);
        };
        match self.instances.get_mut(id) {
            Some(entry) => entry.adapter.evaluate_script(js).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn visible_instance(&self) -> Option<&str> {
        self.visible.as_deref()
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.instances.contains_key(instance_id)
    }

    pub fn tab_id_of(&self, instance_id: &str) -> Option<&str> {
        self.instances.get(instance_id).map(|e| e.tab_id.as_str())
    }

    pub fn adapter(&self, instance_id: &str) -> Option<&F::Adapter> {
        self.instances.get(instance_id).map(|e| &e.adapter)
    }

    pub fn adapters_mut(&mut self) -> impl Iterator<Item = &mut F::Adapter> {
        self.instances.values_mut().map(|e| &mut e.adapter)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Dispose every instance. Used on shutdown.
    pub fn remove_all(&mut self) {
        let ids: Vec<String> = self.instances.keys().cloned().collect();
        for id in ids {
            self.remove(&id);
        }
    }

    /// Headless event loop: serve host commands and adapter notices until
    /// the host hangs up.
    pub async fn run(
        mut self,
        mut commands: CommandReceiver,
        mut notices: UnboundedReceiver<AdapterNotice>,
    ) {
        info!("view bridge started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(notice) = notices.recv() => self.handle_notice(notice),
            }
        }
        // Flush what adapters emitted before the host went away.
        while let Ok(notice) = notices.try_recv() {
            self.handle_notice(notice);
        }
        self.remove_all();
        info!("view bridge stopped");
    }
}

fn log_failure(instance_id: &str, action: &str, result: Result<(), ViewError>) {
    if let Err(e) = result {
        warn!(instance_id, action, error = %e, "view action failed");
    }
}
