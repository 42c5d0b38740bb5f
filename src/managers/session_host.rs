//! Host event loop.
//!
//! `SessionHost` owns the `TabManager` and runs on a single task, folding
//! upstream requests and inbound view events into it one at a time. Any
//! number of `SessionHandle` clones may issue requests concurrently; the
//! loop serializes them, so an operation issued after `close_tab` resolved
//! always sees the tab as gone.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::channel::EventReceiver;
use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::types::errors::SessionError;
use crate::types::tab::{ActiveInstance, Tab, TabsSnapshot};

/// One upstream request, answered on its oneshot once applied.
#[derive(Debug)]
pub enum HostRequest {
    Create {
        url: Option<String>,
        activate: bool,
        reply: oneshot::Sender<Tab>,
    },
    Close {
        tab_id: String,
        reply: oneshot::Sender<bool>,
    },
    Switch {
        tab_id: String,
        reply: oneshot::Sender<bool>,
    },
    Navigate {
        tab_id: String,
        url: String,
        reply: oneshot::Sender<bool>,
    },
    GoBack {
        tab_id: String,
        reply: oneshot::Sender<bool>,
    },
    GoForward {
        tab_id: String,
        reply: oneshot::Sender<bool>,
    },
    Reload {
        tab_id: String,
        reply: oneshot::Sender<bool>,
    },
    ActiveInstance {
        reply: oneshot::Sender<Option<ActiveInstance>>,
    },
    Subscribe {
        reply: oneshot::Sender<UnboundedReceiver<TabsSnapshot>>,
    },
    ViewLost {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

pub struct SessionHost {
    manager: TabManager,
    requests: UnboundedReceiver<HostRequest>,
    events: EventReceiver,
}

impl SessionHost {
    /// Wrap a manager and the host end of the view channel.
    pub fn new(manager: TabManager, events: EventReceiver) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle {
            requests: tx,
            latest: manager.watch(),
        };
        let host = Self {
            manager,
            requests: rx,
            events,
        };
        (host, handle)
    }

    /// Serve until every handle is dropped or `shutdown` is requested.
    ///
    /// Returns the final snapshot, or the invariant violation that stopped
    /// the loop.
    pub async fn run(mut self) -> Result<TabsSnapshot, SessionError> {
        let mut events_open = true;
        info!("session host started");
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(HostRequest::Shutdown) | None => break,
                    Some(request) => self.handle_request(request),
                },
                event = self.events.recv(), if events_open => match event {
                    Some(event) => {
                        debug!(tab_id = %event.tab_id(), "view event");
                        self.manager.apply_event(event);
                    }
                    None => {
                        warn!("view event stream closed; serving upstream requests only");
                        events_open = false;
                    }
                },
            }
            if let Err(e) = self.manager.check_invariants() {
                error!(error = %e, "tab state corrupted, stopping host");
                return Err(e);
            }
        }
        info!(tabs = self.manager.tab_count(), "session host stopped");
        Ok(self.manager.snapshot())
    }

    fn handle_request(&mut self, request: HostRequest) {
        // A dropped reply receiver only means the caller stopped waiting.
        match request {
            HostRequest::Create { url, activate, reply } => {
                let _ = reply.send(self.manager.create_tab(url.as_deref(), activate));
            }
            HostRequest::Close { tab_id, reply } => {
                let _ = reply.send(self.manager.close_tab(&tab_id));
            }
            HostRequest::Switch { tab_id, reply } => {
                let _ = reply.send(self.manager.switch_tab(&tab_id));
            }
            HostRequest::Navigate { tab_id, url, reply } => {
                let _ = reply.send(self.manager.navigate_tab(&tab_id, &url));
            }
            HostRequest::GoBack { tab_id, reply } => {
                let _ = reply.send(self.manager.go_back(&tab_id));
            }
            HostRequest::GoForward { tab_id, reply } => {
                let _ = reply.send(self.manager.go_forward(&tab_id));
            }
            HostRequest::Reload { tab_id, reply } => {
                let _ = reply.send(self.manager.reload_tab(&tab_id));
            }
            HostRequest::ActiveInstance { reply } => {
                let _ = reply.send(self.manager.active_instance());
            }
            HostRequest::Subscribe { reply } => {
                let _ = reply.send(self.manager.subscribe());
            }
            HostRequest::ViewLost { reply } => {
                let _ = reply.send(self.manager.reconcile_view_loss());
            }
            HostRequest::Shutdown => {}
        }
    }
}

/// Cloneable client of a running `SessionHost`.
///
/// Mutating calls resolve once the host applied them, never waiting on the
/// view. Reads come from the last broadcast and never block.
#[derive(Clone)]
pub struct SessionHandle {
    requests: UnboundedSender<HostRequest>,
    latest: watch::Receiver<TabsSnapshot>,
}

impl SessionHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> HostRequest,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(build(tx))
            .map_err(|_| SessionError::HostUnavailable)?;
        rx.await.map_err(|_| SessionError::HostUnavailable)
    }

    /// Open a tab and make it active.
    pub async fn create_tab(&self, url: Option<&str>) -> Result<Tab, SessionError> {
        let url = url.map(str::to_string);
        self.call(|reply| HostRequest::Create { url, activate: true, reply })
            .await
    }

    /// Open a tab without stealing activation (unless it is the first).
    pub async fn create_background_tab(&self, url: Option<&str>) -> Result<Tab, SessionError> {
        let url = url.map(str::to_string);
        self.call(|reply| HostRequest::Create { url, activate: false, reply })
            .await
    }

    pub async fn close_tab(&self, tab_id: &str) -> Result<bool, SessionError> {
        let tab_id = tab_id.to_string();
        self.call(|reply| HostRequest::Close { tab_id, reply }).await
    }

    pub async fn switch_tab(&self, tab_id: &str) -> Result<bool, SessionError> {
        let tab_id = tab_id.to_string();
        self.call(|reply| HostRequest::Switch { tab_id, reply }).await
    }

    pub async fn navigate_tab(&self, tab_id: &str, url: &str) -> Result<bool, SessionError> {
        let (tab_id, url) = (tab_id.to_string(), url.to_string());
        self.call(|reply| HostRequest::Navigate { tab_id, url, reply })
            .await
    }

    pub async fn go_back(&self, tab_id: &str) -> Result<bool, SessionError> {
        let tab_id = tab_id.to_string();
        self.call(|reply| HostRequest::GoBack { tab_id, reply }).await
    }

    pub async fn go_forward(&self, tab_id: &str) -> Result<bool, SessionError> {
        let tab_id = tab_id.to_string();
        self.call(|reply| HostRequest::GoForward { tab_id, reply }).await
    }

    pub async fn reload_tab(&self, tab_id: &str) -> Result<bool, SessionError> {
        let tab_id = tab_id.to_string();
        self.call(|reply| HostRequest::Reload { tab_id, reply }).await
    }

    /// Handle on the visible view instance, for script-injecting collaborators.
    pub async fn active_instance(&self) -> Result<Option<ActiveInstance>, SessionError> {
        self.call(|reply| HostRequest::ActiveInstance { reply }).await
    }

    /// Receive every subsequent snapshot in order, starting with the current one.
    pub async fn subscribe(&self) -> Result<UnboundedReceiver<TabsSnapshot>, SessionError> {
        self.call(|reply| HostRequest::Subscribe { reply }).await
    }

    /// Tell the host the view process died and came back empty.
    pub async fn view_process_lost(&self) -> Result<usize, SessionError> {
        self.call(|reply| HostRequest::ViewLost { reply }).await
    }

    pub fn shutdown(&self) {
        let _ = self.requests.send(HostRequest::Shutdown);
    }

    pub fn list_all(&self) -> Vec<Tab> {
        self.latest.borrow().tabs.clone()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.latest.borrow().active_tab().cloned()
    }

    pub fn snapshot(&self) -> TabsSnapshot {
        self.latest.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.requests.is_closed()
    }
}
