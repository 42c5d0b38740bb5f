//! The seam between the bridge and a native browsing surface.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::types::errors::ViewError;

/// Raw lifecycle events emitted by one browsing surface.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    TitleChanged { title: String },
    NavigationStarted { url: String },
    /// The navigation committed; history and url are final.
    NavigationSettled { url: String },
    LoadingStarted,
    LoadingStopped,
    /// The page asked for a popup / new window.
    NewWindowRequested { url: String },
    LoadFailed {
        url: String,
        code: i32,
        description: String,
    },
}

/// An adapter event stamped with the instance that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterNotice {
    pub instance_id: String,
    pub event: AdapterEvent,
}

/// Where notices go: a tokio queue when headless, the tao event loop proxy
/// in the GUI.
pub type NoticeFn = Arc<dyn Fn(AdapterNotice) + Send + Sync>;

/// Delivery function that pushes notices onto a tokio queue.
pub fn queue_delivery(tx: UnboundedSender<AdapterNotice>) -> NoticeFn {
    Arc::new(move |notice| {
        let _ = tx.send(notice);
    })
}

/// Handed to an adapter at creation; native callbacks emit through it and
/// never touch the bridge registry directly.
#[derive(Clone)]
pub struct AdapterEventSink {
    instance_id: String,
    deliver: NoticeFn,
}

impl AdapterEventSink {
    pub fn new(instance_id: impl Into<String>, deliver: NoticeFn) -> Self {
        Self {
            instance_id: instance_id.into(),
            deliver,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn emit(&self, event: AdapterEvent) {
        (self.deliver)(AdapterNotice {
            instance_id: self.instance_id.clone(),
            event,
        });
    }
}

impl fmt::Debug for AdapterEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterEventSink")
            .field("instance_id", &self.instance_id)
            .finish_non_exhaustive()
    }
}

/// Navigation primitives of one browsing surface.
pub trait ViewAdapter {
    fn navigate(&mut self, url: &str) -> Result<(), ViewError>;
    fn go_back(&mut self) -> Result<(), ViewError>;
    fn go_forward(&mut self) -> Result<(), ViewError>;
    fn reload(&mut self) -> Result<(), ViewError>;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn set_visible(&mut self, visible: bool) -> Result<(), ViewError>;
    fn focus(&mut self) -> Result<(), ViewError>;
    fn evaluate_script(&mut self, js: &str) -> Result<(), ViewError>;

    /// Called by the bridge when a navigation settles, before it reads
    /// `can_go_back` / `can_go_forward`.
    fn on_settled(&mut self, _url: &str) {}

    /// Release native resources. The adapter is dropped right after.
    fn dispose(&mut self) {}
}

/// Builds adapters for the bridge. Adapters start hidden.
pub trait AdapterFactory {
    type Adapter: ViewAdapter;

    fn create(
        &mut self,
        instance_id: &str,
        url: &str,
        sink: AdapterEventSink,
    ) -> Result<Self::Adapter, ViewError>;
}
