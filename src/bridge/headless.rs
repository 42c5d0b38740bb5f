//! In-memory browsing surface.
//!
//! Every navigation completes synchronously and emits the same lifecycle a
//! real engine would: loading start, navigation start, title, settle,
//! loading stop. Used by the RPC binary and by tests.

use tracing::debug;

use crate::bridge::adapter::{AdapterEvent, AdapterEventSink, AdapterFactory, ViewAdapter};
use crate::bridge::history::NavHistory;
use crate::types::errors::ViewError;

pub struct HeadlessAdapter {
    sink: AdapterEventSink,
    history: NavHistory,
    current_url: String,
    visible: bool,
    focused: bool,
    scripts: Vec<String>,
}

impl HeadlessAdapter {
    fn new(sink: AdapterEventSink) -> Self {
        Self {
            sink,
            history: NavHistory::new(),
            current_url: String::new(),
            visible: false,
            focused: false,
            scripts: Vec::new(),
        }
    }

    fn load(&mut self, url: &str) {
        self.current_url = url.to_string();
        self.sink.emit(AdapterEvent::LoadingStarted);
        self.sink.emit(AdapterEvent::NavigationStarted { url: url.to_string() });
        self.sink.emit(AdapterEvent::TitleChanged { title: page_title(url) });
        self.sink.emit(AdapterEvent::NavigationSettled { url: url.to_string() });
        self.sink.emit(AdapterEvent::LoadingStopped);
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Scripts evaluated in this surface, oldest first.
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }
}

impl ViewAdapter for HeadlessAdapter {
    fn navigate(&mut self, url: &str) -> Result<(), ViewError> {
        self.load(url);
        Ok(())
    }

    fn go_back(&mut self) -> Result<(), ViewError> {
        if let Some(url) = self.history.begin_back() {
            self.load(&url);
        }
        Ok(())
    }

    fn go_forward(&mut self) -> Result<(), ViewError> {
        if let Some(url) = self.history.begin_forward() {
            self.load(&url);
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ViewError> {
        self.history.begin_reload();
        let url = self.current_url.clone();
        self.load(&url);
        Ok(())
    }

    fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), ViewError> {
        self.visible = visible;
        if !visible {
            self.focused = false;
        }
        Ok(())
    }

    fn focus(&mut self) -> Result<(), ViewError> {
        self.focused = true;
        Ok(())
    }

    fn evaluate_script(&mut self, js: &str) -> Result<(), ViewError> {
        self.scripts.push(js.to_string());
        Ok(())
    }

    fn on_settled(&mut self, url: &str) {
        self.history.commit(url);
    }

    fn dispose(&mut self) {
        debug!(instance_id = %self.sink.instance_id(), "headless view disposed");
    }
}

/// Builds `HeadlessAdapter`s. Urls under a refused prefix fail creation,
/// standing in for an engine that cannot open them.
#[derive(Debug, Default)]
pub struct HeadlessFactory {
    refused_prefixes: Vec<String>,
    created: usize,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.refused_prefixes.push(prefix.into());
        self
    }

    /// Number of adapters built so far.
    pub fn created(&self) -> usize {
        self.created
    }
}

impl AdapterFactory for HeadlessFactory {
    type Adapter = HeadlessAdapter;

    fn create(
        &mut self,
        instance_id: &str,
        url: &str,
        sink: AdapterEventSink,
    ) -> Result<HeadlessAdapter, ViewError> {
        if self.refused_prefixes.iter().any(|p| url.starts_with(p.as_str())) {
            return Err(ViewError::Creation(format!(
                "instance {}: refused to open {}",
                instance_id, url
            )));
        }
        self.created += 1;
        let mut adapter = HeadlessAdapter::new(sink);
        adapter.load(url);
        Ok(adapter)
    }
}

/// Display title for a url: the host without `www.`, or a fixed label for
/// internal pages.
pub fn page_title(url: &str) -> String {
    if url.starts_with("about:") {
        return match url {
            "about:blank" => "New Tab".to_string(),
            other => other.to_string(),
        };
    }
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.trim_start_matches("www.")
        .split(['/', '?', '#'])
        .next()
        .filter(|host| !host.is_empty())
        .unwrap_or(url)
        .to_string()
}
