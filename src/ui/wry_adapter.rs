//! View instances backed by `wry` webviews.
//!
//! All webviews are children of one window; only the visible one is
//! shown. wry reports page loads, title changes and popup requests through
//! builder callbacks, which only forward into the adapter sink.

use std::rc::Rc;

use tao::window::Window;
use tracing::debug;
use wry::dpi::{PhysicalPosition, PhysicalSize};
use wry::{PageLoadEvent, Rect, WebView, WebViewBuilder};

use crate::bridge::adapter::{AdapterEvent, AdapterEventSink, AdapterFactory, ViewAdapter};
use crate::bridge::history::NavHistory;
use crate::types::errors::ViewError;

fn platform(e: wry::Error) -> ViewError {
    ViewError::Platform(e.to_string())
}

/// Rect covering the whole client area of `window`.
pub fn full_bounds(window: &Window) -> Rect {
    let size = window.inner_size();
    Rect {
        position: PhysicalPosition::new(0, 0).into(),
        size: PhysicalSize::new(size.width, size.height).into(),
    }
}

pub struct WryAdapter {
    webview: WebView,
    sink: AdapterEventSink,
    history: NavHistory,
}

impl WryAdapter {
    pub fn set_bounds(&self, bounds: Rect) -> Result<(), ViewError> {
        self.webview.set_bounds(bounds).map_err(platform)
    }
}

impl ViewAdapter for WryAdapter {
    fn navigate(&mut self, url: &str) -> Result<(), ViewError> {
        self.webview
            .load_url(url)
            .map_err(|e| ViewError::Navigation(e.to_string()))
    }

    // wry has no native history API; traverse through the page.
    fn go_back(&mut self) -> Result<(), ViewError> {
        if self.history.begin_back().is_none() {
            return Ok(());
        }
        self.webview
            .evaluate_script("history.back()")
            .map_err(|e| ViewError::Navigation(e.to_string()))
    }

    fn go_forward(&mut self) -> Result<(), ViewError> {
        if self.history.begin_forward().is_none() {
            return Ok(());
        }
        self.webview
            .evaluate_script("history.forward()")
            .map_err(|e| ViewError::Navigation(e.to_string()))
    }

    fn reload(&mut self) -> Result<(), ViewError> {
        self.history.begin_reload();
        self.webview
            .reload()
            .map_err(|e| ViewError::Navigation(e.to_string()))
    }

    fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), ViewError> {
        self.webview.set_visible(visible).map_err(platform)
    }

    fn focus(&mut self) -> Result<(), ViewError> {
        self.webview.focus().map_err(platform)
    }

    fn evaluate_script(&mut self, js: &str) -> Result<(), ViewError> {
        self.webview
            .evaluate_script(js)
            .map_err(|e| ViewError::Script(e.to_string()))
    }

    fn on_settled(&mut self, url: &str) {
        self.history.commit(url);
    }

    fn dispose(&mut self) {
        let _ = self.webview.set_visible(false);
        debug!(instance_id = %self.sink.instance_id(), "webview disposed");
    }
}

/// Builds hidden child webviews of the main window.
pub struct WryFactory {
    window: Rc<Window>,
    devtools: bool,
}

impl WryFactory {
    pub fn new(window: Rc<Window>, devtools: bool) -> Self {
        Self { window, devtools }
    }
}

impl AdapterFactory for WryFactory {
    type Adapter = WryAdapter;

    fn create(
        &mut self,
        instance_id: &str,
        url: &str,
        sink: AdapterEventSink,
    ) -> Result<WryAdapter, ViewError> {
        let load_sink = sink.clone();
        let title_sink = sink.clone();
        let popup_sink = sink.clone();

        let builder = WebViewBuilder::new()
            .with_url(url)
            .with_visible(false)
            .with_focused(false)
            .with_bounds(full_bounds(&self.window))
            .with_devtools(self.devtools)
            .with_on_page_load_handler(move |event, url| match event {
                PageLoadEvent::Started => {
                    load_sink.emit(AdapterEvent::LoadingStarted);
                    load_sink.emit(AdapterEvent::NavigationStarted { url });
                }
                PageLoadEvent::Finished => {
                    load_sink.emit(AdapterEvent::NavigationSettled { url });
                    load_sink.emit(AdapterEvent::LoadingStopped);
                }
            })
            .with_document_title_changed_handler(move |title| {
                title_sink.emit(AdapterEvent::TitleChanged { title });
            })
            // Popups never open natively; the host decides whether a tab appears.
            .with_new_window_req_handler(move |url, _features| {
                if url.starts_with("http://") || url.starts_with("https://") {
                    popup_sink.emit(AdapterEvent::NewWindowRequested { url });
                }
                wry::NewWindowResponse::Deny
            });

        #[cfg(target_os = "linux")]
        let webview = {
            use tao::platform::unix::WindowExtUnix;
            use wry::WebViewBuilderExtUnix;
            let vbox = self
                .window
                .default_vbox()
                .ok_or_else(|| ViewError::Creation("window has no GTK container".to_string()))?;
            builder.build_gtk(vbox)
        };

        #[cfg(not(target_os = "linux"))]
        let webview = builder.build_as_child(&*self.window);

        let webview = webview.map_err(|e| ViewError::Creation(format!("{}: {}", instance_id, e)))?;
        Ok(WryAdapter {
            webview,
            sink,
            history: NavHistory::new(),
        })
    }
}
