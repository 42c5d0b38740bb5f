//! Desktop UI layer.
//!
//! Uses `wry` for the embedded browsing surfaces:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! Each tab is one hidden-or-visible child webview of a single `tao` window.

pub mod webview_app;
pub mod wry_adapter;
