//! TabBridge: a host-authoritative tab session driving isolated browsing
//! surfaces over an asynchronous message channel.
//!
//! The host side (`managers`) owns every tab record; the view side
//! (`bridge`, plus `ui` in the desktop build) only creates, shows and
//! navigates surfaces on command and reports what they do.

pub mod app;
pub mod bridge;
pub mod channel;
pub mod database;
pub mod logging;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
