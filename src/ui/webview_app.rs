//! Desktop shell using `wry` + `tao`.
//!
//! - The tao event loop on the main thread is the view side: it owns the
//!   `ViewBridge` and every webview.
//! - A tokio runtime runs the `SessionHost`; its commands reach the event
//!   loop as user events, and adapter callbacks come back the same way.
//! - The two sides share nothing but the message channel.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder};
use tao::window::WindowBuilder;
use tracing::{error, info};

use crate::app::App;
use crate::bridge::{AdapterNotice, NoticeFn, ViewBridge};
use crate::channel;
use crate::logging;
use crate::services::settings_engine::default_data_dir;
use crate::types::errors::{AppError, ViewError};
use crate::types::messages::ViewCommand;
use crate::ui::wry_adapter::{full_bounds, WryFactory};

#[derive(Debug)]
enum UserEvent {
    Command(ViewCommand),
    Notice(AdapterNotice),
}

/// Build everything and hand the thread to the event loop. Only returns on
/// setup failure.
pub fn run() -> Result<(), AppError> {
    let app = App::new(default_data_dir().join("sessions.db"), None)?;
    logging::init(&app.settings().logging.filter);
    let window_settings = app.settings().window.clone();

    let runtime = tokio::runtime::Runtime::new().map_err(|e| ViewError::Platform(e.to_string()))?;
    let (host_end, view_end) = channel::pair();

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = WindowBuilder::new()
        .with_title(&window_settings.title)
        .with_inner_size(tao::dpi::LogicalSize::new(window_settings.width, window_settings.height))
        .build(&event_loop)
        .map_err(|e| ViewError::Platform(e.to_string()))?;
    let window = Rc::new(window);

    let notice_proxy = Mutex::new(proxy.clone());
    let deliver: NoticeFn = Arc::new(move |notice| {
        if let Ok(proxy) = notice_proxy.lock() {
            let _ = proxy.send_event(UserEvent::Notice(notice));
        }
    });
    let mut bridge = ViewBridge::new(
        WryFactory::new(window.clone(), window_settings.devtools),
        view_end.events,
        deliver,
    );

    let mut commands = view_end.commands;
    let command_proxy = proxy;
    runtime.spawn(async move {
        while let Some(command) = commands.recv().await {
            if command_proxy.send_event(UserEvent::Command(command)).is_err() {
                break;
            }
        }
    });

    let (host, handle) = app.session_host(host_end.commands, host_end.events);
    runtime.spawn(async move {
        if let Err(e) = host.run().await {
            error!(error = %e, "session host stopped");
        }
    });
    if let Err(e) = runtime.block_on(app.restore_into(&handle)) {
        error!(error = %e, "session restore failed");
    }
    info!("window ready");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;
        // Keep the runtime alive for as long as the loop runs.
        let _ = &runtime;

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                if let Err(e) = app.persist(&handle.snapshot()) {
                    error!(error = %e, "session save failed");
                }
                handle.shutdown();
                bridge.remove_all();
                *control_flow = ControlFlow::Exit;
            }

            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                let bounds = full_bounds(&window);
                for adapter in bridge.adapters_mut() {
                    let _ = adapter.set_bounds(bounds);
                }
            }

            Event::UserEvent(UserEvent::Command(command)) => bridge.handle_command(command),
            Event::UserEvent(UserEvent::Notice(notice)) => bridge.handle_notice(notice),

            _ => {}
        }
    })
}
