//! TabBridge desktop entry point.
//!
//! With the `gui` feature, opens the tabbed window. Without it, runs a
//! console demo that drives the same host/view split over the headless
//! surface.

#[cfg(feature = "gui")]
fn main() {
    if let Err(e) = tabbridge::ui::webview_app::run() {
        eprintln!("tabbridge failed to start: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "gui"))]
fn main() {
    tabbridge::logging::init("tabbridge=warn");

    println!();
    println!("TabBridge v{} - demo mode (headless views)", env!("CARGO_PKG_VERSION"));
    println!();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("could not start runtime: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(demo::run()) {
        eprintln!("demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "gui"))]
mod demo {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use tabbridge::bridge::{queue_delivery, HeadlessFactory, ViewBridge};
    use tabbridge::channel;
    use tabbridge::managers::session_host::{SessionHandle, SessionHost};
    use tabbridge::managers::tab_manager::TabManager;
    use tabbridge::types::errors::SessionError;
    use tabbridge::types::tab::TabsSnapshot;

    fn section(name: &str) {
        println!("---------------------------------------------------------------");
        println!("  {}", name);
        println!("---------------------------------------------------------------");
    }

    fn print_tabs(snapshot: &TabsSnapshot) {
        for tab in &snapshot.tabs {
            println!(
                "  {} {:<28} {:<16} loading={} back={}",
                if tab.is_active { "*" } else { " " },
                tab.url,
                tab.title,
                tab.is_loading,
                tab.can_go_back
            );
        }
        println!();
    }

    /// Let the headless views answer before reading the snapshot.
    async fn settle(handle: &SessionHandle) -> TabsSnapshot {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.snapshot()
    }

    pub async fn run() -> Result<(), SessionError> {
        let (host_end, view_end) = channel::pair();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let bridge = ViewBridge::new(HeadlessFactory::new(), view_end.events, queue_delivery(notice_tx));
        let bridge_task = tokio::spawn(bridge.run(view_end.commands, notice_rx));

        let (host, handle) = SessionHost::new(TabManager::new(host_end.commands), host_end.events);
        let host_task = tokio::spawn(host.run());

        section("Open two tabs");
        let a = handle.create_tab(Some("example.com")).await?;
        let b = handle.create_background_tab(Some("https://rust-lang.org")).await?;
        print_tabs(&settle(&handle).await);

        section("Switch, then navigate the active tab");
        handle.switch_tab(&b.id).await?;
        handle.navigate_tab(&b.id, "crates.io").await?;
        print_tabs(&settle(&handle).await);

        section("Go back");
        handle.go_back(&b.id).await?;
        print_tabs(&settle(&handle).await);

        section("Close the active tab");
        handle.close_tab(&b.id).await?;
        print_tabs(&settle(&handle).await);

        section("Operations on a closed tab are no-ops");
        println!("  switch -> {}", handle.switch_tab(&b.id).await?);
        println!("  still active: {:?}", handle.active_tab().map(|t| t.id == a.id));
        println!();

        handle.shutdown();
        drop(handle);
        if let Ok(result) = host_task.await {
            let last = result?;
            println!("  host stopped with {} tab(s)", last.tabs.len());
        }
        let _ = bridge_task.await;
        Ok(())
    }
}
