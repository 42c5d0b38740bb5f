//! TabBridge RPC Server: JSON-RPC over stdin/stdout for automation clients.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.create", "params":{"url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Broadcast: {"event":"tabs", "data":{"tabs":[...],"activeTabId":...}}
//!
//! The view side is a headless bridge in this process, reached only through
//! the message channel.

use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use tabbridge::app::App;
use tabbridge::bridge::{queue_delivery, HeadlessFactory, ViewBridge};
use tabbridge::channel::{self, encode_line};
use tabbridge::logging;
use tabbridge::rpc_handler::handle_method;
use tabbridge::services::settings_engine::default_data_dir;

/// Fixed-window rate limiter over all methods.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

#[tokio::main]
async fn main() {
    let db_path = match std::env::var("TABBRIDGE_DATA_DIR") {
        Ok(dir) => std::path::PathBuf::from(dir).join("sessions.db"),
        Err(_) => default_data_dir().join("sessions.db"),
    };
    let app = match App::new(&db_path, None) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("failed to start: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(&app.settings().logging.filter);

    let (host_end, view_end) = channel::pair();
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let bridge = ViewBridge::new(HeadlessFactory::new(), view_end.events, queue_delivery(notice_tx));
    let bridge_task = tokio::spawn(bridge.run(view_end.commands, notice_rx));

    let (host, handle) = app.session_host(host_end.commands, host_end.events);
    let host_task = tokio::spawn(host.run());

    // Single writer so replies and broadcasts never interleave mid-line.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                break;
            }
        }
    });

    if let Ok(mut updates) = handle.subscribe().await {
        let out = out_tx.clone();
        tokio::spawn(async move {
            while let Some(snapshot) = updates.recv().await {
                if let Ok(line) = encode_line(&json!({"event": "tabs", "data": snapshot})) {
                    let _ = out.send(line);
                }
            }
        });
    }

    if let Err(e) = app.restore_into(&handle).await {
        error!(error = %e, "session restore failed");
    }
    let _ = out_tx.send(json!({"event":"ready","version":env!("CARGO_PKG_VERSION")}).to_string());

    let mut rate_limiter = RateLimiter::new(app.settings().rpc.max_requests_per_second);
    let mut lines = BufReader::new(io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out_tx.send(json!({"id":null,"error":format!("parse error: {}",e)}).to_string());
                continue;
            }
        };
        let id = req.get("id").cloned().unwrap_or(Value::Null);
        if !rate_limiter.check() {
            let _ = out_tx.send(json!({"id": id, "error": "rate limit exceeded"}).to_string());
            continue;
        }
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&handle, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        let _ = out_tx.send(response.to_string());
    }

    let snapshot = handle.snapshot();
    handle.shutdown();
    drop(handle);
    match host_task.await {
        Ok(Ok(last)) => {
            if let Err(e) = app.persist(&last) {
                error!(error = %e, "session save failed");
            }
        }
        Ok(Err(e)) => {
            error!(error = %e, "host stopped on a fault; saving last broadcast state");
            let _ = app.persist(&snapshot);
        }
        Err(e) => error!(error = %e, "host task panicked"),
    }
    let _ = bridge_task.await;
    drop(out_tx);
    let _ = writer.await;
    info!("rpc server exiting");
}
