//! RPC method handler for the tab session.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested. Each method maps
//! onto one `SessionHandle` call; unknown tab ids come back as `false`, not
//! as errors.

use serde_json::{json, Value};

use crate::managers::session_host::SessionHandle;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

/// Dispatch one method call. `Ok(Value)` is the `result` field of the reply,
/// `Err(String)` its `error` field.
pub async fn handle_method(handle: &SessionHandle, method: &str, params: &Value) -> Result<Value, String> {
    let err = |e: crate::types::errors::SessionError| e.to_string();
    match method {
        "tab.create" => {
            let url = params.get("url").and_then(|v| v.as_str());
            let background = params
                .get("background")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let tab = if background {
                handle.create_background_tab(url).await
            } else {
                handle.create_tab(url).await
            }
            .map_err(err)?;
            serde_json::to_value(tab).map_err(|e| e.to_string())
        }
        "tab.close" => {
            let id = str_param(params, "id")?;
            Ok(json!({ "success": handle.close_tab(id).await.map_err(err)? }))
        }
        "tab.switch" => {
            let id = str_param(params, "id")?;
            Ok(json!({ "success": handle.switch_tab(id).await.map_err(err)? }))
        }
        "tab.navigate" => {
            let id = str_param(params, "id")?;
            let url = str_param(params, "url")?;
            Ok(json!({ "success": handle.navigate_tab(id, url).await.map_err(err)? }))
        }
        "tab.goBack" => {
            let id = str_param(params, "id")?;
            Ok(json!({ "success": handle.go_back(id).await.map_err(err)? }))
        }
        "tab.goForward" => {
            let id = str_param(params, "id")?;
            Ok(json!({ "success": handle.go_forward(id).await.map_err(err)? }))
        }
        "tab.reload" => {
            let id = str_param(params, "id")?;
            Ok(json!({ "success": handle.reload_tab(id).await.map_err(err)? }))
        }
        "tab.list" => serde_json::to_value(handle.snapshot()).map_err(|e| e.to_string()),
        "tab.active" => serde_json::to_value(handle.active_tab()).map_err(|e| e.to_string()),
        _ => Err(format!("unknown method: {}", method)),
    }
}
