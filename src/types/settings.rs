use serde::{Deserialize, Serialize};

/// Top-level settings container, stored as `settings.json`. Missing
/// sections fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BridgeSettings {
    pub general: GeneralSettings,
    pub window: WindowSettings,
    pub logging: LoggingSettings,
    pub rpc: RpcSettings,
}

/// Tab session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    /// Address opened when a tab is created without one.
    pub default_url: String,
    pub activation_policy: ActivationPolicy,
    #[serde(default = "default_true")]
    pub restore_session: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            default_url: "about:blank".to_string(),
            activation_policy: ActivationPolicy::FirstRemaining,
            restore_session: true,
        }
    }
}

/// Which tab becomes active after the active one is closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// First remaining tab in insertion order.
    #[default]
    FirstRemaining,
    /// The remaining tab that was active most recently.
    MostRecentlyActive,
}

/// Main window settings (GUI only).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub devtools: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "TabBridge".to_string(),
            width: 1280.0,
            height: 800.0,
            devtools: cfg!(debug_assertions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "tabbridge=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcSettings {
    pub max_requests_per_second: u32,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            max_requests_per_second: 200,
        }
    }
}
