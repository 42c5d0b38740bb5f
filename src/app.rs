//! Application core.
//!
//! Holds settings and the session store, builds the host side from them,
//! and restores or persists the tab session around a run.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::channel::{CommandSender, EventReceiver};
use crate::database::connection::Database;
use crate::managers::session_host::{SessionHandle, SessionHost};
use crate::managers::session_store::{session_from_snapshot, SessionStore, SessionStoreTrait};
use crate::managers::tab_manager::TabManager;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::AppError;
use crate::types::settings::BridgeSettings;
use crate::types::tab::TabsSnapshot;

pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub session_store: SessionStore,
}

impl App {
    /// Open the session database at `db_path` and load settings.
    ///
    /// A malformed settings file is logged and replaced by defaults rather
    /// than preventing startup.
    pub fn new<P: AsRef<Path>>(db_path: P, settings_path: Option<String>) -> Result<Self, AppError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let db = Arc::new(Database::open(db_path)?);
        Ok(Self::with_database(db, settings_path))
    }

    pub fn with_database(db: Arc<Database>, settings_path: Option<String>) -> Self {
        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            warn!(error = %e, "settings load failed, using defaults");
        }
        let session_store = SessionStore::new(db.clone());
        Self {
            db,
            settings_engine,
            session_store,
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        self.settings_engine.get_settings()
    }

    /// A tab manager configured from settings, talking to `commands`.
    pub fn tab_manager(&self, commands: CommandSender) -> TabManager {
        let general = &self.settings().general;
        TabManager::new(commands)
            .with_policy(general.activation_policy)
            .with_default_url(&general.default_url)
    }

    /// Build the host loop and its handle; the caller spawns `run()`.
    pub fn session_host(&self, commands: CommandSender, events: EventReceiver) -> (SessionHost, SessionHandle) {
        SessionHost::new(self.tab_manager(commands), events)
    }

    /// Recreate the saved session through `handle`, or open one default tab
    /// when there is nothing to restore. Returns the number of tabs opened.
    pub async fn restore_into(&self, handle: &SessionHandle) -> Result<usize, AppError> {
        let saved = if self.settings().general.restore_session {
            self.session_store.restore_session()?
        } else {
            None
        };
        let saved = saved.filter(|s| !s.tabs.is_empty());
        let Some(session) = saved else {
            handle.create_tab(None).await?;
            return Ok(1);
        };

        let mut ids = Vec::with_capacity(session.tabs.len());
        for tab in &session.tabs {
            ids.push(handle.create_background_tab(Some(&tab.url)).await?.id);
        }
        if let Some(id) = session.active_index.and_then(|i| ids.get(i)) {
            handle.switch_tab(id).await?;
        }
        info!(tabs = ids.len(), "session restored");
        Ok(ids.len())
    }

    /// Save `snapshot` as the latest session.
    pub fn persist(&self, snapshot: &TabsSnapshot) -> Result<(), AppError> {
        self.session_store.save_session(&session_from_snapshot(snapshot))?;
        info!(tabs = snapshot.tabs.len(), "session saved");
        Ok(())
    }
}
