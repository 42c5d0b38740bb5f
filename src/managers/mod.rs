// Host-side state managers
// The tab session, its event loop and observers, and saved-session storage.

pub mod observers;
pub mod session_host;
pub mod session_store;
pub mod tab_manager;
