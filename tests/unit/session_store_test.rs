use std::sync::Arc;

use tabbridge::app::App;
use tabbridge::channel;
use tabbridge::database::Database;
use tabbridge::managers::session_store::{session_from_snapshot, SessionStore, SessionStoreTrait};
use tabbridge::types::session::{SessionData, SessionTab};
use tabbridge::types::tab::{Tab, TabsSnapshot};
use tempfile::TempDir;

fn store() -> SessionStore {
    SessionStore::new(Arc::new(Database::open_in_memory().unwrap()))
}

fn session(urls: &[&str], active_index: Option<usize>, timestamp: i64) -> SessionData {
    SessionData {
        tabs: urls
            .iter()
            .map(|u| SessionTab {
                url: u.to_string(),
                title: String::new(),
            })
            .collect(),
        active_index,
        timestamp,
    }
}

fn tab(id: &str, url: &str, active: bool) -> Tab {
    Tab {
        id: id.to_string(),
        view_instance_id: format!("{}-view", id),
        url: url.to_string(),
        title: url.to_string(),
        is_active: active,
        is_loading: false,
        can_go_back: false,
        can_go_forward: false,
    }
}

#[test]
fn test_empty_store_has_nothing_to_restore() {
    let store = store();
    assert!(!store.has_session());
    assert!(store.restore_session().unwrap().is_none());
}

#[test]
fn test_restore_returns_newest_session() {
    let store = store();
    store.save_session(&session(&["https://old.test"], Some(0), 100)).unwrap();
    store
        .save_session(&session(&["https://a.test", "https://b.test"], Some(1), 200))
        .unwrap();
    let restored = store.restore_session().unwrap().unwrap();
    assert_eq!(restored.tabs.len(), 2);
    assert_eq!(restored.active_index, Some(1));
}

#[test]
fn test_same_timestamp_prefers_last_saved() {
    let store = store();
    store.save_session(&session(&["https://first.test"], None, 5)).unwrap();
    store.save_session(&session(&["https://second.test"], None, 5)).unwrap();
    let restored = store.restore_session().unwrap().unwrap();
    assert_eq!(restored.tabs[0].url, "https://second.test");
}

#[test]
fn test_clear_session() {
    let store = store();
    store.save_session(&session(&["https://a.test"], Some(0), 1)).unwrap();
    assert!(store.has_session());
    store.clear_session().unwrap();
    assert!(!store.has_session());
    assert!(store.restore_session().unwrap().is_none());
}

#[test]
fn test_session_from_snapshot_keeps_order_and_active() {
    let snapshot = TabsSnapshot {
        tabs: vec![
            tab("a", "https://a.test", false),
            tab("b", "https://b.test", true),
        ],
        active_tab_id: Some("b".to_string()),
    };
    let data = session_from_snapshot(&snapshot);
    assert_eq!(data.tabs[0].url, "https://a.test");
    assert_eq!(data.tabs[1].url, "https://b.test");
    assert_eq!(data.active_index, Some(1));
    assert!(data.timestamp > 0);
}

#[test]
fn test_empty_snapshot_has_no_active_index() {
    let data = session_from_snapshot(&TabsSnapshot::default());
    assert!(data.tabs.is_empty());
    assert_eq!(data.active_index, None);
}

#[test]
fn test_session_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions.db");
    let settings = dir.path().join("settings.json").to_string_lossy().to_string();
    {
        let app = App::new(&path, Some(settings.clone())).unwrap();
        let snapshot = TabsSnapshot {
            tabs: vec![tab("a", "https://a.test", true)],
            active_tab_id: Some("a".to_string()),
        };
        app.persist(&snapshot).unwrap();
    }
    let app = App::new(&path, Some(settings)).unwrap();
    let restored = app.session_store.restore_session().unwrap().unwrap();
    assert_eq!(restored.tabs[0].url, "https://a.test");
    assert_eq!(restored.active_index, Some(0));
}

fn temp_app(dir: &TempDir) -> App {
    let settings = dir.path().join("settings.json").to_string_lossy().to_string();
    App::with_database(Arc::new(Database::open_in_memory().unwrap()), Some(settings))
}

#[tokio::test]
async fn test_restore_opens_default_tab_when_nothing_saved() {
    let dir = TempDir::new().unwrap();
    let app = temp_app(&dir);
    let (host_end, _view_end) = channel::pair();
    let (host, handle) = app.session_host(host_end.commands, host_end.events);
    tokio::spawn(host.run());

    assert_eq!(app.restore_into(&handle).await.unwrap(), 1);
    let tabs = handle.list_all();
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0].url, "about:blank");
}

#[tokio::test]
async fn test_restore_recreates_tabs_and_active_index() {
    let dir = TempDir::new().unwrap();
    let app = temp_app(&dir);
    app.session_store
        .save_session(&session(&["https://a.test", "https://b.test", "https://c.test"], Some(1), 10))
        .unwrap();

    let (host_end, _view_end) = channel::pair();
    let (host, handle) = app.session_host(host_end.commands, host_end.events);
    tokio::spawn(host.run());

    assert_eq!(app.restore_into(&handle).await.unwrap(), 3);
    let snapshot = handle.snapshot();
    let urls: Vec<&str> = snapshot.tabs.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(urls, ["https://a.test", "https://b.test", "https://c.test"]);
    assert_eq!(snapshot.active_tab().unwrap().url, "https://b.test");
    // Restored tabs are new tabs, not the saved records.
    assert!(snapshot.tabs.iter().all(|t| t.title == "New Tab"));
}
