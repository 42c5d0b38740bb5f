use tabbridge::channel::{self, ViewEndpoint};
use tabbridge::managers::tab_manager::{TabManager, TabManagerTrait};
use tabbridge::types::messages::{ViewCommand, ViewEvent};
use tabbridge::types::settings::ActivationPolicy;

fn manager() -> (TabManager, ViewEndpoint) {
    let (host, view) = channel::pair();
    (TabManager::new(host.commands), view)
}

fn drain(view: &mut ViewEndpoint) -> Vec<ViewCommand> {
    let mut out = Vec::new();
    while let Ok(command) = view.commands.try_recv() {
        out.push(command);
    }
    out
}

#[test]
fn test_first_tab_is_active_even_in_background() {
    let (mut mgr, _view) = manager();
    let tab = mgr.create_tab(Some("https://a.test"), false);
    assert!(tab.is_active);
    assert_eq!(mgr.get_active_tab().unwrap().id, tab.id);
    assert!(mgr.check_invariants().is_ok());
}

#[test]
fn test_create_events_create_close_scenario() {
    let (mut mgr, _view) = manager();
    let a = mgr.create_tab(Some("https://a.test"), true);
    let state = mgr.snapshot();
    assert_eq!(state.tabs.len(), 1);
    assert_eq!(state.active_tab_id.as_deref(), Some(a.id.as_str()));
    assert!(state.tabs[0].is_loading);

    mgr.apply_event(ViewEvent::LoadingChanged {
        tab_id: a.id.clone(),
        is_loading: false,
    });
    mgr.apply_event(ViewEvent::NavigationStateChanged {
        tab_id: a.id.clone(),
        can_go_back: true,
        can_go_forward: false,
    });
    let current = mgr.get_tab(&a.id).unwrap();
    assert!(!current.is_loading);
    assert!(current.can_go_back);
    assert!(!current.can_go_forward);

    let b = mgr.create_tab(None, true);
    assert_eq!(mgr.tab_count(), 2);
    assert_eq!(mgr.get_active_tab().unwrap().id, b.id);
    assert!(!mgr.get_tab(&a.id).unwrap().is_active);

    assert!(mgr.close_tab(&b.id));
    assert_eq!(mgr.get_active_tab().unwrap().id, a.id);

    assert!(mgr.close_tab(&a.id));
    assert_eq!(mgr.tab_count(), 0);
    assert!(mgr.snapshot().active_tab_id.is_none());
}

#[test]
fn test_url_changed_for_unknown_tab_is_silent() {
    let (mut mgr, _view) = manager();
    mgr.create_tab(None, true);
    let mut updates = mgr.subscribe();
    updates.try_recv().unwrap();
    assert!(!mgr.apply_event(ViewEvent::UrlChanged {
        tab_id: "nobody".to_string(),
        url: "https://x".to_string(),
    }));
    assert!(updates.try_recv().is_err());
}

#[test]
fn test_create_tab_initial_state() {
    let (mut mgr, _view) = manager();
    let tab = mgr.create_tab(None, true);
    assert_eq!(tab.url, "about:blank");
    assert_eq!(tab.title, "New Tab");
    assert!(tab.is_loading);
    assert!(!tab.can_go_back);
    assert!(!tab.can_go_forward);
    assert_ne!(tab.id, tab.view_instance_id);
}

#[test]
fn test_create_tab_sends_create_then_show() {
    let (mut mgr, mut view) = manager();
    let tab = mgr.create_tab(Some("example.com"), true);
    assert_eq!(
        drain(&mut view),
        vec![
            ViewCommand::CreateView {
                tab_id: tab.id.clone(),
                instance_id: tab.view_instance_id.clone(),
                url: "https://example.com".to_string(),
            },
            ViewCommand::ShowView {
                instance_id: tab.view_instance_id.clone(),
            },
        ]
    );
}

#[test]
fn test_background_tab_is_not_shown() {
    let (mut mgr, mut view) = manager();
    let a = mgr.create_tab(None, true);
    drain(&mut view);
    let b = mgr.create_tab(Some("https://b.test"), false);
    assert!(!b.is_active);
    assert_eq!(mgr.get_active_tab().unwrap().id, a.id);
    let commands = drain(&mut view);
    assert_eq!(commands.len(), 1);
    assert!(matches!(commands[0], ViewCommand::CreateView { .. }));
}

#[test]
fn test_two_tabs_switch_and_close() {
    let (mut mgr, mut view) = manager();
    let a = mgr.create_tab(Some("https://a.test"), true);
    let b = mgr.create_tab(Some("https://b.test"), true);
    assert_eq!(mgr.get_active_tab().unwrap().id, b.id);

    assert!(mgr.switch_tab(&a.id));
    assert!(mgr.get_tab(&a.id).unwrap().is_active);
    assert!(!mgr.get_tab(&b.id).unwrap().is_active);
    drain(&mut view);

    assert!(mgr.close_tab(&a.id));
    assert_eq!(mgr.tab_count(), 1);
    assert_eq!(mgr.get_active_tab().unwrap().id, b.id);
    assert_eq!(
        drain(&mut view),
        vec![
            ViewCommand::RemoveView {
                instance_id: a.view_instance_id.clone(),
            },
            ViewCommand::ShowView {
                instance_id: b.view_instance_id.clone(),
            },
        ]
    );
    assert!(mgr.check_invariants().is_ok());
}

#[test]
fn test_closing_last_tab_leaves_empty_session() {
    let (mut mgr, _view) = manager();
    let a = mgr.create_tab(None, true);
    assert!(mgr.close_tab(&a.id));
    assert_eq!(mgr.tab_count(), 0);
    assert!(mgr.get_active_tab().is_none());
    assert!(mgr.snapshot().active_tab_id.is_none());
    assert!(mgr.check_invariants().is_ok());
}

#[test]
fn test_closing_inactive_tab_keeps_active() {
    let (mut mgr, _view) = manager();
    let a = mgr.create_tab(None, true);
    let b = mgr.create_tab(None, false);
    assert!(mgr.close_tab(&b.id));
    assert_eq!(mgr.get_active_tab().unwrap().id, a.id);
}

#[test]
fn test_unknown_ids_are_noops() {
    let (mut mgr, mut view) = manager();
    mgr.create_tab(None, true);
    drain(&mut view);
    let before = mgr.snapshot();

    assert!(!mgr.close_tab("missing"));
    assert!(!mgr.switch_tab("missing"));
    assert!(!mgr.navigate_tab("missing", "https://x.test"));
    assert!(!mgr.go_back("missing"));
    assert!(!mgr.go_forward("missing"));
    assert!(!mgr.reload_tab("missing"));

    assert_eq!(mgr.snapshot(), before);
    assert!(drain(&mut view).is_empty());
}

#[test]
fn test_operations_after_close_are_noops() {
    let (mut mgr, _view) = manager();
    let a = mgr.create_tab(None, true);
    let b = mgr.create_tab(None, false);
    mgr.close_tab(&b.id);
    assert!(!mgr.switch_tab(&b.id));
    assert!(!mgr.navigate_tab(&b.id, "https://late.test"));
    assert_eq!(mgr.get_active_tab().unwrap().id, a.id);
}

#[test]
fn test_navigate_normalizes_and_waits_for_view() {
    let (mut mgr, mut view) = manager();
    let tab = mgr.create_tab(Some("https://a.test"), true);
    mgr.apply_event(ViewEvent::LoadingChanged {
        tab_id: tab.id.clone(),
        is_loading: false,
    });
    drain(&mut view);

    assert!(mgr.navigate_tab(&tab.id, "  rust-lang.org  "));
    let current = mgr.get_tab(&tab.id).unwrap();
    assert!(current.is_loading);
    // The address changes only when the view reports it.
    assert_eq!(current.url, "https://a.test");
    assert_eq!(
        drain(&mut view),
        vec![ViewCommand::NavigateView {
            instance_id: tab.view_instance_id.clone(),
            url: "https://rust-lang.org".to_string(),
        }]
    );
}

#[test]
fn test_go_back_requires_history() {
    let (mut mgr, mut view) = manager();
    let tab = mgr.create_tab(None, true);
    drain(&mut view);

    assert!(!mgr.go_back(&tab.id));
    assert!(!mgr.go_forward(&tab.id));
    assert!(drain(&mut view).is_empty());

    mgr.apply_event(ViewEvent::NavigationStateChanged {
        tab_id: tab.id.clone(),
        can_go_back: true,
        can_go_forward: false,
    });
    assert!(mgr.go_back(&tab.id));
    assert!(!mgr.go_forward(&tab.id));
    assert_eq!(
        drain(&mut view),
        vec![ViewCommand::GoBackView {
            instance_id: tab.view_instance_id.clone(),
        }]
    );
}

#[test]
fn test_reload_sets_loading() {
    let (mut mgr, mut view) = manager();
    let tab = mgr.create_tab(None, true);
    mgr.apply_event(ViewEvent::LoadingChanged {
        tab_id: tab.id.clone(),
        is_loading: false,
    });
    drain(&mut view);
    assert!(mgr.reload_tab(&tab.id));
    assert!(mgr.get_tab(&tab.id).unwrap().is_loading);
    assert_eq!(
        drain(&mut view),
        vec![ViewCommand::ReloadView {
            instance_id: tab.view_instance_id.clone(),
        }]
    );
}

#[test]
fn test_view_events_update_fields() {
    let (mut mgr, _view) = manager();
    let tab = mgr.create_tab(None, true);
    let id = tab.id.clone();

    assert!(mgr.apply_event(ViewEvent::TitleUpdated {
        tab_id: id.clone(),
        title: "Example".to_string(),
    }));
    assert!(mgr.apply_event(ViewEvent::UrlChanged {
        tab_id: id.clone(),
        url: "https://example.com/".to_string(),
    }));
    assert!(mgr.apply_event(ViewEvent::LoadingChanged {
        tab_id: id.clone(),
        is_loading: false,
    }));

    let current = mgr.get_tab(&id).unwrap();
    assert_eq!(current.title, "Example");
    assert_eq!(current.url, "https://example.com/");
    assert!(!current.is_loading);
}

#[test]
fn test_event_for_closed_tab_is_ignored() {
    let (mut mgr, _view) = manager();
    let a = mgr.create_tab(None, true);
    let b = mgr.create_tab(None, false);
    mgr.close_tab(&b.id);
    let mut updates = mgr.subscribe();
    let _current = updates.try_recv().unwrap();

    assert!(!mgr.apply_event(ViewEvent::TitleUpdated {
        tab_id: b.id.clone(),
        title: "late".to_string(),
    }));
    assert!(updates.try_recv().is_err());
    assert_eq!(mgr.tab_count(), 1);
    assert_eq!(mgr.get_active_tab().unwrap().id, a.id);
}

#[test]
fn test_load_failed_changes_nothing() {
    let (mut mgr, _view) = manager();
    let tab = mgr.create_tab(None, true);
    let before = mgr.snapshot();
    assert!(!mgr.apply_event(ViewEvent::LoadFailed {
        tab_id: tab.id.clone(),
        url: "https://down.test".to_string(),
        code: -105,
        description: "name not resolved".to_string(),
    }));
    assert_eq!(mgr.snapshot(), before);
}

#[test]
fn test_popup_from_closed_tab_is_ignored() {
    let (mut mgr, mut view) = manager();
    let a = mgr.create_tab(Some("https://a.test"), true);
    let b = mgr.create_tab(Some("https://b.test"), true);
    assert!(mgr.close_tab(&b.id));
    drain(&mut view);
    let before = mgr.snapshot();
    let mut updates = mgr.subscribe();
    updates.try_recv().unwrap();

    assert!(!mgr.apply_event(ViewEvent::NewWindowRequested {
        tab_id: b.id.clone(),
        url: "https://popup.test".to_string(),
    }));
    assert_eq!(mgr.snapshot(), before);
    assert_eq!(mgr.get_active_tab().unwrap().id, a.id);
    assert!(updates.try_recv().is_err());
    assert!(drain(&mut view).is_empty());
}

#[test]
fn test_popup_opens_active_tab() {
    let (mut mgr, _view) = manager();
    let opener = mgr.create_tab(Some("https://a.test"), true);
    assert!(mgr.apply_event(ViewEvent::NewWindowRequested {
        tab_id: opener.id.clone(),
        url: "https://popup.test".to_string(),
    }));
    assert_eq!(mgr.tab_count(), 2);
    let active = mgr.get_active_tab().unwrap();
    assert_eq!(active.url, "https://popup.test");
    assert_ne!(active.id, opener.id);
}

#[test]
fn test_first_remaining_policy() {
    let (mut mgr, _view) = manager();
    let a = mgr.create_tab(None, true);
    let b = mgr.create_tab(None, false);
    let c = mgr.create_tab(None, false);
    mgr.switch_tab(&b.id);
    mgr.switch_tab(&c.id);
    mgr.close_tab(&c.id);
    assert_eq!(mgr.get_active_tab().unwrap().id, a.id);
}

#[test]
fn test_most_recently_active_policy() {
    let (host, _view) = channel::pair();
    let mut mgr = TabManager::new(host.commands).with_policy(ActivationPolicy::MostRecentlyActive);
    assert_eq!(mgr.policy(), ActivationPolicy::MostRecentlyActive);
    let _a = mgr.create_tab(None, true);
    let b = mgr.create_tab(None, false);
    let c = mgr.create_tab(None, false);
    mgr.switch_tab(&b.id);
    mgr.switch_tab(&c.id);
    mgr.close_tab(&c.id);
    assert_eq!(mgr.get_active_tab().unwrap().id, b.id);
}

#[test]
fn test_default_url_setting() {
    let (host, _view) = channel::pair();
    let mut mgr = TabManager::new(host.commands).with_default_url("start.test");
    assert_eq!(mgr.create_tab(None, true).url, "https://start.test");
}

#[test]
fn test_subscribe_gets_current_then_every_change() {
    let (mut mgr, _view) = manager();
    let a = mgr.create_tab(None, true);
    let mut updates = mgr.subscribe();

    let first = updates.try_recv().unwrap();
    assert_eq!(first.tabs.len(), 1);

    let b = mgr.create_tab(None, true);
    mgr.close_tab(&a.id);

    let after_create = updates.try_recv().unwrap();
    assert_eq!(after_create.tabs.len(), 2);
    assert_eq!(after_create.active_tab_id.as_deref(), Some(b.id.as_str()));
    let after_close = updates.try_recv().unwrap();
    assert_eq!(after_close.tabs.len(), 1);
    // Exactly one snapshot per operation.
    assert!(updates.try_recv().is_err());
}

#[test]
fn test_back_and_forward_do_not_broadcast() {
    let (mut mgr, _view) = manager();
    let tab = mgr.create_tab(None, true);
    mgr.apply_event(ViewEvent::NavigationStateChanged {
        tab_id: tab.id.clone(),
        can_go_back: true,
        can_go_forward: true,
    });
    let mut updates = mgr.subscribe();
    updates.try_recv().unwrap();
    mgr.go_back(&tab.id);
    mgr.go_forward(&tab.id);
    assert!(updates.try_recv().is_err());
}

#[test]
fn test_active_instance_follows_switch() {
    let (mut mgr, _view) = manager();
    assert!(mgr.active_instance().is_none());
    let a = mgr.create_tab(None, true);
    let b = mgr.create_tab(None, false);
    assert_eq!(mgr.active_instance().unwrap().instance_id, a.view_instance_id);
    mgr.switch_tab(&b.id);
    let active = mgr.active_instance().unwrap();
    assert_eq!(active.tab_id, b.id);
    assert_eq!(active.instance_id, b.view_instance_id);
}

#[test]
fn test_reconcile_view_loss_issues_fresh_instances() {
    let (mut mgr, mut view) = manager();
    let a = mgr.create_tab(Some("https://a.test"), true);
    let b = mgr.create_tab(Some("https://b.test"), false);
    drain(&mut view);

    assert_eq!(mgr.reconcile_view_loss(), 2);
    let new_a = mgr.get_tab(&a.id).unwrap().clone();
    let new_b = mgr.get_tab(&b.id).unwrap().clone();
    assert_ne!(new_a.view_instance_id, a.view_instance_id);
    assert_ne!(new_b.view_instance_id, b.view_instance_id);
    assert!(new_a.is_active);

    let commands = drain(&mut view);
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands[2],
        ViewCommand::ShowView {
            instance_id: new_a.view_instance_id.clone(),
        }
    );
    assert!(mgr.check_invariants().is_ok());
}

#[test]
fn test_dead_view_side_does_not_block_operations() {
    let (host, view) = channel::pair();
    drop(view);
    let mut mgr = TabManager::new(host.commands);
    let a = mgr.create_tab(None, true);
    assert!(mgr.navigate_tab(&a.id, "https://x.test"));
    assert!(mgr.close_tab(&a.id));
    assert_eq!(mgr.tab_count(), 0);
}
