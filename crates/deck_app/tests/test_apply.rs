mod common;

use common::*;
use deck_admin::RelayAction;
use deck_app::reconcile::SyncState;
use deck_app::{BusyFlags, ConfigurationDeployer};
use deck_core::{DeckError, user_message};

#[tokio::test]
async fn test_apply_relays_resolved_strategy() {
    let api = FakeAdmin::with_app(app_with_deployment());
    let watcher = FakeWatcher::success();
    let flags = BusyFlags::new();
    let source = FakeSource::default();
    source.set("default", &[(HOOK_A, QUARTER), (HOOK_B, "0")], 1);

    let mut store = loaded_store(&api, "drop").await;
    let report = ConfigurationDeployer::new(tx(&api, &watcher, &flags), &source)
        .apply(&mut store, "base", "default")
        .await
        .unwrap();

    assert_eq!(report.outcome.tx_hash, "0xtx1");
    assert!(report.warnings.is_empty());
    assert_eq!(report.statuses["default"].sync_state(), SyncState::Synced);

    let relayed = api.relayed.lock();
    let (action, body) = &relayed[0];
    assert_eq!(*action, RelayAction::DistributorSetHook);
    assert_eq!(body["appId"], "drop");
    assert_eq!(body["deployment"], "base");
    assert_eq!(body["projectAdmin"], ADMIN);
    assert_eq!(body["hookName"], "default");
    assert_eq!(body["fallbackIdx"], "1");
    assert_eq!(body["strategy"][0]["hook"], HOOK_A);
    assert_eq!(body["strategy"][0]["proportion"], QUARTER);
    assert_eq!(body["strategy"][1]["hook"], HOOK_B);

    let saved = api.stored("drop").unwrap();
    assert!(saved.deployments["base"].extra.configurations["default"].deployed);
    assert!(!flags.is_busy("apply:drop/base/default"));
}

#[tokio::test]
async fn test_apply_reports_proportion_warning() {
    let mut app = app_with_deployment();
    app.deployments
        .get_mut("base")
        .unwrap()
        .extra
        .configurations
        .get_mut("default")
        .unwrap()
        .fallback_idx = "0".into();
    let api = FakeAdmin::with_app(app);
    let watcher = FakeWatcher::success();
    let flags = BusyFlags::new();
    let source = FakeSource::default();

    let mut store = loaded_store(&api, "drop").await;
    let report = ConfigurationDeployer::new(tx(&api, &watcher, &flags), &source)
        .apply(&mut store, "base", "default")
        .await
        .unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("sum to 0"));
}

#[tokio::test]
async fn test_invalid_configuration_makes_no_calls() {
    let mut app = app_with_deployment();
    app.deployments
        .get_mut("base")
        .unwrap()
        .extra
        .configurations
        .get_mut("default")
        .unwrap()
        .fallback_idx = "7".into();
    let api = FakeAdmin::with_app(app);
    let watcher = FakeWatcher::success();
    let flags = BusyFlags::new();
    let source = FakeSource::default();

    let mut store = loaded_store(&api, "drop").await;
    let before = api.calls().len();
    let err = ConfigurationDeployer::new(tx(&api, &watcher, &flags), &source)
        .apply(&mut store, "base", "default")
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<DeckError>(), Some(DeckError::Validation(_))));
    assert_eq!(api.calls().len(), before);
    assert!(source.reads.lock().is_empty());
}

#[tokio::test]
async fn test_busy_action_is_rejected() {
    let api = FakeAdmin::with_app(app_with_deployment());
    let watcher = FakeWatcher::success();
    let flags = BusyFlags::new();
    let source = FakeSource::default();

    let mut store = loaded_store(&api, "drop").await;
    let _held = flags.try_acquire("apply:drop/base/default").unwrap();
    let err = ConfigurationDeployer::new(tx(&api, &watcher, &flags), &source)
        .apply(&mut store, "base", "default")
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<DeckError>(),
        Some(&DeckError::Busy("apply:drop/base/default".into()))
    );
    assert!(api.relayed.lock().is_empty());
}

#[tokio::test]
async fn test_reverted_apply_leaves_configuration_undeployed() {
    let api = FakeAdmin::with_app(app_with_deployment());
    let watcher = FakeWatcher::reverting();
    let flags = BusyFlags::new();
    let source = FakeSource::default();

    let mut store = loaded_store(&api, "drop").await;
    let err = ConfigurationDeployer::new(tx(&api, &watcher, &flags), &source)
        .apply(&mut store, "base", "default")
        .await
        .unwrap_err();

    assert_eq!(user_message(&err), "Transaction reverted");
    let saved = api.stored("drop").unwrap();
    assert!(!saved.deployments["base"].extra.configurations["default"].deployed);
    assert!(!flags.is_busy("apply:drop/base/default"));
}

#[tokio::test]
async fn test_missing_project_admin_is_a_config_error() {
    let mut app = app_with_deployment();
    app.deployments.get_mut("base").unwrap().roles.remove("projectAdmin");
    let api = FakeAdmin::with_app(app);
    let watcher = FakeWatcher::success();
    let flags = BusyFlags::new();
    let source = FakeSource::default();

    let mut store = loaded_store(&api, "drop").await;
    let err = ConfigurationDeployer::new(tx(&api, &watcher, &flags), &source)
        .apply(&mut store, "base", "default")
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<DeckError>(), Some(DeckError::Config(_))));
    assert!(api.relayed.lock().is_empty());
}

#[tokio::test]
async fn test_failed_save_leaves_local_copy_unchanged() {
    let api = FakeAdmin::with_app(app_with_deployment());
    let watcher = FakeWatcher::success();
    let flags = BusyFlags::new();
    let source = FakeSource::default();

    let mut store = loaded_store(&api, "drop").await;
    let mut rx = store.subscribe();
    rx.borrow_and_update();
    api.fail_saves(true);

    let err = ConfigurationDeployer::new(tx(&api, &watcher, &flags), &source)
        .apply(&mut store, "base", "default")
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DeckError>(),
        Some(DeckError::Http { status: 500, .. })
    ));
    let local = store.current().unwrap();
    assert!(!local.deployments["base"].extra.configurations["default"].deployed);
    assert_eq!(local, &api.stored("drop").unwrap());
    assert!(!rx.has_changed().unwrap());
    assert!(source.reads.lock().is_empty());
}
