mod common;

use common::*;
use deck_app::reconcile::{ConfigurationStatus, SyncAction, SyncState, reconcile_configuration};
use deck_app::reconcile_deployment;
use deck_core::{Configuration, Strategy};

const UPPER_A: &str = "0x00000000000000000000000000000000000000AA";

#[tokio::test]
async fn test_quarter_split_is_synced() {
    let source = FakeSource::default();
    source.set("default", &[(UPPER_A, QUARTER), (HOOK_B, "0")], 1);

    let dep = deployment();
    let status = reconcile_configuration(&source, &dep, "default", &quarter_split()).await;
    assert_eq!(
        status,
        ConfigurationStatus {
            is_deployed: true,
            is_matched: true
        }
    );
    assert_eq!(status.sync_state(), SyncState::Synced);
    assert_eq!(status.sync_state().action(), None);
}

#[tokio::test]
async fn test_changed_fallback_is_modified() {
    let source = FakeSource::default();
    source.set("default", &[(HOOK_A, QUARTER), (HOOK_B, "0")], 0);

    let status = reconcile_configuration(&source, &deployment(), "default", &quarter_split()).await;
    assert!(status.is_deployed);
    assert!(!status.is_matched);
    assert_eq!(status.sync_state().action(), Some(SyncAction::Redeploy));
}

#[tokio::test]
async fn test_nothing_on_chain_is_not_deployed() {
    let source = FakeSource::default();
    let status = reconcile_configuration(&source, &deployment(), "default", &quarter_split()).await;
    assert_eq!(status, ConfigurationStatus::NOT_DEPLOYED);
    assert_eq!(status.sync_state().action(), Some(SyncAction::Deploy));
}

#[tokio::test]
async fn test_misspelled_role_is_compared_literally() {
    let source = FakeSource::default();
    source.set("default", &[(HOOK_A, QUARTER), (HOOK_B, "0")], 1);

    let typo = Configuration {
        strategy: vec![
            Strategy::new("transferHok", QUARTER),
            Strategy::new("lockHook", "0"),
        ],
        fallback_idx: "1".into(),
        deployed: true,
    };
    let status = reconcile_configuration(&source, &deployment(), "default", &typo).await;
    assert!(status.is_deployed);
    assert!(!status.is_matched);
}

#[tokio::test]
async fn test_deployment_reads_every_configuration() {
    let source = FakeSource::default();
    source.set("default", &[(HOOK_A, QUARTER), (HOOK_B, "0")], 1);
    source.set("vip", &[(HOOK_A, QUARTER)], 0);
    source.fail("broken");

    let mut dep = deployment();
    for name in ["default", "vip", "broken", "fresh"] {
        dep.extra
            .configurations
            .insert(name.into(), quarter_split());
    }

    let statuses = reconcile_deployment(&source, &dep).await;
    assert_eq!(statuses.len(), 4);
    assert_eq!(statuses["default"].sync_state(), SyncState::Synced);
    assert_eq!(statuses["vip"].sync_state(), SyncState::Modified);
    // a failed read only affects its own configuration
    assert_eq!(statuses["broken"], ConfigurationStatus::NOT_DEPLOYED);
    assert_eq!(statuses["fresh"], ConfigurationStatus::NOT_DEPLOYED);
    assert_eq!(source.reads.lock().len(), 4);
}

#[tokio::test]
async fn test_missing_contract_reads_as_not_deployed() {
    let source = FakeSource::default();
    let mut dep = deployment();
    dep.roles.remove("contract");

    let status = reconcile_configuration(&source, &dep, "default", &quarter_split()).await;
    assert_eq!(status, ConfigurationStatus::NOT_DEPLOYED);
    assert!(source.reads.lock().is_empty());
}
