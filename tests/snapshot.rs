// Snapshot capture and restore round trips against a scripted test node.

mod common;

use common::{temp_dir, MockConnector, NodeState};
use flashloan_orchestrator::{errors::BotError, snapshot::SnapshotManager};
use std::fs;

#[tokio::test]
async fn capture_then_restore_reverts_to_the_stored_id() {
    let dir = temp_dir("snapshot");
    let manager = SnapshotManager::new(dir.join("nested").join("snapshot_id.txt"));
    let connector = MockConnector::new(NodeState::default());
    let client = connector.client("rpc-0");

    let snapshot = manager.capture(&client).await.unwrap();

    assert_eq!(snapshot.id, "0x1");
    assert_eq!(fs::read_to_string(manager.path()).unwrap(), "0x1");
    assert_eq!(manager.stored().map(|s| s.id), Some(snapshot.id.clone()));

    assert!(manager.restore(&client).await);
    assert!(connector.with_state(|s| s.snapshots.is_empty()));
}

#[tokio::test]
async fn recapture_overwrites_the_previous_id() {
    let dir = temp_dir("snapshot");
    let manager = SnapshotManager::new(dir.join("snapshot_id.txt"));
    let client = MockConnector::new(NodeState::default()).client("rpc-0");

    manager.capture(&client).await.unwrap();
    let second = manager.capture(&client).await.unwrap();

    assert_eq!(second.id, "0x2");
    assert_eq!(manager.stored().unwrap().id, "0x2");
}

#[tokio::test]
async fn restore_without_stored_snapshot_is_a_no_op() {
    let dir = temp_dir("snapshot");
    let path = dir.join("snapshot_id.txt");
    let manager = SnapshotManager::new(&path);
    let connector = MockConnector::new(NodeState::default());

    assert!(!manager.restore(&connector.client("rpc-0")).await);
    assert!(!path.exists());
    assert!(connector.with_state(|s| s.snapshots.is_empty()));
}

#[tokio::test]
async fn restore_of_consumed_snapshot_reports_false() {
    let dir = temp_dir("snapshot");
    let manager = SnapshotManager::new(dir.join("snapshot_id.txt"));
    let client = MockConnector::new(NodeState::default()).client("rpc-0");

    manager.capture(&client).await.unwrap();
    assert!(manager.restore(&client).await);
    // the node dropped the id on the first revert
    assert!(!manager.restore(&client).await);
    assert!(manager.path().exists());
}

#[tokio::test]
async fn restore_on_unreachable_node_reports_false() {
    let dir = temp_dir("snapshot");
    let manager = SnapshotManager::new(dir.join("snapshot_id.txt"));
    fs::write(manager.path(), "0x7\n").unwrap();
    let connector = MockConnector::new(NodeState {
        unreachable: ["rpc-0".to_string()].into_iter().collect(),
        ..Default::default()
    });

    assert_eq!(manager.stored().unwrap().id, "0x7");
    assert!(!manager.restore(&connector.client("rpc-0")).await);
}

#[tokio::test]
async fn capture_failure_is_a_snapshot_error() {
    let dir = temp_dir("snapshot");
    let manager = SnapshotManager::new(dir.join("snapshot_id.txt"));
    let connector = MockConnector::new(NodeState {
        unreachable: ["rpc-0".to_string()].into_iter().collect(),
        ..Default::default()
    });

    let err = manager.capture(&connector.client("rpc-0")).await.unwrap_err();

    assert!(matches!(err, BotError::Snapshot { .. }));
    assert!(!manager.path().exists());
}
