// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Teardown state machine behavior.

use std::time::Duration;

use gateway::{MemoryGateway, ResourceGateway};

use super::support::{apply, desired, discover, fleet_gateway, reconciler, worker};
use crate::teardown::teardown;
use crate::token::{FS_TOKEN_MARKER, encode};
use crate::wait::PollPolicy;

fn drain_policy() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(2), 64)
}

#[tokio::test]
async fn test_teardown_drains_endpoints_before_removing_file_system() {
    let gw = fleet_gateway(&["subnet-1", "subnet-2"]).await;
    apply(&gw, &desired(&[("fsA", &["ap1"])])).await.expect("apply");

    let current = discover(&gw).await.expect("discover");
    let fs_id = current.get("fsA").expect("fsA").file_system_id.clone();
    assert_eq!(gw.mount_endpoint_count(&fs_id).await, 2);

    // The in-memory backend rejects file system deletes while endpoints
    // remain attached, so success here proves the drain ordering.
    teardown(&gw, &fs_id, drain_policy()).await.expect("teardown");

    assert!(!gw.file_system_exists(&fs_id).await);
    assert_eq!(gw.mount_endpoint_count(&fs_id).await, 0);
    let counts = gw.counts().await;
    assert_eq!(counts.mount_endpoints_deleted, 2);
    assert_eq!(counts.file_systems_deleted, 1);
}

#[tokio::test]
async fn test_teardown_without_endpoints_skips_the_drain() {
    let gw = MemoryGateway::new();
    let fs_id = gw
        .create_file_system(&encode(FS_TOKEN_MARKER, "fsA"), true, &[])
        .await
        .expect("create");

    teardown(&gw, &fs_id, drain_policy()).await.expect("teardown");

    assert!(!gw.file_system_exists(&fs_id).await);
    assert_eq!(gw.counts().await.mount_endpoints_deleted, 0);
}

#[tokio::test]
async fn test_teardown_of_absent_file_system_is_a_no_op() {
    let gw = MemoryGateway::new();

    teardown(&gw, "fs-00000000", drain_policy())
        .await
        .expect("teardown");

    assert_eq!(gw.counts().await.file_systems_deleted, 0);
}

#[tokio::test]
async fn test_teardown_all_removes_every_managed_file_system() {
    let gw = fleet_gateway(&["subnet-1"]).await;
    apply(&gw, &desired(&[("fsA", &["ap1"]), ("fsB", &[]), ("fsC", &["ap2", "ap3"])]))
        .await
        .expect("apply");

    let current = discover(&gw).await.expect("discover");
    assert_eq!(current.len(), 3);

    reconciler(&gw)
        .teardown_all(current)
        .await
        .expect("teardown all");

    let remaining = discover(&gw).await.expect("discover");
    assert!(remaining.is_empty());
    assert_eq!(gw.counts().await.file_systems_deleted, 3);
}

#[tokio::test]
async fn test_teardown_all_leaves_unmanaged_file_systems_alone() {
    let gw = MemoryGateway::new();
    gw.add_fleet_instance(worker(0, "subnet-1")).await;
    let foreign = gw
        .create_file_system("some-other-tool:fsX", true, &[])
        .await
        .expect("create");
    apply(&gw, &desired(&[("fsA", &[])])).await.expect("apply");

    let current = discover(&gw).await.expect("discover");
    reconciler(&gw)
        .teardown_all(current)
        .await
        .expect("teardown all");

    assert!(gw.file_system_exists(&foreign).await);
}
