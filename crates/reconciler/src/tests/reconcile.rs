// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end engine behavior against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use gateway::ResourceGateway;

use super::support::{apply, desired, discover, fleet_gateway, probe, reconciler, worker};
use crate::ReconcileError;
use crate::wait::PollProfile;

#[tokio::test]
async fn test_convergence_from_empty_backend() {
    let gw = fleet_gateway(&["subnet-1", "subnet-2"]).await;
    let spec = desired(&[("fsA", &["ap1", "ap2"]), ("fsB", &[])]);

    apply(&gw, &spec).await.expect("reconcile");

    let current = discover(&gw).await.expect("discover");
    assert_eq!(current.len(), 2);

    let fs_a = current.get("fsA").expect("fsA");
    assert_eq!(
        fs_a.access_points.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        vec!["ap1", "ap2"]
    );
    let fs_b = current.get("fsB").expect("fsB");
    assert!(fs_b.access_points.is_empty());

    // One mount endpoint per distinct fleet subnet, per file system
    assert_eq!(gw.mount_endpoint_count(&fs_a.file_system_id).await, 2);
    assert_eq!(gw.mount_endpoint_count(&fs_b.file_system_id).await, 2);

    // Everything settled to available
    let listed = gw.list_file_systems().await.expect("list");
    assert!(listed.iter().all(|fs| fs.life_cycle_state.is_available()));

    let counts = gw.counts().await;
    assert_eq!(counts.file_systems_created, 2);
    assert_eq!(counts.access_points_created, 2);
    assert_eq!(counts.mount_endpoints_created, 4);
    assert_eq!(counts.file_systems_deleted, 0);
}

#[tokio::test]
async fn test_created_file_systems_carry_the_ownership_tag() {
    let gw = fleet_gateway(&["subnet-1"]).await;
    apply(&gw, &desired(&[("fsA", &[])])).await.expect("reconcile");

    let current = discover(&gw).await.expect("discover");
    let fs_a = current.get("fsA").expect("fsA");
    let tags = gw.file_system_tags(&fs_a.file_system_id).await;
    assert!(
        tags.iter()
            .any(|tag| tag.key == "kubernetes.io/cluster/test" && tag.value == "owned")
    );
    assert_eq!(
        gw.file_system_encrypted(&fs_a.file_system_id).await,
        Some(true)
    );
}

#[tokio::test]
async fn test_access_points_use_key_as_subdirectory() {
    let gw = fleet_gateway(&["subnet-1"]).await;
    apply(&gw, &desired(&[("fsA", &["logs"])]))
        .await
        .expect("reconcile");

    let current = discover(&gw).await.expect("discover");
    let fs_a = current.get("fsA").expect("fsA");
    let ap_id = fs_a.access_points.get("logs").expect("logs access point");
    let spec = gw.access_point_spec(ap_id).await.expect("spec");
    assert_eq!(spec.sub_path, "/logs");
    assert_eq!(spec.owner_uid, 0);
    assert_eq!(spec.owner_gid, 0);
    assert_eq!(spec.permissions, "775");
}

#[tokio::test]
async fn test_second_run_performs_zero_mutations() {
    let gw = fleet_gateway(&["subnet-1", "subnet-2"]).await;
    let spec = desired(&[("fsA", &["ap1", "ap2"]), ("fsB", &[])]);

    apply(&gw, &spec).await.expect("first run");
    let after_first = gw.counts().await;

    apply(&gw, &spec).await.expect("second run");
    let after_second = gw.counts().await;

    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_pruning_removes_only_extraneous_file_systems() {
    let gw = fleet_gateway(&["subnet-1"]).await;
    apply(&gw, &desired(&[("fsA", &["ap1"]), ("fsC", &["ap2"])]))
        .await
        .expect("first run");

    let before = discover(&gw).await.expect("discover");
    let fs_a_id = before.get("fsA").expect("fsA").file_system_id.clone();
    let fs_c_id = before.get("fsC").expect("fsC").file_system_id.clone();

    apply(&gw, &desired(&[("fsA", &["ap1"])]))
        .await
        .expect("second run");

    assert!(!gw.file_system_exists(&fs_c_id).await);
    assert_eq!(gw.mount_endpoint_count(&fs_c_id).await, 0);

    let after = discover(&gw).await.expect("discover");
    assert_eq!(after.len(), 1);
    assert_eq!(after.get("fsA").expect("fsA").file_system_id, fs_a_id);

    // fsA saw no churn: the only mutations in the second run were fsC's
    // endpoint and file system deletes (fsC's access point dies with its
    // file system and is not counted as an explicit delete)
    let counts = gw.counts().await;
    assert_eq!(counts.file_systems_created, 2);
    assert_eq!(counts.access_points_created, 2);
    assert_eq!(counts.mount_endpoints_created, 2);
    assert_eq!(counts.file_systems_deleted, 1);
    assert_eq!(counts.mount_endpoints_deleted, 1);
    assert_eq!(counts.access_points_deleted, 0);
}

#[tokio::test]
async fn test_access_point_diff_preserves_retained_points() {
    let gw = fleet_gateway(&["subnet-1"]).await;
    apply(&gw, &desired(&[("fsA", &["ap1", "ap2"])]))
        .await
        .expect("first run");

    let before = discover(&gw).await.expect("discover");
    let ap2_id = before
        .get("fsA")
        .expect("fsA")
        .access_points
        .get("ap2")
        .expect("ap2")
        .clone();

    apply(&gw, &desired(&[("fsA", &["ap2", "ap3"])]))
        .await
        .expect("second run");

    let after = discover(&gw).await.expect("discover");
    let fs_a = after.get("fsA").expect("fsA");
    assert_eq!(
        fs_a.access_points.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        vec!["ap2", "ap3"]
    );
    // ap2 was neither deleted nor recreated
    assert_eq!(fs_a.access_points.get("ap2").expect("ap2"), &ap2_id);

    let counts = gw.counts().await;
    assert_eq!(counts.access_points_created, 3);
    assert_eq!(counts.access_points_deleted, 1);
}

#[tokio::test]
async fn test_endpoints_deduplicate_by_subnet() {
    // Two workers share subnet-1; a third sits in subnet-2
    let gw = fleet_gateway(&["subnet-1", "subnet-1", "subnet-2"]).await;

    apply(&gw, &desired(&[("fsA", &[])])).await.expect("reconcile");

    let current = discover(&gw).await.expect("discover");
    let fs_a = current.get("fsA").expect("fsA");
    assert_eq!(gw.mount_endpoint_count(&fs_a.file_system_id).await, 2);
    assert_eq!(gw.counts().await.mount_endpoints_created, 2);
}

#[tokio::test]
async fn test_stuck_backend_surfaces_wait_timeout() {
    let gw = gateway::MemoryGateway::with_settle_after(10_000);
    gw.add_fleet_instance(worker(0, "subnet-1")).await;

    let topology = probe(&gw).await.expect("probe");
    let current = discover(&gw).await.expect("discover");
    let engine = crate::engine::Reconciler::with_poll_profile(
        Arc::new(gw.clone()),
        PollProfile::uniform(Duration::from_millis(1), 3),
    );

    let err = engine
        .reconcile(&desired(&[("fsA", &[])]), current, &topology)
        .await
        .expect_err("must time out");
    assert!(matches!(err, ReconcileError::WaitTimeout { .. }));
}

#[tokio::test]
async fn test_reconcile_with_empty_desired_state_tears_everything_down() {
    let gw = fleet_gateway(&["subnet-1"]).await;
    apply(&gw, &desired(&[("fsA", &["ap1"]), ("fsB", &[])]))
        .await
        .expect("first run");

    apply(&gw, &desired(&[])).await.expect("second run");

    let current = discover(&gw).await.expect("discover");
    assert!(current.is_empty());
    let counts = gw.counts().await;
    assert_eq!(counts.file_systems_deleted, 2);
}

#[tokio::test]
async fn test_reconciler_uses_default_profile() {
    // Construction only; a default-profile run would sleep for real seconds
    let gw = fleet_gateway(&["subnet-1"]).await;
    let _ = reconciler(&gw);
    let _ = crate::engine::Reconciler::new(Arc::new(gw));
}
