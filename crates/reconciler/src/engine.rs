// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation engine: diff the desired graph against the observed one
//! and drive the backend to match.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use diagnostics::*;
use gateway::{AccessPointSpec, Deletion, EndpointCreation, LifecycleState, ResourceGateway};
use tokio::task::JoinSet;

use crate::probe::FleetTopology;
use crate::state::{CurrentState, DesiredState, FileSystemState};
use crate::teardown::teardown;
use crate::token::{AP_TOKEN_MARKER, FS_TOKEN_MARKER, encode};
use crate::wait::{
    PollProfile, wait_for_access_points_available, wait_for_file_system_available,
    wait_for_mount_endpoints_available,
};
use crate::{ReconcileError, Result};

// Root directory parameters for every created access point. The key, which
// is unique within its file system, doubles as the subdirectory name.
const AP_OWNER_UID: u32 = 0;
const AP_OWNER_GID: u32 = 0;
const AP_PERMISSIONS: &str = "775";

/// Drives the backend toward a desired state through the gateway, waiting
/// out the provisioning lifecycle with the configured poll profile.
pub struct Reconciler {
    gateway: Arc<dyn ResourceGateway>,
    poll: PollProfile,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn ResourceGateway>) -> Self {
        Self::with_poll_profile(gateway, PollProfile::default())
    }

    pub fn with_poll_profile(gateway: Arc<dyn ResourceGateway>, poll: PollProfile) -> Self {
        Reconciler { gateway, poll }
    }

    /// Converge the backend to `desired`, starting from the discovered
    /// `current` snapshot.
    ///
    /// Extraneous file systems are torn down first (a key being deleted and
    /// recreated in the same run is unsupported; that takes two runs), then
    /// retained file systems get their access-point diff applied, then every
    /// desired file system is provisioned/converged concurrently.
    pub async fn reconcile(
        &self,
        desired: &DesiredState,
        mut current: CurrentState,
        topology: &FleetTopology,
    ) -> Result<()> {
        self.prune_extraneous(desired, &mut current).await?;
        self.reconcile_retained_access_points(desired, &mut current)
            .await?;
        self.provision_all(desired, current, topology).await
    }

    /// Tear down every managed file system in `current`, concurrently.
    pub async fn teardown_all(&self, current: CurrentState) -> Result<()> {
        let mut units: JoinSet<Result<()>> = JoinSet::new();
        for (fs_key, fs) in current {
            let gateway = Arc::clone(&self.gateway);
            let drain = self.poll.endpoint_drain;
            units.spawn(async move {
                info!("tearing down file system for {fs_key}");
                teardown(gateway.as_ref(), &fs.file_system_id, drain).await
            });
        }
        join_all(units).await
    }

    /// Remove every file system present in the backend but absent from the
    /// desired graph. Sequential: pruning is infrequent.
    async fn prune_extraneous(
        &self,
        desired: &DesiredState,
        current: &mut CurrentState,
    ) -> Result<()> {
        let extraneous: Vec<String> = current
            .keys()
            .filter(|key| !desired.contains(key.as_str()))
            .cloned()
            .collect();

        for fs_key in extraneous {
            let Some(fs) = current.remove(&fs_key) else {
                continue;
            };
            info!("removing extraneous file system for {fs_key}");
            teardown(
                self.gateway.as_ref(),
                &fs.file_system_id,
                self.poll.endpoint_drain,
            )
            .await?;
        }
        Ok(())
    }

    /// Apply the access-point diff to file systems present in both graphs,
    /// recording newly created ids into the in-memory state.
    async fn reconcile_retained_access_points(
        &self,
        desired: &DesiredState,
        current: &mut CurrentState,
    ) -> Result<()> {
        let gateway = self.gateway.as_ref();

        for (fs_key, desired_aps) in desired.iter() {
            let Some(fs) = current.get_mut(fs_key) else {
                continue;
            };

            let extraneous: Vec<(String, String)> = fs
                .access_points
                .iter()
                .filter(|(ap_key, _)| !desired_aps.contains(ap_key.as_str()))
                .map(|(ap_key, ap_id)| (ap_key.clone(), ap_id.clone()))
                .collect();
            for (ap_key, ap_id) in extraneous {
                match gateway.delete_access_point(&ap_id).await? {
                    Deletion::Deleted => info!("removed access point {ap_id}"),
                    Deletion::NotFound => debug!("access point {ap_id} already gone"),
                }
                fs.access_points.remove(&ap_key);
            }

            for ap_key in desired_aps {
                if fs.access_points.contains_key(ap_key) {
                    continue;
                }
                let ap_id = create_access_point(gateway, &fs.file_system_id, ap_key).await?;
                fs.access_points.insert(ap_key.clone(), ap_id);
            }
        }
        Ok(())
    }

    /// Provision missing file systems and converge retained ones, one
    /// concurrent unit per desired key. Units are independent and
    /// unordered; each owns its file system's state entry outright, so no
    /// two units can ever touch the same entry. The first failing unit
    /// aborts the rest.
    async fn provision_all(
        &self,
        desired: &DesiredState,
        mut current: CurrentState,
        topology: &FleetTopology,
    ) -> Result<()> {
        let mut units: JoinSet<Result<()>> = JoinSet::new();

        for (fs_key, desired_aps) in desired.iter() {
            let unit = ProvisionUnit {
                gateway: Arc::clone(&self.gateway),
                poll: self.poll,
                topology: topology.clone(),
                fs_key: fs_key.clone(),
                desired_aps: desired_aps.clone(),
                existing: current.remove(fs_key),
            };
            units.spawn(unit.run());
        }

        join_all(units).await
    }
}

/// Await every unit; the first error wins and aborts the remainder (the
/// set cancels outstanding tasks on drop).
async fn join_all(mut units: JoinSet<Result<()>>) -> Result<()> {
    while let Some(joined) = units.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(join_error) => return Err(ReconcileError::TaskFailed(join_error.to_string())),
        }
    }
    Ok(())
}

/// One unit of provisioning work: a single desired file system carried from
/// whatever state discovery found it in to fully available.
struct ProvisionUnit {
    gateway: Arc<dyn ResourceGateway>,
    poll: PollProfile,
    topology: FleetTopology,
    fs_key: String,
    desired_aps: BTreeSet<String>,
    existing: Option<FileSystemState>,
}

impl ProvisionUnit {
    async fn run(mut self) -> Result<()> {
        let gateway = self.gateway.as_ref();
        let fs_key = &self.fs_key;

        let mut fs = match self.existing.take() {
            Some(fs) => fs,
            None => {
                info!("creating file system for {fs_key}");
                let creation_token = encode(FS_TOKEN_MARKER, fs_key);
                let file_system_id = gateway
                    .create_file_system(
                        &creation_token,
                        true,
                        std::slice::from_ref(&self.topology.ownership_tag),
                    )
                    .await?;
                info!("created file system {file_system_id}");
                FileSystemState {
                    file_system_id,
                    last_life_cycle_state: LifecycleState::Creating,
                    access_points: BTreeMap::new(),
                }
            }
        };

        wait_for_file_system_available(gateway, &fs.file_system_id, self.poll.file_system).await?;

        self.ensure_mount_endpoints(&fs.file_system_id).await?;

        for ap_key in &self.desired_aps {
            if fs.access_points.contains_key(ap_key) {
                continue;
            }
            let ap_id = create_access_point(gateway, &fs.file_system_id, ap_key).await?;
            fs.access_points.insert(ap_key.clone(), ap_id);
        }
        wait_for_access_points_available(gateway, &fs.file_system_id, self.poll.access_points)
            .await
    }

    /// Ensure one mount endpoint per distinct fleet subnet, then wait for
    /// all of them to settle. A create racing an endpoint that already
    /// exists for the subnet is success, not an error.
    async fn ensure_mount_endpoints(&self, file_system_id: &str) -> Result<()> {
        info!("ensuring mount endpoints for {file_system_id}");

        let mut creates: JoinSet<Result<()>> = JoinSet::new();
        for subnet_id in &self.topology.subnet_ids {
            let gateway = Arc::clone(&self.gateway);
            let file_system_id = file_system_id.to_string();
            let subnet_id = subnet_id.clone();
            let security_group_id = self.topology.security_group_id.clone();
            creates.spawn(async move {
                match gateway
                    .create_mount_endpoint(&file_system_id, &subnet_id, &security_group_id)
                    .await?
                {
                    EndpointCreation::Created(id) => {
                        info!("created mount endpoint {id}");
                    }
                    EndpointCreation::AlreadyExists => {
                        info!("mount endpoint already exists for subnet {subnet_id}");
                    }
                }
                Ok(())
            });
        }
        join_all(creates).await?;

        wait_for_mount_endpoints_available(
            self.gateway.as_ref(),
            file_system_id,
            self.poll.mount_endpoints,
        )
        .await
    }
}

async fn create_access_point(
    gateway: &dyn ResourceGateway,
    file_system_id: &str,
    ap_key: &str,
) -> Result<String> {
    info!("creating access point for {ap_key} on {file_system_id}");
    let spec = AccessPointSpec {
        sub_path: format!("/{ap_key}"),
        owner_uid: AP_OWNER_UID,
        owner_gid: AP_OWNER_GID,
        permissions: AP_PERMISSIONS.to_string(),
    };
    let client_token = encode(AP_TOKEN_MARKER, ap_key);
    let ap_id = gateway
        .create_access_point(&client_token, file_system_id, &spec)
        .await?;
    Ok(ap_id)
}
