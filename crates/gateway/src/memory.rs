// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory gateway for tests.
//!
//! Simulates the backend's asynchronous provisioning lifecycle: newly
//! created resources report `creating` until they have been observed
//! `settle_after` times by a list call, then settle to `available`.
//! Mount endpoints likewise linger in `deleting` before disappearing.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::api::{AccessPointSpec, Deletion, EndpointCreation, IngressChange, ResourceGateway};
use crate::models::{
    AccessPointDescription, FileSystemDescription, FleetInstance, LifecycleState,
    MountEndpointDescription, Tag,
};
use crate::{GatewayError, GatewayResult};

/// Mutation totals, for asserting idempotency. Token-idempotent creates
/// that return an existing resource are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub file_systems_created: u64,
    pub file_systems_deleted: u64,
    pub access_points_created: u64,
    pub access_points_deleted: u64,
    pub mount_endpoints_created: u64,
    pub mount_endpoints_deleted: u64,
}

impl OperationCounts {
    pub fn total_mutations(&self) -> u64 {
        self.file_systems_created
            + self.file_systems_deleted
            + self.access_points_created
            + self.access_points_deleted
            + self.mount_endpoints_created
            + self.mount_endpoints_deleted
    }
}

#[derive(Debug, Clone)]
struct FileSystemRecord {
    creation_token: String,
    state: LifecycleState,
    observations: u32,
    encrypted: bool,
    tags: Vec<Tag>,
}

#[derive(Debug, Clone)]
struct AccessPointRecord {
    client_token: String,
    file_system_id: String,
    state: LifecycleState,
    observations: u32,
    spec: AccessPointSpec,
}

#[derive(Debug, Clone)]
struct MountEndpointRecord {
    file_system_id: String,
    subnet_id: String,
    state: LifecycleState,
    observations: u32,
}

#[derive(Default)]
struct MemoryState {
    file_systems: BTreeMap<String, FileSystemRecord>,
    access_points: BTreeMap<String, AccessPointRecord>,
    mount_endpoints: BTreeMap<String, MountEndpointRecord>,
    fleet: Vec<FleetInstance>,
    // security group id -> open ingress ports
    ingress_rules: BTreeMap<String, Vec<u16>>,
    next_id: u64,
    counts: OperationCounts,
}

/// In-memory implementation of [`ResourceGateway`].
#[derive(Clone)]
pub struct MemoryGateway {
    inner: Arc<Mutex<MemoryState>>,
    settle_after: u32,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Backend where resources settle on their first observation.
    pub fn new() -> Self {
        Self::with_settle_after(0)
    }

    /// Backend where resources stay `creating`/`deleting` until they have
    /// been listed `settle_after` times.
    pub fn with_settle_after(settle_after: u32) -> Self {
        MemoryGateway {
            inner: Arc::new(Mutex::new(MemoryState::default())),
            settle_after,
        }
    }

    pub async fn add_fleet_instance(&self, instance: FleetInstance) {
        self.inner.lock().await.fleet.push(instance);
    }

    pub async fn counts(&self) -> OperationCounts {
        self.inner.lock().await.counts
    }

    pub async fn ingress_ports(&self, security_group_id: &str) -> Vec<u16> {
        self.inner
            .lock()
            .await
            .ingress_rules
            .get(security_group_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of mount endpoints currently recorded for a file system,
    /// including ones still draining.
    pub async fn mount_endpoint_count(&self, file_system_id: &str) -> usize {
        self.inner
            .lock()
            .await
            .mount_endpoints
            .values()
            .filter(|e| e.file_system_id == file_system_id)
            .count()
    }

    pub async fn file_system_exists(&self, file_system_id: &str) -> bool {
        self.inner
            .lock()
            .await
            .file_systems
            .contains_key(file_system_id)
    }

    pub async fn file_system_tags(&self, file_system_id: &str) -> Vec<Tag> {
        self.inner
            .lock()
            .await
            .file_systems
            .get(file_system_id)
            .map(|r| r.tags.clone())
            .unwrap_or_default()
    }

    pub async fn access_point_spec(&self, access_point_id: &str) -> Option<AccessPointSpec> {
        self.inner
            .lock()
            .await
            .access_points
            .get(access_point_id)
            .map(|r| r.spec.clone())
    }

    pub async fn file_system_encrypted(&self, file_system_id: &str) -> Option<bool> {
        self.inner
            .lock()
            .await
            .file_systems
            .get(file_system_id)
            .map(|r| r.encrypted)
    }
}

impl MemoryState {
    fn assign_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:08x}", prefix, self.next_id)
    }

    fn age(state: &mut LifecycleState, observations: &mut u32, settle_after: u32) {
        *observations += 1;
        if *observations > settle_after && *state == LifecycleState::Creating {
            *state = LifecycleState::Available;
        }
    }
}

/// `*`-wildcard match, anchored at both ends.
fn wildcard_match(pattern: &str, value: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let mut rest = value;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(pos) => {
                // Without a leading '*' the first segment must anchor at 0
                if i == 0 && pos != 0 {
                    return false;
                }
                rest = &rest[pos + segment.len()..];
            }
            None => return false,
        }
    }
    // Without a trailing '*' the last segment must anchor at the end
    if let Some(last) = segments.last() {
        if !last.is_empty() && !pattern.ends_with('*') && !value.ends_with(last) {
            return false;
        }
    }
    true
}

#[async_trait]
impl ResourceGateway for MemoryGateway {
    async fn list_file_systems(&self) -> GatewayResult<Vec<FileSystemDescription>> {
        let mut inner = self.inner.lock().await;
        let settle_after = self.settle_after;
        let mut out = Vec::new();
        for (id, record) in inner.file_systems.iter_mut() {
            MemoryState::age(&mut record.state, &mut record.observations, settle_after);
            out.push(FileSystemDescription {
                file_system_id: id.clone(),
                creation_token: record.creation_token.clone(),
                life_cycle_state: record.state,
            });
        }
        Ok(out)
    }

    async fn create_file_system(
        &self,
        creation_token: &str,
        encrypted: bool,
        tags: &[Tag],
    ) -> GatewayResult<String> {
        let mut inner = self.inner.lock().await;
        // Creation tokens make retried creates idempotent
        if let Some((id, _)) = inner
            .file_systems
            .iter()
            .find(|(_, r)| r.creation_token == creation_token)
        {
            return Ok(id.clone());
        }
        let id = inner.assign_id("fs");
        inner.file_systems.insert(
            id.clone(),
            FileSystemRecord {
                creation_token: creation_token.to_string(),
                state: LifecycleState::Creating,
                observations: 0,
                encrypted,
                tags: tags.to_vec(),
            },
        );
        inner.counts.file_systems_created += 1;
        Ok(id)
    }

    async fn delete_file_system(&self, file_system_id: &str) -> GatewayResult<Deletion> {
        let mut inner = self.inner.lock().await;
        if !inner.file_systems.contains_key(file_system_id) {
            return Ok(Deletion::NotFound);
        }
        let attached = inner
            .mount_endpoints
            .values()
            .any(|e| e.file_system_id == file_system_id);
        if attached {
            return Err(GatewayError::Backend(format!(
                "file system {file_system_id} still has mount endpoints"
            )));
        }
        inner.file_systems.remove(file_system_id);
        // The backend destroys access points together with their file system
        inner
            .access_points
            .retain(|_, ap| ap.file_system_id != file_system_id);
        inner.counts.file_systems_deleted += 1;
        Ok(Deletion::Deleted)
    }

    async fn list_access_points(
        &self,
        file_system_id: &str,
    ) -> GatewayResult<Vec<AccessPointDescription>> {
        let mut inner = self.inner.lock().await;
        let settle_after = self.settle_after;
        let mut out = Vec::new();
        for (id, record) in inner.access_points.iter_mut() {
            if record.file_system_id != file_system_id {
                continue;
            }
            MemoryState::age(&mut record.state, &mut record.observations, settle_after);
            out.push(AccessPointDescription {
                access_point_id: id.clone(),
                client_token: record.client_token.clone(),
                file_system_id: record.file_system_id.clone(),
                life_cycle_state: record.state,
            });
        }
        Ok(out)
    }

    async fn create_access_point(
        &self,
        client_token: &str,
        file_system_id: &str,
        spec: &AccessPointSpec,
    ) -> GatewayResult<String> {
        let mut inner = self.inner.lock().await;
        if !inner.file_systems.contains_key(file_system_id) {
            return Err(GatewayError::Backend(format!(
                "no such file system: {file_system_id}"
            )));
        }
        if let Some((id, _)) = inner
            .access_points
            .iter()
            .find(|(_, r)| r.file_system_id == file_system_id && r.client_token == client_token)
        {
            return Ok(id.clone());
        }
        let id = inner.assign_id("fsap");
        inner.access_points.insert(
            id.clone(),
            AccessPointRecord {
                client_token: client_token.to_string(),
                file_system_id: file_system_id.to_string(),
                state: LifecycleState::Creating,
                observations: 0,
                spec: spec.clone(),
            },
        );
        inner.counts.access_points_created += 1;
        Ok(id)
    }

    async fn delete_access_point(&self, access_point_id: &str) -> GatewayResult<Deletion> {
        let mut inner = self.inner.lock().await;
        match inner.access_points.remove(access_point_id) {
            Some(_) => {
                inner.counts.access_points_deleted += 1;
                Ok(Deletion::Deleted)
            }
            None => Ok(Deletion::NotFound),
        }
    }

    async fn list_mount_endpoints(
        &self,
        file_system_id: &str,
    ) -> GatewayResult<Vec<MountEndpointDescription>> {
        let mut inner = self.inner.lock().await;
        let settle_after = self.settle_after;

        // Age draining endpoints, dropping the ones that finished
        let mut drained = Vec::new();
        for (id, record) in inner.mount_endpoints.iter_mut() {
            if record.file_system_id != file_system_id {
                continue;
            }
            if record.state == LifecycleState::Deleting {
                record.observations += 1;
                if record.observations > settle_after {
                    drained.push(id.clone());
                }
            }
        }
        for id in drained {
            inner.mount_endpoints.remove(&id);
        }

        let mut out = Vec::new();
        for (id, record) in inner.mount_endpoints.iter_mut() {
            if record.file_system_id != file_system_id {
                continue;
            }
            if record.state != LifecycleState::Deleting {
                MemoryState::age(&mut record.state, &mut record.observations, settle_after);
            }
            out.push(MountEndpointDescription {
                mount_endpoint_id: id.clone(),
                file_system_id: record.file_system_id.clone(),
                subnet_id: record.subnet_id.clone(),
                life_cycle_state: record.state,
            });
        }
        Ok(out)
    }

    async fn create_mount_endpoint(
        &self,
        file_system_id: &str,
        subnet_id: &str,
        _security_group_id: &str,
    ) -> GatewayResult<EndpointCreation> {
        let mut inner = self.inner.lock().await;
        if !inner.file_systems.contains_key(file_system_id) {
            return Err(GatewayError::Backend(format!(
                "no such file system: {file_system_id}"
            )));
        }
        let exists = inner
            .mount_endpoints
            .values()
            .any(|e| e.file_system_id == file_system_id && e.subnet_id == subnet_id);
        if exists {
            return Ok(EndpointCreation::AlreadyExists);
        }
        let id = inner.assign_id("fsmt");
        inner.mount_endpoints.insert(
            id.clone(),
            MountEndpointRecord {
                file_system_id: file_system_id.to_string(),
                subnet_id: subnet_id.to_string(),
                state: LifecycleState::Creating,
                observations: 0,
            },
        );
        inner.counts.mount_endpoints_created += 1;
        Ok(EndpointCreation::Created(id))
    }

    async fn delete_mount_endpoint(&self, mount_endpoint_id: &str) -> GatewayResult<Deletion> {
        let mut inner = self.inner.lock().await;
        match inner.mount_endpoints.get_mut(mount_endpoint_id) {
            Some(record) => {
                record.state = LifecycleState::Deleting;
                record.observations = 0;
                inner.counts.mount_endpoints_deleted += 1;
                Ok(Deletion::Deleted)
            }
            None => Ok(Deletion::NotFound),
        }
    }

    async fn describe_fleet_topology(
        &self,
        role_filter: &str,
    ) -> GatewayResult<Vec<FleetInstance>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .fleet
            .iter()
            .filter(|i| wildcard_match(role_filter, &i.instance_profile))
            .cloned()
            .collect())
    }

    async fn ensure_ingress_rule(
        &self,
        security_group_id: &str,
        port: u16,
        _protocol: &str,
    ) -> GatewayResult<IngressChange> {
        let mut inner = self.inner.lock().await;
        let ports = inner
            .ingress_rules
            .entry(security_group_id.to_string())
            .or_default();
        if ports.contains(&port) {
            return Ok(IngressChange::AlreadyPresent);
        }
        ports.push(port);
        Ok(IngressChange::Created)
    }
}
