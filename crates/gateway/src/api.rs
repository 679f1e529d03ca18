// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The capability trait the reconciler core is written against.

use async_trait::async_trait;

use crate::models::{
    AccessPointDescription, FileSystemDescription, FleetInstance, MountEndpointDescription, Tag,
};
use crate::GatewayResult;

/// Outcome of a delete request. Deleting a resource that is already absent
/// is an idempotent no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    NotFound,
}

/// Outcome of a mount endpoint create. A create racing an existing endpoint
/// for the same subnet reports `AlreadyExists` rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointCreation {
    Created(String),
    AlreadyExists,
}

/// Outcome of an ingress-rule ensure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressChange {
    Created,
    AlreadyPresent,
}

/// Root directory parameters for a new access point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointSpec {
    pub sub_path: String,
    pub owner_uid: u32,
    pub owner_gid: u32,
    pub permissions: String,
}

/// Resource CRUD and topology queries exposed by the resource-providing
/// backend. The backend is the system of record for lifecycle states; the
/// reconciler never caches a state without re-querying.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    async fn list_file_systems(&self) -> GatewayResult<Vec<FileSystemDescription>>;

    /// Create a file system, returning its backend-assigned id. The creation
    /// token is echoed back on reads and makes retried creates idempotent.
    async fn create_file_system(
        &self,
        creation_token: &str,
        encrypted: bool,
        tags: &[Tag],
    ) -> GatewayResult<String>;

    async fn delete_file_system(&self, file_system_id: &str) -> GatewayResult<Deletion>;

    async fn list_access_points(
        &self,
        file_system_id: &str,
    ) -> GatewayResult<Vec<AccessPointDescription>>;

    async fn create_access_point(
        &self,
        client_token: &str,
        file_system_id: &str,
        spec: &AccessPointSpec,
    ) -> GatewayResult<String>;

    async fn delete_access_point(&self, access_point_id: &str) -> GatewayResult<Deletion>;

    async fn list_mount_endpoints(
        &self,
        file_system_id: &str,
    ) -> GatewayResult<Vec<MountEndpointDescription>>;

    async fn create_mount_endpoint(
        &self,
        file_system_id: &str,
        subnet_id: &str,
        security_group_id: &str,
    ) -> GatewayResult<EndpointCreation>;

    async fn delete_mount_endpoint(&self, mount_endpoint_id: &str) -> GatewayResult<Deletion>;

    /// List compute instances whose role profile matches `role_filter`
    /// (a `*`-wildcard pattern, applied by the backend).
    async fn describe_fleet_topology(&self, role_filter: &str)
        -> GatewayResult<Vec<FleetInstance>>;

    /// Ensure an inbound rule for `port`/`protocol` exists on the security
    /// group. Matching is by destination port; see the prober for the
    /// consequences.
    async fn ensure_ingress_rule(
        &self,
        security_group_id: &str,
        port: u16,
        protocol: &str,
    ) -> GatewayResult<IngressChange>;
}
