// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Wire models shared by every gateway implementation.

use serde::{Deserialize, Serialize};

/// Lifecycle field reported by the backend for every resource kind.
///
/// The backend may grow states we do not know about; those deserialize to
/// [`LifecycleState::Unknown`] and are treated as not-yet-terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Creating,
    Available,
    Updating,
    Deleting,
    Deleted,
    Error,
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    pub fn is_available(self) -> bool {
        matches!(self, LifecycleState::Available)
    }
}

/// Key/value tag attached to fleet instances and file systems.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// A managed network file system as described by the backend.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemDescription {
    pub file_system_id: String,
    pub creation_token: String,
    pub life_cycle_state: LifecycleState,
}

/// A named sub-directory access point under one file system.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccessPointDescription {
    pub access_point_id: String,
    pub client_token: String,
    pub file_system_id: String,
    pub life_cycle_state: LifecycleState,
}

/// A per-subnet network attachment point for one file system.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MountEndpointDescription {
    pub mount_endpoint_id: String,
    pub file_system_id: String,
    pub subnet_id: String,
    pub life_cycle_state: LifecycleState,
}

/// One network attachment of a fleet instance. The first entry is the
/// instance's primary attachment.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAttachment {
    pub subnet_id: String,
}

/// A compute instance as reported by the fleet topology query.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FleetInstance {
    pub instance_id: String,
    /// Role profile the instance runs under; topology queries filter on it.
    pub instance_profile: String,
    pub security_groups: Vec<String>,
    pub network_attachments: Vec<NetworkAttachment>,
    pub tags: Vec<Tag>,
}
