// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Environment prober: derive shared infrastructure facts from the compute
//! fleet that will consume the file systems.

use std::collections::BTreeSet;

use diagnostics::*;
use gateway::{IngressChange, ResourceGateway, Tag};

use crate::{ReconcileError, Result};

/// Role-profile pattern selecting the fleet instances that mount the file
/// systems.
pub const WORKER_ROLE_FILTER: &str = "*-worker-*";

/// Tag value marking instances (and, by propagation, file systems) as owned
/// by this deployment.
pub const OWNERSHIP_TAG_VALUE: &str = "owned";

/// Well-known port of the file system protocol.
pub const NFS_PORT: u16 = 2049;

const NFS_PROTOCOL: &str = "tcp";

/// Shared infrastructure facts needed to provision new file systems.
#[derive(Debug, Clone)]
pub struct FleetTopology {
    /// Security group new mount endpoints attach to. Taken from the first
    /// matching instance; assumed uniform across the fleet.
    pub security_group_id: String,
    /// Distinct subnets across all matching instances' primary network
    /// attachments. One mount endpoint is ensured per entry.
    pub subnet_ids: BTreeSet<String>,
    /// Ownership tag propagated onto created file systems so they stay
    /// attributable.
    pub ownership_tag: Tag,
}

/// Derive the fleet topology and ensure the file-system protocol's ingress
/// rule exists on the fleet's security group.
///
/// There is no meaningful default topology: an empty fleet, a missing
/// security group, or a missing ownership tag is fatal before any mutation
/// is attempted.
pub async fn probe(gateway: &dyn ResourceGateway, role_filter: &str) -> Result<FleetTopology> {
    let instances = gateway.describe_fleet_topology(role_filter).await?;
    let Some(first) = instances.first() else {
        return Err(ReconcileError::NoFleetInstances {
            role_filter: role_filter.to_string(),
        });
    };

    // Assumed uniform across the fleet, so any instance will do
    let security_group_id = first.security_groups.first().cloned().ok_or_else(|| {
        ReconcileError::MissingSecurityGroup {
            instance_id: first.instance_id.clone(),
        }
    })?;

    let subnet_ids: BTreeSet<String> = instances
        .iter()
        .filter_map(|instance| instance.network_attachments.first())
        .map(|attachment| attachment.subnet_id.clone())
        .collect();
    if subnet_ids.is_empty() {
        return Err(ReconcileError::NoSubnets);
    }

    let ownership_tag = first
        .tags
        .iter()
        .find(|tag| tag.value == OWNERSHIP_TAG_VALUE)
        .cloned()
        .ok_or_else(|| ReconcileError::MissingOwnershipTag {
            expected: OWNERSHIP_TAG_VALUE.to_string(),
        })?;

    // The satisfied-check matches on destination port alone: a pre-existing
    // rule with a narrower source range counts as present.
    match gateway
        .ensure_ingress_rule(&security_group_id, NFS_PORT, NFS_PROTOCOL)
        .await?
    {
        IngressChange::Created => {
            info!("created NFS ingress rule on {security_group_id}");
        }
        IngressChange::AlreadyPresent => {
            info!("NFS ingress rule already exists; skipping");
        }
    }

    let subnets = subnet_ids.len();
    debug!("fleet topology: {subnets} subnets behind {security_group_id}");

    Ok(FleetTopology {
        security_group_id,
        subnet_ids,
        ownership_tag,
    })
}
