// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures: an in-memory backend with a worker fleet and a poll
//! profile fast enough for tests.

use std::sync::Arc;
use std::time::Duration;

use gateway::{FleetInstance, MemoryGateway, NetworkAttachment, Tag};

use crate::engine::Reconciler;
use crate::probe::{self, FleetTopology};
use crate::state::{CurrentState, DesiredState};
use crate::wait::PollProfile;

pub const SECURITY_GROUP: &str = "sg-0b7d41c8";

pub fn worker(index: u32, subnet_id: &str) -> FleetInstance {
    FleetInstance {
        instance_id: format!("i-{index:08x}"),
        instance_profile: "deploy-worker-profile".to_string(),
        security_groups: vec![SECURITY_GROUP.to_string()],
        network_attachments: vec![NetworkAttachment {
            subnet_id: subnet_id.to_string(),
        }],
        tags: vec![
            Tag {
                key: "Name".to_string(),
                value: format!("worker-{index}"),
            },
            Tag {
                key: "kubernetes.io/cluster/test".to_string(),
                value: "owned".to_string(),
            },
        ],
    }
}

/// Backend with one worker instance per listed subnet. Resources need one
/// extra observation before settling, so the wait paths actually poll.
pub async fn fleet_gateway(subnets: &[&str]) -> MemoryGateway {
    let gw = MemoryGateway::with_settle_after(1);
    for (index, subnet) in subnets.iter().enumerate() {
        gw.add_fleet_instance(worker(index as u32, subnet)).await;
    }
    gw
}

pub fn fast_profile() -> PollProfile {
    PollProfile::uniform(Duration::from_millis(2), 64)
}

pub fn reconciler(gw: &MemoryGateway) -> Reconciler {
    Reconciler::with_poll_profile(Arc::new(gw.clone()), fast_profile())
}

pub fn desired(entries: &[(&str, &[&str])]) -> DesiredState {
    let mut state = DesiredState::new();
    for (fs_key, ap_keys) in entries {
        state.insert(*fs_key, ap_keys.iter().map(|key| key.to_string()));
    }
    state
}

pub async fn probe(gw: &MemoryGateway) -> crate::Result<FleetTopology> {
    probe::probe(gw, probe::WORKER_ROLE_FILTER).await
}

pub async fn discover(gw: &MemoryGateway) -> crate::Result<CurrentState> {
    crate::discover::discover(gw).await
}

/// Probe, discover, reconcile: one full apply run.
pub async fn apply(gw: &MemoryGateway, desired: &DesiredState) -> crate::Result<()> {
    let topology = probe(gw).await?;
    let current = discover(gw).await?;
    reconciler(gw).reconcile(desired, current, &topology).await
}
