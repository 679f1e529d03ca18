// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Blocking poll primitives for the backend's asynchronous provisioning
//! lifecycle.
//!
//! Every wait re-queries the backend on a fixed interval until the observed
//! lifecycle reaches the terminal condition. Polls are bounded: exhausting
//! the attempt budget surfaces [`ReconcileError::WaitTimeout`] rather than
//! stalling the run forever.

use std::future::Future;
use std::time::Duration;

use diagnostics::*;
use gateway::ResourceGateway;

use crate::{ReconcileError, Result};

/// Fixed poll interval and attempt budget for one kind of wait.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        PollPolicy {
            interval,
            max_attempts,
        }
    }
}

/// The poll policies used across one reconciliation run. Defaults reflect
/// observed backend latency: file systems and access points settle within
/// seconds, mount endpoints take minutes.
#[derive(Debug, Clone, Copy)]
pub struct PollProfile {
    pub file_system: PollPolicy,
    pub access_points: PollPolicy,
    pub mount_endpoints: PollPolicy,
    pub endpoint_drain: PollPolicy,
}

impl Default for PollProfile {
    fn default() -> Self {
        PollProfile {
            file_system: PollPolicy::new(Duration::from_secs(1), 600),
            access_points: PollPolicy::new(Duration::from_secs(1), 600),
            mount_endpoints: PollPolicy::new(Duration::from_secs(6), 200),
            endpoint_drain: PollPolicy::new(Duration::from_secs(5), 240),
        }
    }
}

impl PollProfile {
    /// One policy for every wait; used by fast test profiles.
    pub fn uniform(interval: Duration, max_attempts: u32) -> Self {
        let policy = PollPolicy::new(interval, max_attempts);
        PollProfile {
            file_system: policy,
            access_points: policy,
            mount_endpoints: policy,
            endpoint_drain: policy,
        }
    }
}

/// Re-evaluate `check` on a fixed interval until it reports done, the
/// attempt budget runs out, or a backend read fails.
pub(crate) async fn poll_until<F, Fut>(
    waited_for: &str,
    policy: PollPolicy,
    mut check: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut attempts: u32 = 0;
    loop {
        if check().await? {
            return Ok(());
        }
        attempts += 1;
        if attempts >= policy.max_attempts {
            return Err(ReconcileError::WaitTimeout {
                waited_for: waited_for.to_string(),
                attempts,
            });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Block until the file system reports `available`.
///
/// The listing must contain the id exactly once; anything else means the
/// snapshot and the backend have diverged and the run must abort.
pub async fn wait_for_file_system_available(
    gateway: &dyn ResourceGateway,
    file_system_id: &str,
    policy: PollPolicy,
) -> Result<()> {
    poll_until("file system available", policy, || async move {
        let listed = gateway.list_file_systems().await?;
        let mut matching = listed
            .into_iter()
            .filter(|fs| fs.file_system_id == file_system_id);
        let Some(fs) = matching.next() else {
            return Err(ReconcileError::FileSystemLookup {
                file_system_id: file_system_id.to_string(),
                count: 0,
            });
        };
        if matching.next().is_some() {
            return Err(ReconcileError::FileSystemLookup {
                file_system_id: file_system_id.to_string(),
                count: 2,
            });
        }
        Ok(fs.life_cycle_state.is_available())
    })
    .await
}

/// Block until every access point under the file system reports `available`.
pub async fn wait_for_access_points_available(
    gateway: &dyn ResourceGateway,
    file_system_id: &str,
    policy: PollPolicy,
) -> Result<()> {
    poll_until("access points available", policy, || async move {
        let access_points = gateway.list_access_points(file_system_id).await?;
        match access_points
            .iter()
            .find(|ap| !ap.life_cycle_state.is_available())
        {
            Some(pending) => {
                let id = &pending.access_point_id;
                debug!("still waiting for access point {id}");
                Ok(false)
            }
            None => Ok(true),
        }
    })
    .await
}

/// Block until every mount endpoint under the file system reports
/// `available`.
pub async fn wait_for_mount_endpoints_available(
    gateway: &dyn ResourceGateway,
    file_system_id: &str,
    policy: PollPolicy,
) -> Result<()> {
    poll_until("mount endpoints available", policy, || async move {
        let endpoints = gateway.list_mount_endpoints(file_system_id).await?;
        match endpoints
            .iter()
            .find(|endpoint| !endpoint.life_cycle_state.is_available())
        {
            Some(pending) => {
                let id = &pending.mount_endpoint_id;
                debug!("still waiting for mount endpoint {id}");
                Ok(false)
            }
            None => Ok(true),
        }
    })
    .await
}
