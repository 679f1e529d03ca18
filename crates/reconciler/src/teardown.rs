// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Teardown state machine for one file system.
//!
//! Mount endpoints must be fully drained before the backend accepts a file
//! system delete. Access points need no step of their own: the backend
//! destroys them together with their file system.

use diagnostics::*;
use gateway::{Deletion, ResourceGateway};

use crate::wait::{PollPolicy, poll_until};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TeardownPhase {
    EndpointsPresent,
    EndpointsDraining,
    EndpointsGone,
    FileSystemRemoving,
    Done,
}

/// Tear down a file system: request deletion of every mount endpoint, drain
/// them, then delete the file system itself. Already-absent resources are
/// idempotent no-ops.
pub async fn teardown(
    gateway: &dyn ResourceGateway,
    file_system_id: &str,
    drain: PollPolicy,
) -> Result<()> {
    let mut phase = TeardownPhase::EndpointsPresent;

    while phase != TeardownPhase::Done {
        phase = match phase {
            TeardownPhase::EndpointsPresent => {
                let endpoints = gateway.list_mount_endpoints(file_system_id).await?;
                if endpoints.is_empty() {
                    TeardownPhase::EndpointsGone
                } else {
                    for endpoint in &endpoints {
                        let id = &endpoint.mount_endpoint_id;
                        match gateway.delete_mount_endpoint(id).await? {
                            Deletion::Deleted => info!("deleting mount endpoint {id}"),
                            Deletion::NotFound => debug!("mount endpoint {id} already gone"),
                        }
                    }
                    TeardownPhase::EndpointsDraining
                }
            }
            TeardownPhase::EndpointsDraining => {
                // Endpoint teardown is slow in the backend; re-list on a
                // long fixed interval until the listing comes back empty.
                poll_until("mount endpoints drained", drain, || async move {
                    let remaining = gateway.list_mount_endpoints(file_system_id).await?;
                    if remaining.is_empty() {
                        return Ok(true);
                    }
                    let count = remaining.len();
                    debug!("waiting for {count} mount endpoints to drain");
                    Ok(false)
                })
                .await?;
                TeardownPhase::EndpointsGone
            }
            TeardownPhase::EndpointsGone => TeardownPhase::FileSystemRemoving,
            TeardownPhase::FileSystemRemoving => {
                match gateway.delete_file_system(file_system_id).await? {
                    Deletion::Deleted => info!("removed file system {file_system_id}"),
                    Deletion::NotFound => {
                        warn!("file system {file_system_id} already absent");
                    }
                }
                TeardownPhase::Done
            }
            TeardownPhase::Done => TeardownPhase::Done,
        };
    }

    Ok(())
}
