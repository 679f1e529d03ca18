// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation core for managed network file systems.
//!
//! Converges a resource-providing backend to a declared desired state:
//! discovers managed resources by their identity tokens, diffs desired
//! against observed graphs, and drives creation/deletion through the
//! gateway, polling out the backend's asynchronous provisioning lifecycle.

use thiserror::Error;

use gateway::GatewayError;

pub mod discover;
pub mod engine;
pub mod probe;
pub mod state;
pub mod teardown;
pub mod token;
pub mod wait;

#[cfg(test)]
mod tests;

pub use discover::discover;
pub use engine::Reconciler;
pub use probe::{FleetTopology, probe};
pub use state::{CurrentState, DesiredState, FileSystemState};
pub use wait::{PollPolicy, PollProfile};

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("no fleet instances match role filter {role_filter:?}")]
    NoFleetInstances { role_filter: String },

    #[error("fleet instance {instance_id} reports no security group")]
    MissingSecurityGroup { instance_id: String },

    #[error("no subnets found on fleet instances")]
    NoSubnets,

    #[error("no fleet instance carries a tag valued {expected:?}")]
    MissingOwnershipTag { expected: String },

    #[error("expected exactly one file system with id {file_system_id}, found {count}")]
    FileSystemLookup {
        file_system_id: String,
        count: usize,
    },

    #[error("timed out waiting for {waited_for} after {attempts} attempts")]
    WaitTimeout { waited_for: String, attempts: u32 },

    #[error("provisioning task failed: {0}")]
    TaskFailed(String),
}
