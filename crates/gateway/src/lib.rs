// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Backend gateway capability interface for managed network file systems.
//!
//! The reconciler core talks to the resource-providing backend exclusively
//! through the [`ResourceGateway`] trait defined here. Two implementations
//! ship with the crate: [`HttpGateway`], a JSON/REST binding for a live
//! provider endpoint, and [`MemoryGateway`], an in-memory backend with
//! lifecycle latency simulation used by the test suites.

use thiserror::Error;

mod api;
mod http;
mod memory;
mod models;

pub use api::{AccessPointSpec, Deletion, EndpointCreation, IngressChange, ResourceGateway};
pub use http::HttpGateway;
pub use memory::{MemoryGateway, OperationCounts};
pub use models::{
    AccessPointDescription, FileSystemDescription, FleetInstance, LifecycleState,
    MountEndpointDescription, NetworkAttachment, Tag,
};

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status} for {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("backend error: {0}")]
    Backend(String),
}
