// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! JSON/REST binding of [`ResourceGateway`] for a live provider endpoint.

use std::time::Duration;

use async_trait::async_trait;
use diagnostics::*;
use serde_json::json;

use crate::api::{AccessPointSpec, Deletion, EndpointCreation, IngressChange, ResourceGateway};
use crate::models::{
    AccessPointDescription, FileSystemDescription, FleetInstance, MountEndpointDescription, Tag,
};
use crate::{GatewayError, GatewayResult};

const TIMEOUT_SECONDS: u64 = 60;

const STATUS_NOT_FOUND: u16 = 404;
const STATUS_CONFLICT: u16 = 409;

/// Async gateway client for a JSON/REST resource provider.
pub struct HttpGateway {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    /// Create a new client for the provider at `endpoint`, optionally
    /// authenticating with a bearer `token`.
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> GatewayResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECONDS))
            .build()?;

        let base_url = endpoint.into().trim_end_matches('/').to_string();

        Ok(HttpGateway {
            http_client,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_body(response: reqwest::Response, url: &str) -> GatewayResult<(u16, String)> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok((status, body))
    }

    fn decode<T>(url: &str, body: &str) -> GatewayResult<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        serde_json::from_str(body).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T>(&self, url: &str) -> GatewayResult<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        debug!("GET {url}");
        let response = self.request(self.http_client.get(url)).send().await?;
        let (status, body) = Self::read_body(response, url).await?;
        if !(200..300).contains(&status) {
            return Err(GatewayError::Api {
                status,
                url: url.to_string(),
                message: body,
            });
        }
        Self::decode(url, &body)
    }

    /// POST returning the decoded success body, or `None` when the backend
    /// answers 409 (resource already exists / rule already present).
    async fn post_json<T>(
        &self,
        url: &str,
        payload: serde_json::Value,
    ) -> GatewayResult<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        debug!("POST {url}");
        let response = self
            .request(self.http_client.post(url))
            .json(&payload)
            .send()
            .await?;
        let (status, body) = Self::read_body(response, url).await?;
        if status == STATUS_CONFLICT {
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            return Err(GatewayError::Api {
                status,
                url: url.to_string(),
                message: body,
            });
        }
        Ok(Some(Self::decode(url, &body)?))
    }

    /// DELETE with 404 mapped to the idempotent `NotFound` outcome.
    async fn delete(&self, url: &str) -> GatewayResult<Deletion> {
        debug!("DELETE {url}");
        let response = self.request(self.http_client.delete(url)).send().await?;
        let (status, body) = Self::read_body(response, url).await?;
        if status == STATUS_NOT_FOUND {
            return Ok(Deletion::NotFound);
        }
        if !(200..300).contains(&status) {
            return Err(GatewayError::Api {
                status,
                url: url.to_string(),
                message: body,
            });
        }
        Ok(Deletion::Deleted)
    }
}

#[async_trait]
impl ResourceGateway for HttpGateway {
    async fn list_file_systems(&self) -> GatewayResult<Vec<FileSystemDescription>> {
        self.get_json(&self.url("file-systems")).await
    }

    async fn create_file_system(
        &self,
        creation_token: &str,
        encrypted: bool,
        tags: &[Tag],
    ) -> GatewayResult<String> {
        let url = self.url("file-systems");
        let payload = json!({
            "creationToken": creation_token,
            "encrypted": encrypted,
            "tags": tags,
        });
        let created: Option<FileSystemDescription> = self.post_json(&url, payload).await?;
        match created {
            Some(fs) => Ok(fs.file_system_id),
            // File system creates are token-idempotent; the backend never
            // answers 409 here.
            None => Err(GatewayError::Api {
                status: STATUS_CONFLICT,
                url,
                message: "unexpected conflict on file system create".to_string(),
            }),
        }
    }

    async fn delete_file_system(&self, file_system_id: &str) -> GatewayResult<Deletion> {
        self.delete(&self.url(&format!("file-systems/{file_system_id}")))
            .await
    }

    async fn list_access_points(
        &self,
        file_system_id: &str,
    ) -> GatewayResult<Vec<AccessPointDescription>> {
        self.get_json(&self.url(&format!("file-systems/{file_system_id}/access-points")))
            .await
    }

    async fn create_access_point(
        &self,
        client_token: &str,
        file_system_id: &str,
        spec: &AccessPointSpec,
    ) -> GatewayResult<String> {
        let url = self.url("access-points");
        let payload = json!({
            "clientToken": client_token,
            "fileSystemId": file_system_id,
            "subPath": spec.sub_path,
            "ownerUid": spec.owner_uid,
            "ownerGid": spec.owner_gid,
            "permissions": spec.permissions,
        });
        let created: Option<AccessPointDescription> = self.post_json(&url, payload).await?;
        match created {
            Some(ap) => Ok(ap.access_point_id),
            None => Err(GatewayError::Api {
                status: STATUS_CONFLICT,
                url,
                message: "unexpected conflict on access point create".to_string(),
            }),
        }
    }

    async fn delete_access_point(&self, access_point_id: &str) -> GatewayResult<Deletion> {
        self.delete(&self.url(&format!("access-points/{access_point_id}")))
            .await
    }

    async fn list_mount_endpoints(
        &self,
        file_system_id: &str,
    ) -> GatewayResult<Vec<MountEndpointDescription>> {
        self.get_json(&self.url(&format!("file-systems/{file_system_id}/mount-endpoints")))
            .await
    }

    async fn create_mount_endpoint(
        &self,
        file_system_id: &str,
        subnet_id: &str,
        security_group_id: &str,
    ) -> GatewayResult<EndpointCreation> {
        let url = self.url("mount-endpoints");
        let payload = json!({
            "fileSystemId": file_system_id,
            "subnetId": subnet_id,
            "securityGroups": [security_group_id],
        });
        let created: Option<MountEndpointDescription> = self.post_json(&url, payload).await?;
        Ok(match created {
            Some(endpoint) => EndpointCreation::Created(endpoint.mount_endpoint_id),
            None => EndpointCreation::AlreadyExists,
        })
    }

    async fn delete_mount_endpoint(&self, mount_endpoint_id: &str) -> GatewayResult<Deletion> {
        self.delete(&self.url(&format!("mount-endpoints/{mount_endpoint_id}")))
            .await
    }

    async fn describe_fleet_topology(
        &self,
        role_filter: &str,
    ) -> GatewayResult<Vec<FleetInstance>> {
        self.get_json(&self.url(&format!("fleet/instances?role={role_filter}")))
            .await
    }

    async fn ensure_ingress_rule(
        &self,
        security_group_id: &str,
        port: u16,
        protocol: &str,
    ) -> GatewayResult<IngressChange> {
        let url = self.url(&format!("security-groups/{security_group_id}/ingress-rules"));
        let payload = json!({
            "port": port,
            "protocol": protocol,
            "sourceRange": "0.0.0.0/0",
        });
        let created: Option<serde_json::Value> = self.post_json(&url, payload).await?;
        Ok(match created {
            Some(_) => IngressChange::Created,
            None => IngressChange::AlreadyPresent,
        })
    }
}
