// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use gateway::{HttpGateway, ResourceGateway};

/// Build the backend gateway from the environment.
///
/// `FSMAN_ENDPOINT` names the provider endpoint; `FSMAN_TOKEN`, when set,
/// is sent as a bearer token. Credentials themselves are managed outside
/// this tool.
pub fn gateway_from_env() -> Result<Arc<dyn ResourceGateway>> {
    let endpoint = env::var("FSMAN_ENDPOINT")
        .map_err(|_| anyhow!("FSMAN_ENDPOINT environment variable not set"))?;
    let token = env::var("FSMAN_TOKEN").ok();

    let gateway = HttpGateway::new(endpoint, token)
        .with_context(|| "Failed to create backend gateway client")?;
    Ok(Arc::new(gateway))
}
