// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Delete-all command - tear down every managed file system.

use anyhow::{Context, Result};

use reconciler::Reconciler;

use crate::common::gateway_from_env;

pub async fn delete_all_command() -> Result<()> {
    let gateway = gateway_from_env()?;
    let current = reconciler::discover(gateway.as_ref())
        .await
        .with_context(|| "Failed to discover current state")?;

    Reconciler::new(gateway)
        .teardown_all(current)
        .await
        .with_context(|| "Teardown failed")?;

    Ok(())
}
