// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Apply command - converge the backend to a declared desired state.

use std::path::Path;

use anyhow::{Context, Result};

use reconciler::probe::WORKER_ROLE_FILTER;
use reconciler::{Reconciler, probe};

use crate::common::gateway_from_env;
use crate::spec::load_spec;

pub async fn apply_command(spec_path: &Path) -> Result<()> {
    let desired = load_spec(spec_path)?;
    let gateway = gateway_from_env()?;

    let topology = probe(gateway.as_ref(), WORKER_ROLE_FILTER)
        .await
        .with_context(|| "Failed to probe fleet topology")?;

    let current = reconciler::discover(gateway.as_ref())
        .await
        .with_context(|| "Failed to discover current state")?;

    Reconciler::new(gateway)
        .reconcile(&desired, current, &topology)
        .await
        .with_context(|| "Reconciliation failed")?;

    Ok(())
}
