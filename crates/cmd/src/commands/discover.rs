// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Discover command - print the backend's managed state.

use anyhow::{Context, Result};

use crate::common::gateway_from_env;

/// Print discovered file systems and their access points as
/// `<fs-id>: [<ap-id>...]`, one file system per line.
pub async fn discover_command() -> Result<()> {
    let gateway = gateway_from_env()?;
    let current = reconciler::discover(gateway.as_ref())
        .await
        .with_context(|| "Failed to discover current state")?;

    for (_, fs) in current.iter() {
        if fs.access_points.is_empty() {
            println!("{}: []", fs.file_system_id);
        } else {
            println!("{}:", fs.file_system_id);
            for ap_id in fs.access_points.values() {
                println!("  - {ap_id}");
            }
        }
    }
    Ok(())
}
