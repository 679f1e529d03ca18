// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Inventory builder: snapshot the backend's managed resources.

use std::collections::BTreeMap;

use diagnostics::*;
use gateway::ResourceGateway;

use crate::state::{CurrentState, FileSystemState};
use crate::token::{AP_TOKEN_MARKER, FS_TOKEN_MARKER, decode};
use crate::Result;

/// Build the current-state graph of managed file systems and access points.
///
/// Resources whose identity token does not decode (other tools, other
/// instances of this tool under different markers) are skipped silently.
/// Performs no mutation. Any backend read error aborts discovery; the diff
/// must never run against a partial inventory.
pub async fn discover(gateway: &dyn ResourceGateway) -> Result<CurrentState> {
    let mut current = CurrentState::new();

    for fs in gateway.list_file_systems().await? {
        let Some(fs_key) = decode(FS_TOKEN_MARKER, &fs.creation_token) else {
            let id = &fs.file_system_id;
            debug!("skipping unmanaged file system {id}");
            continue;
        };

        let mut access_points = BTreeMap::new();
        for ap in gateway.list_access_points(&fs.file_system_id).await? {
            let Some(ap_key) = decode(AP_TOKEN_MARKER, &ap.client_token) else {
                let id = &ap.access_point_id;
                debug!("skipping unmanaged access point {id}");
                continue;
            };
            access_points.insert(ap_key.to_string(), ap.access_point_id);
        }

        current.insert(
            fs_key.to_string(),
            FileSystemState {
                file_system_id: fs.file_system_id,
                last_life_cycle_state: fs.life_cycle_state,
                access_points,
            },
        );
    }

    let count = current.len();
    debug!("discovered {count} managed file systems");
    Ok(current)
}
