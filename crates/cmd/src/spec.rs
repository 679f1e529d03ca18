// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Desired-state document loading.
//!
//! The spec file is a YAML map of file system keys to lists of access point
//! keys. Keys become identity tokens on the backend, so a key containing
//! `':'` would later decode as malformed and orphan its resource; such keys
//! are rejected here, before anything is created.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, bail};

use reconciler::DesiredState;

/// Load and validate a spec file into the desired-state graph.
pub fn load_spec<P: AsRef<Path>>(path: P) -> Result<DesiredState> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read spec file: {}", path.as_ref().display()))?;
    parse_spec(&content)
}

fn parse_spec(content: &str) -> Result<DesiredState> {
    let document: BTreeMap<String, Vec<String>> =
        serde_yaml_ng::from_str(content).with_context(|| "Failed to parse YAML spec")?;

    let mut desired = DesiredState::new();
    for (fs_key, ap_keys) in document {
        validate_key(&fs_key, "file system")?;
        let mut keys = BTreeSet::new();
        for ap_key in ap_keys {
            validate_key(&ap_key, "access point")?;
            if !keys.insert(ap_key.clone()) {
                bail!("Duplicate access point key {ap_key:?} under file system {fs_key:?}");
            }
        }
        desired.insert(fs_key, keys);
    }
    Ok(desired)
}

fn validate_key(key: &str, kind: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Empty {kind} key in spec");
    }
    if key.contains(':') {
        bail!("Invalid {kind} key {key:?}: keys must not contain ':'");
    }
    Ok(())
}
