// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Desired and observed resource graphs.

use std::collections::{BTreeMap, BTreeSet};

use gateway::LifecycleState;

/// The declared goal state: file system keys mapped to the access point
/// keys each should carry. Keys are opaque, user supplied, and never
/// generated here. No endpoint information; endpoints are derived from the
/// fleet topology, not declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    file_systems: BTreeMap<String, BTreeSet<String>>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        file_system_key: impl Into<String>,
        access_point_keys: impl IntoIterator<Item = String>,
    ) {
        self.file_systems
            .insert(file_system_key.into(), access_point_keys.into_iter().collect());
    }

    pub fn contains(&self, file_system_key: &str) -> bool {
        self.file_systems.contains_key(file_system_key)
    }

    pub fn get(&self, file_system_key: &str) -> Option<&BTreeSet<String>> {
        self.file_systems.get(file_system_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.file_systems.iter()
    }

    pub fn len(&self) -> usize {
        self.file_systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_systems.is_empty()
    }
}

impl FromIterator<(String, BTreeSet<String>)> for DesiredState {
    fn from_iter<I: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: I) -> Self {
        DesiredState {
            file_systems: iter.into_iter().collect(),
        }
    }
}

/// One discovered file system: its backend id, the lifecycle last observed,
/// and its managed access points keyed by logical name.
#[derive(Debug, Clone)]
pub struct FileSystemState {
    pub file_system_id: String,
    pub last_life_cycle_state: LifecycleState,
    pub access_points: BTreeMap<String, String>,
}

/// The observed state of every managed file system, keyed by logical name.
/// A pure snapshot; the backend remains the system of record.
#[derive(Debug, Clone, Default)]
pub struct CurrentState {
    file_systems: BTreeMap<String, FileSystemState>,
}

impl CurrentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_system_key: impl Into<String>, state: FileSystemState) {
        self.file_systems.insert(file_system_key.into(), state);
    }

    pub fn remove(&mut self, file_system_key: &str) -> Option<FileSystemState> {
        self.file_systems.remove(file_system_key)
    }

    pub fn get(&self, file_system_key: &str) -> Option<&FileSystemState> {
        self.file_systems.get(file_system_key)
    }

    pub fn get_mut(&mut self, file_system_key: &str) -> Option<&mut FileSystemState> {
        self.file_systems.get_mut(file_system_key)
    }

    pub fn contains(&self, file_system_key: &str) -> bool {
        self.file_systems.contains_key(file_system_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.file_systems.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileSystemState)> {
        self.file_systems.iter()
    }

    pub fn len(&self) -> usize {
        self.file_systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_systems.is_empty()
    }
}

impl IntoIterator for CurrentState {
    type Item = (String, FileSystemState);
    type IntoIter = std::collections::btree_map::IntoIter<String, FileSystemState>;

    fn into_iter(self) -> Self::IntoIter {
        self.file_systems.into_iter()
    }
}
