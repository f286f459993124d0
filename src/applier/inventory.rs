// Copyright (c) 2025 - Cowboy AI, Inc.
//! Live process inventory
//!
//! Knows which server group each live process belongs to, so a
//! [`TargetScope`] can be resolved to concrete handles.

use std::collections::BTreeMap;

use crate::applier::outcome::ProcessHandle;
use crate::update::TargetScope;

/// Live processes keyed by handle, each with its server group
#[derive(Debug, Clone, Default)]
pub struct ServerInventory {
    servers: BTreeMap<ProcessHandle, String>,
}

impl ServerInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a process, returning its previous group if it was known
    pub fn register(&mut self, handle: ProcessHandle, group: impl Into<String>) -> Option<String> {
        self.servers.insert(handle, group.into())
    }

    pub fn deregister(&mut self, handle: &ProcessHandle) -> Option<String> {
        self.servers.remove(handle)
    }

    pub fn group_of(&self, handle: &ProcessHandle) -> Option<&str> {
        self.servers.get(handle).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Handles within `scope`, in handle order
    pub fn resolve(&self, scope: &TargetScope) -> Vec<ProcessHandle> {
        let selected = self.servers.iter().filter(|(handle, group)| match scope {
            TargetScope::Nothing => false,
            TargetScope::AllServers => true,
            TargetScope::ServerGroups(groups) => groups.contains(group.as_str()),
            TargetScope::Host(host) => handle.host == *host,
        });
        selected.map(|(handle, _)| handle.clone()).collect()
    }
}
