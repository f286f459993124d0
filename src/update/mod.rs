// Copyright (c) 2025 - Cowboy AI, Inc.
//! Update Commands
//!
//! Every configuration change is a typed, serializable update command that
//! mutates exactly one model tier:
//!
//! ```text
//! UpdateCommand<U> = U (the operation) + before checksum + after checksum
//!
//!   apply(model)         → new checksum | UpdateError
//!   compensate(snapshot) → inverse command | none
//!   translate(snapshot)  → ServerUpdate | none
//! ```
//!
//! # Tiers
//!
//! Each tier has one closed sum type of operations ([`DomainUpdate`],
//! [`HostUpdate`], [`ServerUpdate`]) implementing [`ModelUpdate`] for its
//! model type. The translation rules for pushing changes to live processes
//! are one `match` per tier, so the full mapping reads in one place.
//!
//! # Compensation
//!
//! Compensation is a pure function of the pre-apply snapshot and the
//! operation: add → remove, remove → re-add with the exact prior element,
//! set → set back to the prior value. An operation that would not change the
//! snapshot has no compensation.

pub mod command;
pub mod domain;
pub mod error;
pub mod host;
pub mod server;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::ConfigurationModel;

pub use command::{DomainUpdateCommand, HostUpdateCommand, ServerUpdateCommand, UpdateCommand};
pub use domain::DomainUpdate;
pub use error::UpdateError;
pub use host::{HostUpdate, JvmChange};
pub use server::ServerUpdate;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::DomainUpdate {}
    impl Sealed for super::HostUpdate {}
    impl Sealed for super::ServerUpdate {}
}

/// An operation against one tier's configuration model
///
/// Sealed: the three tiers are fixed.
pub trait ModelUpdate:
    sealed::Sealed
    + Clone
    + fmt::Debug
    + PartialEq
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Model type this tier's operations mutate
    type Model: ConfigurationModel;

    /// Short operation name for logs
    fn operation(&self) -> &'static str;

    /// Mutate `model`, checking structural preconditions first
    fn apply_to(&self, model: &mut Self::Model) -> Result<(), UpdateError>;

    /// Inverse operation derived from the pre-apply snapshot
    fn compensating(&self, before: &Self::Model) -> Option<Self>;

    /// Equivalent update for live server processes, if they observe this change
    fn to_server_update(&self, before: &Self::Model) -> Option<ServerUpdate>;

    /// Live processes the translated update must reach
    fn target_scope(&self, before: &Self::Model) -> TargetScope;
}

/// Change to a system property map
///
/// Scalar: never fails on a missing name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum PropertyChange {
    Set { name: String, value: String },
    Remove { name: String },
}

impl PropertyChange {
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        PropertyChange::Set {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn remove(name: impl Into<String>) -> Self {
        PropertyChange::Remove { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            PropertyChange::Set { name, .. } | PropertyChange::Remove { name } => name,
        }
    }

    pub(crate) fn apply(&self, properties: &mut BTreeMap<String, String>) {
        match self {
            PropertyChange::Set { name, value } => {
                properties.insert(name.clone(), value.clone());
            }
            PropertyChange::Remove { name } => {
                properties.remove(name);
            }
        }
    }

    pub(crate) fn inverse(&self, before: &BTreeMap<String, String>) -> Option<Self> {
        match (self, before.get(self.name())) {
            (PropertyChange::Set { value, .. }, Some(prior)) if prior == value => None,
            (PropertyChange::Set { name, .. }, Some(prior)) => {
                Some(PropertyChange::set(name.clone(), prior.clone()))
            }
            (PropertyChange::Set { name, .. }, None) => Some(PropertyChange::remove(name.clone())),
            (PropertyChange::Remove { name }, Some(prior)) => {
                Some(PropertyChange::set(name.clone(), prior.clone()))
            }
            (PropertyChange::Remove { .. }, None) => None,
        }
    }
}

/// Live processes a translated update must reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetScope {
    /// No live process observes the change
    Nothing,
    /// Every server in the domain
    AllServers,
    /// Servers belonging to these server groups
    ServerGroups(BTreeSet<String>),
    /// Servers running on this host
    Host(String),
}
