// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Models
//!
//! The three configuration tiers of a managed fleet:
//!
//! - [`DomainModel`] - cluster-wide profiles, server groups and metadata
//! - [`HostModel`] - one per node: extensions, JVMs, paths, management socket
//! - [`ServerModel`] - one per live process: subsystems, sockets, deployments
//!
//! Models are mutable aggregates. Outside of bootstrap (builders and document
//! parsing) they change only through update commands, which is why their
//! fields are visible to the crate but read through accessors elsewhere.
//!
//! # Checksums
//!
//! Every model implements [`ModelElement`]; its checksum is a fold over its
//! structural tree. Keyed collections (profiles, groups, JVMs, paths, ...)
//! contribute order-free; sequences (namespace prefixes, schema locations,
//! JVM options) contribute in order.

pub mod deployment;
pub mod domain;
pub mod element;
pub mod host;
pub mod invariants;
pub mod server;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use deployment::{ContentHash, ContentHashError, DeploymentIdentity, DeploymentUnit};
pub use domain::{DomainModel, DomainModelBuilder, NamespacePrefix, Profile, SchemaLocation, ServerGroup};
pub use element::{ModelElement, PathSpec, Subsystem};
pub use host::{DomainControllerRef, HostModel, HostModelBuilder, JvmConfig, ManagementSocket};
pub use invariants::{ValidationError, ValidationResult};
pub use server::{ServerModel, ServerModelBuilder, SocketBinding};

/// Configuration tier
///
/// The topology is fixed at three levels; there is no tier registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Cluster-wide configuration
    Domain,
    /// Per-node configuration
    Host,
    /// Per-process runtime configuration
    Server,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Domain => write!(f, "domain"),
            Tier::Host => write!(f, "host"),
            Tier::Server => write!(f, "server"),
        }
    }
}

/// Kind of a named configuration element, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Profile,
    Subsystem,
    ServerGroup,
    Deployment,
    Host,
    Extension,
    Jvm,
    Path,
    Server,
    SocketBinding,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Profile => "profile",
            ElementKind::Subsystem => "subsystem",
            ElementKind::ServerGroup => "server group",
            ElementKind::Deployment => "deployment",
            ElementKind::Host => "host",
            ElementKind::Extension => "extension",
            ElementKind::Jvm => "jvm",
            ElementKind::Path => "path",
            ElementKind::Server => "server",
            ElementKind::SocketBinding => "socket binding",
        };
        f.write_str(name)
    }
}

/// A complete configuration model at one tier
pub trait ConfigurationModel:
    ModelElement + Clone + fmt::Debug + PartialEq + Send + Sync + 'static
{
    /// Tier this model belongs to
    const TIER: Tier;

    /// Check every structural invariant of the model
    fn validate(&self) -> ValidationResult;
}

impl ConfigurationModel for DomainModel {
    const TIER: Tier = Tier::Domain;

    fn validate(&self) -> ValidationResult {
        invariants::validate_domain(self)
    }
}

impl ConfigurationModel for HostModel {
    const TIER: Tier = Tier::Host;

    fn validate(&self) -> ValidationResult {
        invariants::validate_host(self)
    }
}

impl ConfigurationModel for ServerModel {
    const TIER: Tier = Tier::Server;

    fn validate(&self) -> ValidationResult {
        invariants::validate_server(self)
    }
}
