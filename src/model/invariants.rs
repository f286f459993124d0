// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Model Invariants
//!
//! Validation for the structural invariants of the three configuration
//! models. Used when a model is built or parsed from a document; update
//! commands enforce the same rules incrementally.
//!
//! # Invariant Categories
//!
//! 1. **Identity**: element names are non-empty and match their collection key
//! 2. **References**: a server group's profile exists
//! 3. **Ports**: port offset plus each socket's base port stays a valid port

use std::collections::BTreeMap;

use crate::model::{DomainModel, ElementKind, HostModel, ServerModel};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Element has an empty name
    #[error("{kind} name cannot be empty")]
    EmptyName { kind: ElementKind },

    /// Two elements of the same kind share a name
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: ElementKind, name: String },

    /// Collection key disagrees with the element's own name
    #[error("{kind} stored under key {key} is named {name}")]
    KeyMismatch {
        kind: ElementKind,
        key: String,
        name: String,
    },

    /// Server group references a profile that does not exist
    #[error("Server group {group} references unknown profile {profile}")]
    UnknownProfile { group: String, profile: String },

    /// Port offset pushes a socket binding beyond the valid port range
    #[error("Socket binding {binding} port {port} with offset {offset} exceeds 65535")]
    PortOutOfRange {
        binding: String,
        port: u16,
        offset: u16,
    },
}

/// Validate an element name is non-empty
pub fn validate_name(kind: ElementKind, name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName { kind });
    }
    Ok(())
}

/// Effective port of a socket binding under a port offset
///
/// # Rules
/// - `offset + port` must be a valid network port (≤ 65535)
pub fn effective_port(binding: &str, port: u16, offset: u16) -> Result<u16, ValidationError> {
    port.checked_add(offset)
        .ok_or_else(|| ValidationError::PortOutOfRange {
            binding: binding.to_string(),
            port,
            offset,
        })
}

fn validate_keyed<E>(
    kind: ElementKind,
    elements: &BTreeMap<String, E>,
    name_of: impl Fn(&E) -> &str,
) -> ValidationResult {
    for (key, element) in elements {
        let name = name_of(element);
        validate_name(kind, name)?;
        if key != name {
            return Err(ValidationError::KeyMismatch {
                kind,
                key: key.clone(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate the domain model
///
/// # Rules
/// - Profile and server-group names are unique and non-empty
/// - Every server group's profile exists
pub fn validate_domain(model: &DomainModel) -> ValidationResult {
    validate_keyed(ElementKind::Profile, &model.profiles, |p| &p.name)?;
    validate_keyed(ElementKind::ServerGroup, &model.server_groups, |g| &g.name)?;

    for profile in model.profiles.values() {
        validate_keyed(ElementKind::Subsystem, &profile.subsystems, |s| &s.name)?;
    }

    for group in model.server_groups.values() {
        if !model.profiles.contains_key(&group.profile) {
            return Err(ValidationError::UnknownProfile {
                group: group.name.clone(),
                profile: group.profile.clone(),
            });
        }
        validate_keyed(ElementKind::Deployment, &group.deployments, |d| d.name())?;
    }
    Ok(())
}

/// Validate the host model
///
/// # Rules
/// - Host name is non-empty
/// - JVM and path names are unique and non-empty
pub fn validate_host(model: &HostModel) -> ValidationResult {
    validate_name(ElementKind::Host, &model.name)?;
    validate_keyed(ElementKind::Jvm, &model.jvms, |j| &j.name)?;
    validate_keyed(ElementKind::Path, &model.paths, |p| &p.name)?;
    for extension in &model.extensions {
        validate_name(ElementKind::Extension, extension)?;
    }
    Ok(())
}

/// Validate the server model
///
/// # Rules
/// - Server name is non-empty
/// - Every socket binding's effective port is valid
pub fn validate_server(model: &ServerModel) -> ValidationResult {
    validate_name(ElementKind::Server, &model.name)?;
    validate_keyed(ElementKind::Subsystem, &model.subsystems, |s| &s.name)?;
    validate_keyed(ElementKind::SocketBinding, &model.socket_bindings, |b| &b.name)?;
    validate_keyed(ElementKind::Path, &model.paths, |p| &p.name)?;
    validate_keyed(ElementKind::Deployment, &model.deployments, |d| d.name())?;

    for binding in model.socket_bindings.values() {
        effective_port(&binding.name, binding.port, model.port_offset)?;
    }
    Ok(())
}
