// Copyright (c) 2025 - Cowboy AI, Inc.
//! Server Model - Per-Process Runtime Configuration
//!
//! The configuration a live managed process runs with. Updates derived from
//! the domain and host tiers land here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checksum::ChecksumBuilder;
use crate::model::invariants::{self, ValidationError};
use crate::model::{DeploymentUnit, ElementKind, ModelElement, PathSpec, Subsystem};

/// A named socket binding with its base port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketBinding {
    pub name: String,
    pub interface: String,
    pub port: u16,
}

impl SocketBinding {
    pub fn new(name: impl Into<String>, interface: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            interface: interface.into(),
            port,
        }
    }
}

impl ModelElement for SocketBinding {
    fn element_name(&self) -> &'static str {
        "socket-binding"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .field("interface", &self.interface)
            .number("port", u64::from(self.port));
    }
}

/// Runtime configuration of one live managed process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerModel {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) subsystems: BTreeMap<String, Subsystem>,
    #[serde(default)]
    pub(crate) socket_bindings: BTreeMap<String, SocketBinding>,
    #[serde(default)]
    pub(crate) port_offset: u16,
    #[serde(default)]
    pub(crate) system_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub(crate) paths: BTreeMap<String, PathSpec>,
    #[serde(default)]
    pub(crate) deployments: BTreeMap<String, DeploymentUnit>,
}

impl ServerModel {
    pub fn builder(name: impl Into<String>) -> ServerModelBuilder {
        ServerModelBuilder {
            model: ServerModel {
                name: name.into(),
                ..ServerModel::default()
            },
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subsystem(&self, name: &str) -> Option<&Subsystem> {
        self.subsystems.get(name)
    }

    pub fn socket_binding(&self, name: &str) -> Option<&SocketBinding> {
        self.socket_bindings.get(name)
    }

    /// Base port of the binding shifted by the server's port offset
    pub fn effective_port(&self, binding: &str) -> Option<u16> {
        self.socket_bindings
            .get(binding)
            .and_then(|b| invariants::effective_port(&b.name, b.port, self.port_offset).ok())
    }

    pub fn port_offset(&self) -> u16 {
        self.port_offset
    }

    pub fn system_property(&self, name: &str) -> Option<&str> {
        self.system_properties.get(name).map(String::as_str)
    }

    pub fn path(&self, name: &str) -> Option<&PathSpec> {
        self.paths.get(name)
    }

    pub fn deployment(&self, name: &str) -> Option<&DeploymentUnit> {
        self.deployments.get(name)
    }
}

impl ModelElement for ServerModel {
    fn element_name(&self) -> &'static str {
        "server"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .unordered("subsystems", self.subsystems.values().map(ModelElement::checksum))
            .unordered(
                "socket-bindings",
                self.socket_bindings.values().map(ModelElement::checksum),
            )
            .number("port-offset", u64::from(self.port_offset))
            .properties("system-properties", &self.system_properties)
            .unordered("paths", self.paths.values().map(ModelElement::checksum))
            .unordered("deployments", self.deployments.values().map(ModelElement::checksum));
    }
}

/// Builder for a server model when a process is configured
#[derive(Debug)]
pub struct ServerModelBuilder {
    model: ServerModel,
    error: Option<ValidationError>,
}

impl ServerModelBuilder {
    pub fn subsystem(mut self, subsystem: Subsystem) -> Self {
        if let Some(previous) = self.model.subsystems.insert(subsystem.name.clone(), subsystem) {
            self.record(ElementKind::Subsystem, previous.name);
        }
        self
    }

    pub fn socket_binding(mut self, binding: SocketBinding) -> Self {
        if let Some(previous) = self.model.socket_bindings.insert(binding.name.clone(), binding) {
            self.record(ElementKind::SocketBinding, previous.name);
        }
        self
    }

    pub fn port_offset(mut self, offset: u16) -> Self {
        self.model.port_offset = offset;
        self
    }

    pub fn system_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.model.system_properties.insert(name.into(), value.into());
        self
    }

    pub fn path(mut self, path: PathSpec) -> Self {
        if let Some(previous) = self.model.paths.insert(path.name.clone(), path) {
            self.record(ElementKind::Path, previous.name);
        }
        self
    }

    pub fn deployment(mut self, unit: DeploymentUnit) -> Self {
        if let Some(previous) = self.model.deployments.insert(unit.name().to_string(), unit) {
            self.record(ElementKind::Deployment, previous.identity.name);
        }
        self
    }

    pub fn build(self) -> Result<ServerModel, ValidationError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        invariants::validate_server(&self.model)?;
        Ok(self.model)
    }

    fn record(&mut self, kind: ElementKind, name: String) {
        self.error
            .get_or_insert(ValidationError::DuplicateName { kind, name });
    }
}
