// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Model - Per-Node Configuration
//!
//! One configuration authority per physical or virtual node. JVM launch
//! settings only take effect when a server process next starts; paths and
//! system properties are also pushed to running servers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::checksum::{Checksum, ChecksumBuilder};
use crate::model::element::passthrough_checksums;
use crate::model::invariants::{self, ValidationError};
use crate::model::{ElementKind, ModelElement, PathSpec};

/// A named JVM launch configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JvmConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heap_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_home: Option<String>,
    /// Launch options, in command-line order
    #[serde(default)]
    pub options: Vec<String>,
}

impl JvmConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn heap(mut self, initial: impl Into<String>, max: impl Into<String>) -> Self {
        self.heap_size = Some(initial.into());
        self.max_heap_size = Some(max.into());
        self
    }

    pub fn java_home(mut self, home: impl Into<String>) -> Self {
        self.java_home = Some(home.into());
        self
    }

    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }
}

impl ModelElement for JvmConfig {
    fn element_name(&self) -> &'static str {
        "jvm"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .optional("heap-size", self.heap_size.as_deref())
            .optional("max-heap-size", self.max_heap_size.as_deref())
            .optional("java-home", self.java_home.as_deref())
            .ordered("options", self.options.iter().map(|o| Checksum::of_str(o)));
    }
}

/// Native management socket of the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementSocket {
    pub interface: String,
    pub port: u16,
}

impl ManagementSocket {
    pub fn new(interface: impl Into<String>, port: u16) -> Self {
        Self {
            interface: interface.into(),
            port,
        }
    }
}

impl ModelElement for ManagementSocket {
    fn element_name(&self) -> &'static str {
        "management-socket"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("interface", &self.interface)
            .number("port", u64::from(self.port));
    }
}

/// Reference to a remote domain controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainControllerRef {
    pub host: String,
    pub port: u16,
}

impl DomainControllerRef {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl ModelElement for DomainControllerRef {
    fn element_name(&self) -> &'static str {
        "remote-domain-controller"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("host", &self.host)
            .number("port", u64::from(self.port));
    }
}

/// Per-node configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostModel {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) extensions: BTreeSet<String>,
    #[serde(default)]
    pub(crate) jvms: BTreeMap<String, JvmConfig>,
    #[serde(default)]
    pub(crate) paths: BTreeMap<String, PathSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) management: Option<ManagementSocket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) domain_controller: Option<DomainControllerRef>,
    #[serde(default)]
    pub(crate) system_properties: BTreeMap<String, String>,
    /// Document content this crate does not interpret, written back verbatim
    #[serde(flatten)]
    pub(crate) passthrough: BTreeMap<String, serde_json::Value>,
}

impl HostModel {
    pub fn builder(name: impl Into<String>) -> HostModelBuilder {
        HostModelBuilder {
            model: HostModel {
                name: name.into(),
                ..HostModel::default()
            },
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_extension(&self, module: &str) -> bool {
        self.extensions.contains(module)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn jvm(&self, name: &str) -> Option<&JvmConfig> {
        self.jvms.get(name)
    }

    pub fn path(&self, name: &str) -> Option<&PathSpec> {
        self.paths.get(name)
    }

    pub fn management_socket(&self) -> Option<&ManagementSocket> {
        self.management.as_ref()
    }

    pub fn domain_controller(&self) -> Option<&DomainControllerRef> {
        self.domain_controller.as_ref()
    }

    pub fn system_property(&self, name: &str) -> Option<&str> {
        self.system_properties.get(name).map(String::as_str)
    }

    pub fn passthrough(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.passthrough
    }
}

impl ModelElement for HostModel {
    fn element_name(&self) -> &'static str {
        "host"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .unordered("extensions", self.extensions.iter().map(|e| Checksum::of_str(e)))
            .unordered("jvms", self.jvms.values().map(ModelElement::checksum))
            .unordered("paths", self.paths.values().map(ModelElement::checksum))
            .ordered("management", self.management.iter().map(ModelElement::checksum))
            .ordered(
                "domain-controller",
                self.domain_controller.iter().map(ModelElement::checksum),
            )
            .properties("system-properties", &self.system_properties)
            .unordered("passthrough", passthrough_checksums(&self.passthrough));
    }
}

/// Builder for a host model at node bootstrap
#[derive(Debug)]
pub struct HostModelBuilder {
    model: HostModel,
    error: Option<ValidationError>,
}

impl HostModelBuilder {
    pub fn extension(mut self, module: impl Into<String>) -> Self {
        let module = module.into();
        if !self.model.extensions.insert(module.clone()) {
            self.record(ElementKind::Extension, module);
        }
        self
    }

    pub fn jvm(mut self, jvm: JvmConfig) -> Self {
        if let Some(previous) = self.model.jvms.insert(jvm.name.clone(), jvm) {
            self.record(ElementKind::Jvm, previous.name);
        }
        self
    }

    pub fn path(mut self, path: PathSpec) -> Self {
        if let Some(previous) = self.model.paths.insert(path.name.clone(), path) {
            self.record(ElementKind::Path, previous.name);
        }
        self
    }

    pub fn management_socket(mut self, socket: ManagementSocket) -> Self {
        self.model.management = Some(socket);
        self
    }

    pub fn domain_controller(mut self, controller: DomainControllerRef) -> Self {
        self.model.domain_controller = Some(controller);
        self
    }

    pub fn system_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.model.system_properties.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<HostModel, ValidationError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        invariants::validate_host(&self.model)?;
        Ok(self.model)
    }

    fn record(&mut self, kind: ElementKind, name: String) {
        self.error
            .get_or_insert(ValidationError::DuplicateName { kind, name });
    }
}
