// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain Model - Cluster-Wide Configuration
//!
//! Profiles group subsystem configuration; server groups bind a set of
//! servers to exactly one profile and carry the deployments those servers
//! run. Namespace prefixes and schema locations are authoring metadata that
//! live processes never observe.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::checksum::ChecksumBuilder;
use crate::model::element::passthrough_checksums;
use crate::model::invariants::{self, ValidationError};
use crate::model::{DeploymentUnit, ElementKind, ModelElement, Subsystem};

/// A named set of subsystem configurations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub subsystems: BTreeMap<String, Subsystem>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subsystems: BTreeMap::new(),
        }
    }

    pub fn with_subsystem(mut self, subsystem: Subsystem) -> Self {
        self.subsystems.insert(subsystem.name.clone(), subsystem);
        self
    }
}

impl ModelElement for Profile {
    fn element_name(&self) -> &'static str {
        "profile"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .unordered("subsystems", self.subsystems.values().map(ModelElement::checksum));
    }
}

/// A group of servers sharing one profile and one set of deployments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerGroup {
    pub name: String,
    pub profile: String,
    #[serde(default)]
    pub system_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub deployments: BTreeMap<String, DeploymentUnit>,
}

impl ServerGroup {
    pub fn new(name: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            system_properties: BTreeMap::new(),
            deployments: BTreeMap::new(),
        }
    }
}

impl ModelElement for ServerGroup {
    fn element_name(&self) -> &'static str {
        "server-group"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .field("profile", &self.profile)
            .properties("system-properties", &self.system_properties)
            .unordered("deployments", self.deployments.values().map(ModelElement::checksum));
    }
}

/// An XML-style namespace prefix declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacePrefix {
    pub prefix: String,
    pub uri: String,
}

impl NamespacePrefix {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

impl ModelElement for NamespacePrefix {
    fn element_name(&self) -> &'static str {
        "namespace"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum.field("prefix", &self.prefix).field("uri", &self.uri);
    }
}

/// A schema location hint for one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaLocation {
    pub namespace: String,
    pub location: String,
}

impl SchemaLocation {
    pub fn new(namespace: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            location: location.into(),
        }
    }
}

impl ModelElement for SchemaLocation {
    fn element_name(&self) -> &'static str {
        "schema-location"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("namespace", &self.namespace)
            .field("location", &self.location);
    }
}

/// Cluster-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainModel {
    #[serde(default)]
    pub(crate) profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub(crate) server_groups: BTreeMap<String, ServerGroup>,
    #[serde(default)]
    pub(crate) namespaces: Vec<NamespacePrefix>,
    #[serde(default)]
    pub(crate) schema_locations: Vec<SchemaLocation>,
    #[serde(default)]
    pub(crate) system_properties: BTreeMap<String, String>,
    /// Document content this crate does not interpret, written back verbatim
    #[serde(flatten)]
    pub(crate) passthrough: BTreeMap<String, serde_json::Value>,
}

impl DomainModel {
    /// Empty domain model
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DomainModelBuilder {
        DomainModelBuilder::default()
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn server_group(&self, name: &str) -> Option<&ServerGroup> {
        self.server_groups.get(name)
    }

    pub fn server_groups(&self) -> impl Iterator<Item = &ServerGroup> {
        self.server_groups.values()
    }

    /// Names of the server groups bound to `profile`
    pub fn groups_using_profile(&self, profile: &str) -> BTreeSet<String> {
        self.server_groups
            .values()
            .filter(|group| group.profile == profile)
            .map(|group| group.name.clone())
            .collect()
    }

    pub fn namespaces(&self) -> &[NamespacePrefix] {
        &self.namespaces
    }

    pub fn schema_locations(&self) -> &[SchemaLocation] {
        &self.schema_locations
    }

    pub fn system_property(&self, name: &str) -> Option<&str> {
        self.system_properties.get(name).map(String::as_str)
    }

    pub fn system_properties(&self) -> &BTreeMap<String, String> {
        &self.system_properties
    }

    pub fn passthrough(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.passthrough
    }
}

impl ModelElement for DomainModel {
    fn element_name(&self) -> &'static str {
        "domain"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .unordered("profiles", self.profiles.values().map(ModelElement::checksum))
            .unordered(
                "server-groups",
                self.server_groups.values().map(ModelElement::checksum),
            )
            .ordered("namespaces", self.namespaces.iter().map(ModelElement::checksum))
            .ordered(
                "schema-locations",
                self.schema_locations.iter().map(ModelElement::checksum),
            )
            .properties("system-properties", &self.system_properties)
            .unordered("passthrough", passthrough_checksums(&self.passthrough));
    }
}

/// Builder for a domain model at cluster bootstrap
#[derive(Debug, Default)]
pub struct DomainModelBuilder {
    model: DomainModel,
    error: Option<ValidationError>,
}

impl DomainModelBuilder {
    pub fn profile(mut self, profile: Profile) -> Self {
        if let Some(previous) = self.model.profiles.insert(profile.name.clone(), profile) {
            self.record(ElementKind::Profile, previous.name);
        }
        self
    }

    pub fn server_group(mut self, group: ServerGroup) -> Self {
        if let Some(previous) = self.model.server_groups.insert(group.name.clone(), group) {
            self.record(ElementKind::ServerGroup, previous.name);
        }
        self
    }

    pub fn namespace(mut self, namespace: NamespacePrefix) -> Self {
        self.model.namespaces.push(namespace);
        self
    }

    pub fn schema_location(mut self, location: SchemaLocation) -> Self {
        self.model.schema_locations.push(location);
        self
    }

    pub fn system_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.model.system_properties.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<DomainModel, ValidationError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        invariants::validate_domain(&self.model)?;
        Ok(self.model)
    }

    fn record(&mut self, kind: ElementKind, name: String) {
        self.error
            .get_or_insert(ValidationError::DuplicateName { kind, name });
    }
}
