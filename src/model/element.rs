// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Element Capability and Shared Leaf Elements
//!
//! Every configuration entity participates in its owner's checksum and
//! serializes to the configuration document without loss. Leaf elements that
//! appear at more than one tier (subsystems, paths) live here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checksum::{Checksum, ChecksumBuilder};

/// Base capability of every configuration entity
///
/// An element's checksum is its name hash combined with its own content and
/// the checksums of its children, so the checksum of a whole model is a fold
/// over its structural tree.
pub trait ModelElement: Serialize {
    /// Element name used as the checksum seed
    fn element_name(&self) -> &'static str;

    /// Absorb this element's fields and children
    fn contribute(&self, checksum: &mut ChecksumBuilder);

    /// Content checksum of this element
    fn checksum(&self) -> Checksum {
        let mut builder = ChecksumBuilder::new(self.element_name());
        self.contribute(&mut builder);
        builder.finish()
    }

    /// Serialize this element to its document representation
    fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Checksum contribution of passthrough metadata the reader did not understand
///
/// `serde_json::Value` objects keep their keys sorted, so the canonical text
/// is stable across reads.
pub(crate) fn passthrough_checksums(
    passthrough: &BTreeMap<String, serde_json::Value>,
) -> impl Iterator<Item = Checksum> + '_ {
    passthrough.iter().map(|(key, value)| {
        let mut entry = ChecksumBuilder::new("passthrough");
        entry.field("key", key).field("value", &value.to_string());
        entry.finish()
    })
}

/// A subsystem configuration within a profile or a live server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Subsystem {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Subsystem {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl ModelElement for Subsystem {
    fn element_name(&self) -> &'static str {
        "subsystem"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .properties("properties", &self.properties);
    }
}

/// A named filesystem path, optionally relative to another named path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathSpec {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<String>,
}

impl PathSpec {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            relative_to: None,
        }
    }

    pub fn relative_to(mut self, base: impl Into<String>) -> Self {
        self.relative_to = Some(base.into());
        self
    }
}

impl ModelElement for PathSpec {
    fn element_name(&self) -> &'static str {
        "path"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.name)
            .field("path", &self.path)
            .optional("relative-to", self.relative_to.as_deref());
    }
}
