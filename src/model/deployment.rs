// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Identity
//!
//! A deployed unit is identified by the pair (name, content hash). Two units
//! are the same only if both match: equal bytes under different names are
//! different units, and a name redeployed with new bytes is a different unit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::checksum::ChecksumBuilder;
use crate::model::ModelElement;

/// Content hash parse error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentHashError {
    #[error("Content hash must be 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("Content hash is not valid hex: {0}")]
    InvalidHex(String),
}

/// 32-byte BLAKE3 digest of deployment content
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash deployment content
    pub fn compute(content: &[u8]) -> Self {
        Self(*blake3::hash(content).as_bytes())
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(value: &str) -> Result<Self, ContentHashError> {
        if value.len() != 64 {
            return Err(ContentHashError::InvalidLength(value.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(value, &mut bytes)
            .map_err(|e| ContentHashError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// Identity of deployed content: name and content hash together
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeploymentIdentity {
    pub name: String,
    pub hash: ContentHash,
}

impl DeploymentIdentity {
    pub fn new(name: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            name: name.into(),
            hash,
        }
    }

    /// Identity of `content` deployed under `name`
    pub fn of_content(name: impl Into<String>, content: &[u8]) -> Self {
        Self::new(name, ContentHash::compute(content))
    }
}

impl fmt::Display for DeploymentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, hex::encode(&self.hash.as_bytes()[..8]))
    }
}

/// A deployment assigned to a server group or running on a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeploymentUnit {
    pub identity: DeploymentIdentity,
    pub runtime_name: String,
}

impl DeploymentUnit {
    pub fn new(identity: DeploymentIdentity, runtime_name: impl Into<String>) -> Self {
        Self {
            identity,
            runtime_name: runtime_name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }
}

impl ModelElement for DeploymentUnit {
    fn element_name(&self) -> &'static str {
        "deployment"
    }

    fn contribute(&self, checksum: &mut ChecksumBuilder) {
        checksum
            .field("name", &self.identity.name)
            .field("sha", &self.identity.hash.to_hex())
            .field("runtime-name", &self.runtime_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_requires_name_and_hash() {
        let app = DeploymentIdentity::of_content("app.war", b"v1");

        assert_eq!(app, DeploymentIdentity::of_content("app.war", b"v1"));
        assert_ne!(app, DeploymentIdentity::of_content("app.war", b"v2"));
        assert_ne!(app, DeploymentIdentity::of_content("other.war", b"v1"));
    }

    #[test]
    fn test_content_hash_hex_round_trip() {
        let hash = ContentHash::compute(b"payload");
        assert_eq!(ContentHash::from_hex(&hash.to_hex()).unwrap(), hash);
    }

    #[test]
    fn test_content_hash_rejects_bad_input() {
        assert_eq!(
            ContentHash::from_hex("abc"),
            Err(ContentHashError::InvalidLength(3))
        );
        assert!(matches!(
            ContentHash::from_hex(&"zz".repeat(32)),
            Err(ContentHashError::InvalidHex(_))
        ));
    }
}
