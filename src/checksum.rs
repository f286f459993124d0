// Copyright (c) 2025 - Cowboy AI, Inc.
//! Content Checksums for Configuration Models
//!
//! Every configuration model produces a deterministic 64-bit checksum from its
//! observable content. Update commands record the checksum they expect before
//! and after application, which turns each update into a compare-and-swap
//! against its target model.
//!
//! # Composition
//!
//! ```text
//! element checksum = H(element name, field₁, field₂, …, children)
//!
//! ordered children   → H(c₁, c₂, …, cₙ)          (sequence matters)
//! unordered children → H(n, h(c₁) ⊕ h(c₂) ⊕ … ⊕ h(cₙ))  (wrapping sum, order-free)
//! ```
//!
//! Every field is written with a tag byte and a length prefix, so two
//! different field layouts never feed the same bytes to the hasher. Children
//! of an unordered set are rehashed before summing, so sets whose raw
//! checksums happen to add up to the same value still differ.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const TAG_FIELD: u8 = 0x01;
const TAG_ABSENT: u8 = 0x02;
const TAG_NUMBER: u8 = 0x03;
const TAG_ORDERED: u8 = 0x04;
const TAG_UNORDERED: u8 = 0x05;
const TAG_FLAG: u8 = 0x06;

/// Deterministic 64-bit content fingerprint of a model snapshot
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Checksum(u64);

impl Checksum {
    /// Wrap a raw checksum value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw 64-bit value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Checksum of an arbitrary byte string
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_digest(blake3::hash(bytes))
    }

    /// Checksum of a UTF-8 string
    pub fn of_str(value: &str) -> Self {
        Self::of_bytes(value.as_bytes())
    }

    fn from_digest(hash: blake3::Hash) -> Self {
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        Self(u64::from_le_bytes(head))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Incremental checksum for one model element
///
/// Starts from the element's name and absorbs its fields and children in the
/// order the element writes them.
///
/// # Example
///
/// ```rust
/// use cim_fleet_config::checksum::{Checksum, ChecksumBuilder};
///
/// let mut builder = ChecksumBuilder::new("path");
/// builder.field("name", "data").field("path", "/var/data");
/// let first = builder.finish();
///
/// let mut again = ChecksumBuilder::new("path");
/// again.field("name", "data").field("path", "/var/data");
/// assert_eq!(first, again.finish());
/// ```
#[derive(Debug, Clone)]
pub struct ChecksumBuilder {
    hasher: blake3::Hasher,
}

impl ChecksumBuilder {
    /// Start a checksum for the named element
    pub fn new(element: &str) -> Self {
        let mut builder = Self {
            hasher: blake3::Hasher::new(),
        };
        builder.write_str(element);
        builder
    }

    /// Absorb a named string field
    pub fn field(&mut self, name: &str, value: &str) -> &mut Self {
        self.hasher.update(&[TAG_FIELD]);
        self.write_str(name);
        self.write_str(value);
        self
    }

    /// Absorb an optional string field; absence is distinct from ""
    pub fn optional(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => self.field(name, value),
            None => {
                self.hasher.update(&[TAG_ABSENT]);
                self.write_str(name);
                self
            }
        }
    }

    /// Absorb a named numeric field
    pub fn number(&mut self, name: &str, value: u64) -> &mut Self {
        self.hasher.update(&[TAG_NUMBER]);
        self.write_str(name);
        self.hasher.update(&value.to_le_bytes());
        self
    }

    /// Absorb a named boolean field
    pub fn flag(&mut self, name: &str, value: bool) -> &mut Self {
        self.hasher.update(&[TAG_FLAG]);
        self.write_str(name);
        self.hasher.update(&[u8::from(value)]);
        self
    }

    /// Absorb a child element or nested checksum
    pub fn child(&mut self, name: &str, checksum: Checksum) -> &mut Self {
        self.number(name, checksum.value())
    }

    /// Absorb a sequence whose order is meaningful
    pub fn ordered<I>(&mut self, name: &str, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Checksum>,
    {
        self.hasher.update(&[TAG_ORDERED]);
        self.write_str(name);
        let mut count: u64 = 0;
        for item in items {
            self.hasher.update(&item.value().to_le_bytes());
            count += 1;
        }
        self.hasher.update(&count.to_le_bytes());
        self
    }

    /// Absorb a set whose iteration order must not matter
    pub fn unordered<I>(&mut self, name: &str, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Checksum>,
    {
        let (count, sum) = items
            .into_iter()
            .fold((0u64, 0u64), |(count, sum), item| {
                (count + 1, sum.wrapping_add(Self::spread(item).value()))
            });
        self.hasher.update(&[TAG_UNORDERED]);
        self.write_str(name);
        self.hasher.update(&count.to_le_bytes());
        self.hasher.update(&sum.to_le_bytes());
        self
    }

    /// Absorb a key/value property map as an unordered set of entries
    pub fn properties(&mut self, name: &str, properties: &BTreeMap<String, String>) -> &mut Self {
        self.unordered(
            name,
            properties.iter().map(|(key, value)| {
                let mut entry = ChecksumBuilder::new("property");
                entry.field("name", key).field("value", value);
                entry.finish()
            }),
        )
    }

    /// Finish and return the checksum
    pub fn finish(self) -> Checksum {
        Checksum::from_digest(self.hasher.finalize())
    }

    fn spread(item: Checksum) -> Checksum {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[TAG_UNORDERED]);
        hasher.update(&item.value().to_le_bytes());
        Checksum::from_digest(hasher.finalize())
    }

    fn write_str(&mut self, value: &str) {
        self.hasher.update(&(value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
    }
}
