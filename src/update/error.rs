// Copyright (c) 2025 - Cowboy AI, Inc.
//! Update failure taxonomy

use uuid::Uuid;

use crate::checksum::Checksum;
use crate::model::{ElementKind, Tier, ValidationError};

/// Reasons an update command can fail to apply
///
/// Every failure leaves the target model exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// The model changed since the command was built; re-read and reissue
    #[error("Concurrent modification of {tier} model: expected checksum {expected}, found {actual}")]
    ConcurrentModification {
        tier: Tier,
        expected: Checksum,
        actual: Checksum,
    },

    /// The command asserted the wrong post-state; a construction defect, not a race
    #[error("Checksum integrity failure on {tier} model: command asserted {expected}, update produced {actual}")]
    ChecksumIntegrity {
        tier: Tier,
        expected: Checksum,
        actual: Checksum,
    },

    /// Add of an element whose identity already exists
    #[error("{kind} {name} already exists")]
    Duplicate { kind: ElementKind, name: String },

    /// Remove of, or update to, an element that does not exist
    #[error("{kind} {name} not found")]
    NotFound { kind: ElementKind, name: String },

    /// Remove of a profile that server groups are still bound to
    #[error("Profile {profile} is still bound to server groups {groups:?}")]
    ProfileInUse { profile: String, groups: Vec<String> },

    /// Resulting model would break an invariant
    #[error("Invalid update: {0}")]
    Invalid(#[from] ValidationError),

    /// The same command instance was applied twice; a programmer error
    #[error("Update command {0} was already applied")]
    AlreadyApplied(Uuid),
}

impl UpdateError {
    pub(crate) fn duplicate(kind: ElementKind, name: impl Into<String>) -> Self {
        UpdateError::Duplicate {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn not_found(kind: ElementKind, name: impl Into<String>) -> Self {
        UpdateError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Whether re-reading the model and reissuing may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, UpdateError::ConcurrentModification { .. })
    }

    /// Whether the failure is a structural precondition (duplicate/missing/in use)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            UpdateError::Duplicate { .. }
                | UpdateError::NotFound { .. }
                | UpdateError::ProfileInUse { .. }
        )
    }
}
