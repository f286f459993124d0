// Copyright (c) 2025 - Cowboy AI, Inc.
//! Checksum-Guarded Update Command
//!
//! An [`UpdateCommand`] is a compare-and-swap against its target model:
//!
//! ```text
//! checksum(model) == before ?  ── no ──> ConcurrentModification
//!         │ yes
//!   apply to scratch copy      ── err ─> Duplicate / NotFound / ...
//!         │ ok
//! checksum(scratch) == after ? ── no ──> ChecksumIntegrity
//!         │ yes
//!   commit scratch → model
//! ```
//!
//! The model is only replaced once every check passes, so a failed apply
//! leaves it byte-identical to before.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::checksum::Checksum;
use crate::model::{ConfigurationModel, ModelElement, Tier};
use crate::update::{DomainUpdate, HostUpdate, ModelUpdate, ServerUpdate, UpdateError};

/// Domain-tier update command
pub type DomainUpdateCommand = UpdateCommand<DomainUpdate>;

/// Host-tier update command
pub type HostUpdateCommand = UpdateCommand<HostUpdate>;

/// Server-tier update command
pub type ServerUpdateCommand = UpdateCommand<ServerUpdate>;

/// One tier operation plus its expected before/after checksums
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "U: ModelUpdate")]
pub struct UpdateCommand<U> {
    command_id: Uuid,
    operation: U,
    before: Checksum,
    after: Checksum,
    #[serde(skip)]
    applied: AtomicBool,
}

impl<U: ModelUpdate> UpdateCommand<U> {
    /// Command with explicitly asserted checksums
    ///
    /// Use for commands received from elsewhere; locally authored commands
    /// should come from [`UpdateCommand::prepare`].
    pub fn new(operation: U, before: Checksum, after: Checksum) -> Self {
        Self {
            command_id: Uuid::now_v7(),
            operation,
            before,
            after,
            applied: AtomicBool::new(false),
        }
    }

    /// Build a command against the current state of `model`
    ///
    /// Computes the after-checksum by applying the operation to a scratch
    /// copy, so structural preconditions are checked here as well.
    pub fn prepare(model: &U::Model, operation: U) -> Result<Self, UpdateError> {
        let before = model.checksum();
        let mut scratch = model.clone();
        operation.apply_to(&mut scratch)?;
        Ok(Self::new(operation, before, scratch.checksum()))
    }

    pub fn command_id(&self) -> Uuid {
        self.command_id
    }

    pub fn operation(&self) -> &U {
        &self.operation
    }

    pub fn before_checksum(&self) -> Checksum {
        self.before
    }

    pub fn after_checksum(&self) -> Checksum {
        self.after
    }

    pub fn tier(&self) -> Tier {
        <U::Model as ConfigurationModel>::TIER
    }

    pub fn is_applied(&self) -> bool {
        self.applied.load(Ordering::Acquire)
    }

    /// Apply to `model`, returning the model's new checksum
    ///
    /// # Errors
    /// - `ConcurrentModification` if the model's checksum is not `before`
    /// - structural failures from the operation itself
    /// - `ChecksumIntegrity` if the result does not match `after`
    /// - `AlreadyApplied` on a second call
    pub fn apply(&self, model: &mut U::Model) -> Result<Checksum, UpdateError> {
        if self.is_applied() {
            return Err(UpdateError::AlreadyApplied(self.command_id));
        }

        let current = model.checksum();
        if current != self.before {
            return Err(UpdateError::ConcurrentModification {
                tier: self.tier(),
                expected: self.before,
                actual: current,
            });
        }

        let mut scratch = model.clone();
        self.operation.apply_to(&mut scratch)?;

        let produced = scratch.checksum();
        if produced != self.after {
            return Err(UpdateError::ChecksumIntegrity {
                tier: self.tier(),
                expected: self.after,
                actual: produced,
            });
        }

        if self.applied.swap(true, Ordering::AcqRel) {
            return Err(UpdateError::AlreadyApplied(self.command_id));
        }
        *model = scratch;
        Ok(produced)
    }

    /// Inverse command, derived from the snapshot taken before `apply`
    ///
    /// The inverse expects the state this command produces and restores the
    /// snapshot's checksum.
    pub fn compensate(&self, before: &U::Model) -> Option<Self> {
        self.operation
            .compensating(before)
            .map(|operation| Self::new(operation, self.after, before.checksum()))
    }

    /// Update live server processes need, derived from the pre-apply snapshot
    pub fn translate_to_server_tier(&self, before: &U::Model) -> Option<ServerUpdate> {
        self.operation.to_server_update(before)
    }
}

impl<U: Clone> Clone for UpdateCommand<U> {
    fn clone(&self) -> Self {
        Self {
            command_id: self.command_id,
            operation: self.operation.clone(),
            before: self.before,
            after: self.after,
            applied: AtomicBool::new(self.applied.load(Ordering::Acquire)),
        }
    }
}

impl<U: PartialEq> PartialEq for UpdateCommand<U> {
    fn eq(&self, other: &Self) -> bool {
        self.command_id == other.command_id
            && self.operation == other.operation
            && self.before == other.before
            && self.after == other.after
    }
}
