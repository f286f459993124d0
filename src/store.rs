// Copyright (c) 2025 - Cowboy AI, Inc.
//! Single-Writer Model Store
//!
//! One [`ModelStore`] owns one configuration model. Every mutation goes
//! through [`ModelStore::execute`] (or [`ModelStore::submit`]), which holds
//! the store lock for exactly one command:
//!
//! ```text
//! lock → snapshot → apply → compensation + translation (from snapshot)
//!      → record history → unlock → caller dispatches the translation
//! ```
//!
//! The lock is released before any dispatch, so a slow or unreachable live
//! process never blocks the next model mutation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checksum::Checksum;
use crate::model::{ConfigurationModel, ModelElement, Tier};
use crate::update::{ModelUpdate, ServerUpdate, TargetScope, UpdateCommand, UpdateError};

/// Default number of history entries a store retains
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Audit record of one successfully applied command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "U: ModelUpdate")]
pub struct AppliedUpdate<U> {
    pub command_id: Uuid,
    pub operation: U,
    pub applied_at: DateTime<Utc>,
    pub before: Checksum,
    pub after: Checksum,
    /// Inverse command, `None` when the command changed nothing reversible
    pub compensation: Option<UpdateCommand<U>>,
}

/// What a successful execution produced
#[derive(Debug, Clone)]
pub struct Execution<U> {
    pub command_id: Uuid,
    pub tier: Tier,
    /// Model checksum after the command
    pub checksum: Checksum,
    pub compensation: Option<UpdateCommand<U>>,
    /// Update live server processes need, if any
    pub server_update: Option<ServerUpdate>,
    /// Live processes `server_update` must reach
    pub scope: TargetScope,
}

impl<U> Execution<U> {
    /// Whether anything has to be pushed to live processes
    pub fn needs_dispatch(&self) -> bool {
        self.server_update.is_some() && self.scope != TargetScope::Nothing
    }
}

struct StoreState<U: ModelUpdate> {
    model: U::Model,
    history: VecDeque<AppliedUpdate<U>>,
}

/// One model behind a single-writer lock, with bounded audit history
pub struct ModelStore<U: ModelUpdate> {
    state: Mutex<StoreState<U>>,
    history_limit: usize,
}

impl<U: ModelUpdate> ModelStore<U> {
    pub fn new(model: U::Model) -> Self {
        Self::with_history_limit(model, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(model: U::Model, history_limit: usize) -> Self {
        Self {
            state: Mutex::new(StoreState {
                model,
                history: VecDeque::new(),
            }),
            history_limit,
        }
    }

    /// Apply an externally built command
    ///
    /// Fails with `ConcurrentModification` if the command was prepared
    /// against a state other than the current one.
    pub async fn execute(&self, command: UpdateCommand<U>) -> Result<Execution<U>, UpdateError> {
        let mut state = self.state.lock().await;
        self.execute_locked(&mut state, command)
    }

    /// Prepare `operation` against the current state and apply it
    ///
    /// Preparation and application happen under the same lock, so the
    /// checksum guard cannot be raced.
    pub async fn submit(&self, operation: U) -> Result<Execution<U>, UpdateError> {
        let mut state = self.state.lock().await;
        let command = UpdateCommand::prepare(&state.model, operation)?;
        self.execute_locked(&mut state, command)
    }

    fn execute_locked(
        &self,
        state: &mut StoreState<U>,
        command: UpdateCommand<U>,
    ) -> Result<Execution<U>, UpdateError> {
        let tier = command.tier();
        let operation = command.operation().operation();
        let snapshot = state.model.clone();

        let checksum = match command.apply(&mut state.model) {
            Ok(checksum) => checksum,
            Err(e) => {
                warn!(
                    tier = %tier,
                    operation,
                    command_id = %command.command_id(),
                    error = %e,
                    "Update rejected"
                );
                return Err(e);
            }
        };

        let compensation = command.compensate(&snapshot);
        let server_update = command.translate_to_server_tier(&snapshot);
        let scope = match server_update {
            Some(_) => command.operation().target_scope(&snapshot),
            None => TargetScope::Nothing,
        };

        info!(
            tier = %tier,
            operation,
            command_id = %command.command_id(),
            before = %command.before_checksum(),
            after = %checksum,
            "Update applied"
        );

        state.history.push_back(AppliedUpdate {
            command_id: command.command_id(),
            operation: command.operation().clone(),
            applied_at: Utc::now(),
            before: command.before_checksum(),
            after: checksum,
            compensation: compensation.clone(),
        });
        while state.history.len() > self.history_limit {
            state.history.pop_front();
        }

        Ok(Execution {
            command_id: command.command_id(),
            tier,
            checksum,
            compensation,
            server_update,
            scope,
        })
    }

    /// Undo the most recent command by applying its compensation
    ///
    /// Returns `Ok(None)` when the history is empty. An entry without a
    /// compensation is dropped and yields an execution with no translation.
    /// If the compensation fails the entry stays in the history.
    pub async fn rollback_last(&self) -> Result<Option<Execution<U>>, UpdateError> {
        let mut state = self.state.lock().await;
        let Some(entry) = state.history.pop_back() else {
            return Ok(None);
        };

        let Some(compensation) = entry.compensation.clone() else {
            debug!(command_id = %entry.command_id, "Nothing to compensate");
            let checksum = state.model.checksum();
            return Ok(Some(Execution {
                command_id: entry.command_id,
                tier: <U::Model as ConfigurationModel>::TIER,
                checksum,
                compensation: None,
                server_update: None,
                scope: TargetScope::Nothing,
            }));
        };

        let snapshot = state.model.clone();
        match compensation.apply(&mut state.model) {
            Ok(checksum) => {
                let server_update = compensation.translate_to_server_tier(&snapshot);
                let scope = match server_update {
                    Some(_) => compensation.operation().target_scope(&snapshot),
                    None => TargetScope::Nothing,
                };
                info!(
                    command_id = %entry.command_id,
                    compensation_id = %compensation.command_id(),
                    checksum = %checksum,
                    "Update rolled back"
                );
                Ok(Some(Execution {
                    command_id: compensation.command_id(),
                    tier: compensation.tier(),
                    checksum,
                    compensation: None,
                    server_update,
                    scope,
                }))
            }
            Err(e) => {
                warn!(command_id = %entry.command_id, error = %e, "Rollback failed");
                state.history.push_back(entry);
                Err(e)
            }
        }
    }

    /// Clone of the current model
    pub async fn snapshot(&self) -> U::Model {
        self.state.lock().await.model.clone()
    }

    pub async fn checksum(&self) -> Checksum {
        self.state.lock().await.model.checksum()
    }

    /// Applied commands, oldest first
    pub async fn history(&self) -> Vec<AppliedUpdate<U>> {
        self.state.lock().await.history.iter().cloned().collect()
    }
}
