// Copyright (c) 2025 - Cowboy AI, Inc.
//! Remote Invocation Channel
//!
//! [`RemoteInvoker`] is the seam between the applier and live processes.
//! [`LocalInvoker`] keeps processes in memory; [`crate::nats::NatsInvoker`]
//! reaches agents over NATS request/reply.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::applier::outcome::{DispatchError, ProcessHandle};
use crate::checksum::Checksum;
use crate::model::{ModelElement, ServerModel};
use crate::update::{ServerUpdate, ServerUpdateCommand, UpdateError};

/// Delivers a server update to one live process
#[async_trait]
pub trait RemoteInvoker: Send + Sync {
    /// Apply `update` on `target`, returning the process model's new checksum
    async fn invoke(
        &self,
        target: &ProcessHandle,
        update: &ServerUpdate,
    ) -> Result<Checksum, DispatchError>;
}

#[async_trait]
impl<T: RemoteInvoker + ?Sized> RemoteInvoker for Arc<T> {
    async fn invoke(
        &self,
        target: &ProcessHandle,
        update: &ServerUpdate,
    ) -> Result<Checksum, DispatchError> {
        (**self).invoke(target, update).await
    }
}

/// A running server's model, mutated one update at a time
#[derive(Debug)]
pub struct ServerProcess {
    handle: ProcessHandle,
    model: Mutex<ServerModel>,
}

impl ServerProcess {
    pub fn new(handle: ProcessHandle, model: ServerModel) -> Self {
        Self {
            handle,
            model: Mutex::new(model),
        }
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    /// Apply a translated update against this process's own model
    ///
    /// The command is prepared and applied under the same lock, since the
    /// update carries no checksums of its own.
    pub async fn apply(&self, update: &ServerUpdate) -> Result<Checksum, UpdateError> {
        let mut model = self.model.lock().await;
        let command = ServerUpdateCommand::prepare(&model, update.clone())?;
        let checksum = command.apply(&mut model)?;
        debug!(process = %self.handle, checksum = %checksum, "Server model updated");
        Ok(checksum)
    }

    pub async fn snapshot(&self) -> ServerModel {
        self.model.lock().await.clone()
    }

    pub async fn checksum(&self) -> Checksum {
        self.model.lock().await.checksum()
    }
}

/// In-memory registry of live processes
#[derive(Debug, Default)]
pub struct LocalInvoker {
    processes: RwLock<HashMap<ProcessHandle, Arc<ServerProcess>>>,
}

impl LocalInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process, replacing any previous one at the same handle
    pub async fn register(&self, process: Arc<ServerProcess>) {
        self.processes
            .write()
            .await
            .insert(process.handle().clone(), process);
    }

    pub async fn deregister(&self, handle: &ProcessHandle) -> Option<Arc<ServerProcess>> {
        self.processes.write().await.remove(handle)
    }

    pub async fn process(&self, handle: &ProcessHandle) -> Option<Arc<ServerProcess>> {
        self.processes.read().await.get(handle).cloned()
    }
}

#[async_trait]
impl RemoteInvoker for LocalInvoker {
    async fn invoke(
        &self,
        target: &ProcessHandle,
        update: &ServerUpdate,
    ) -> Result<Checksum, DispatchError> {
        let process = self
            .process(target)
            .await
            .ok_or_else(|| DispatchError::Unreachable(format!("no process registered at {target}")))?;

        process
            .apply(update)
            .await
            .map_err(|e| DispatchError::Rejected(e.to_string()))
    }
}
