// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Propagation Service
//!
//! Owns the domain model and every host model, and pushes the server-level
//! consequences of each change to the live processes that observe it.
//!
//! # Transaction Semantics
//!
//! Each service call is one transaction on one model:
//! 1. Lock the model store
//! 2. Apply the command (checksum-guarded)
//! 3. Derive compensation and server-tier translation from the snapshot
//! 4. Release the lock
//! 5. Resolve targets from the inventory and start the fan-out
//!
//! The call returns once step 5 has started. The model change is already
//! visible to readers while live processes are still being updated; the
//! returned [`Propagation`] can be awaited for the fan-out result.
//!
//! Fan-outs leave in commit order. A fan-out that reaches any process waits
//! for the previous one to finish, so a live process never sees an older
//! change after a newer one.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::applier::{
    FanOutOutcome, LoggingResultHandler, ProcessHandle, RemoteInvoker, ServerInventory,
    UpdateApplier, UpdateResultHandler,
};
use crate::config::PropagationConfig;
use crate::document;
use crate::errors::InfrastructureError;
use crate::model::{DomainModel, HostModel};
use crate::store::{Execution, ModelStore, DEFAULT_HISTORY_LIMIT};
use crate::update::{
    DomainUpdate, DomainUpdateCommand, HostUpdate, ModelUpdate, TargetScope, UpdateError,
};

/// Service layer result type
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service layer errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The update itself failed
    #[error("Update error: {0}")]
    Update(#[from] UpdateError),

    /// Document or transport failure
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] InfrastructureError),

    #[error("Unknown host: {0}")]
    UnknownHost(String),

    #[error("Host already managed: {0}")]
    DuplicateHost(String),
}

/// Completion signal of the most recently started fan-out
type DispatchTail = Option<oneshot::Receiver<()>>;

/// A committed model change and its in-flight fan-out
#[derive(Debug)]
pub struct Propagation<U> {
    pub execution: Execution<U>,
    /// Live processes the fan-out was started for
    pub targets: Vec<ProcessHandle>,
    dispatch: JoinHandle<FanOutOutcome>,
}

impl<U> Propagation<U> {
    pub fn command_id(&self) -> Uuid {
        self.execution.command_id
    }

    /// Wait for every target to report
    pub async fn outcome(self) -> FanOutOutcome {
        match self.dispatch.await {
            Ok(outcome) => outcome,
            Err(e) => FanOutOutcome::aborted(self.targets, &e.to_string()),
        }
    }
}

/// Configuration management operations
#[async_trait]
pub trait ConfigurationService: Send + Sync {
    /// Apply a domain operation against the current domain model
    async fn update_domain(&self, operation: DomainUpdate) -> ServiceResult<Propagation<DomainUpdate>>;

    /// Apply a domain command prepared elsewhere
    ///
    /// # Errors
    /// `ConcurrentModification` if the domain changed since the command was
    /// prepared.
    async fn execute_domain_command(
        &self,
        command: DomainUpdateCommand,
    ) -> ServiceResult<Propagation<DomainUpdate>>;

    async fn update_host(
        &self,
        host: &str,
        operation: HostUpdate,
    ) -> ServiceResult<Propagation<HostUpdate>>;

    /// Undo the most recent domain change, if any
    async fn rollback_domain(&self) -> ServiceResult<Option<Propagation<DomainUpdate>>>;

    async fn rollback_host(&self, host: &str) -> ServiceResult<Option<Propagation<HostUpdate>>>;

    async fn domain_snapshot(&self) -> DomainModel;

    async fn host_snapshot(&self, host: &str) -> ServiceResult<HostModel>;
}

/// [`ConfigurationService`] backed by in-memory model stores and an
/// [`UpdateApplier`]
pub struct PropagationService<I: ?Sized> {
    domain: ModelStore<DomainUpdate>,
    hosts: RwLock<BTreeMap<String, Arc<ModelStore<HostUpdate>>>>,
    inventory: RwLock<ServerInventory>,
    applier: UpdateApplier<I>,
    handler: Arc<dyn UpdateResultHandler<Uuid>>,
    history_limit: usize,
    /// Held from commit until the fan-out is queued
    dispatch_tail: Mutex<DispatchTail>,
}

impl<I: RemoteInvoker + ?Sized + 'static> PropagationService<I> {
    pub fn new(domain: DomainModel, applier: UpdateApplier<I>) -> Self {
        Self::with_history_limit(domain, applier, DEFAULT_HISTORY_LIMIT)
    }

    /// Service with dispatch timeout and history bound taken from `config`
    pub fn from_config(domain: DomainModel, invoker: Arc<I>, config: &PropagationConfig) -> Self {
        Self::with_history_limit(
            domain,
            UpdateApplier::from_config(invoker, config),
            config.history_limit,
        )
    }

    pub fn with_history_limit(
        domain: DomainModel,
        applier: UpdateApplier<I>,
        history_limit: usize,
    ) -> Self {
        Self {
            domain: ModelStore::with_history_limit(domain, history_limit),
            hosts: RwLock::new(BTreeMap::new()),
            inventory: RwLock::new(ServerInventory::new()),
            applier,
            handler: Arc::new(LoggingResultHandler),
            history_limit,
            dispatch_tail: Mutex::new(None),
        }
    }

    /// Replace the default logging handler
    ///
    /// The handler receives the command id as context.
    pub fn with_result_handler(mut self, handler: Arc<dyn UpdateResultHandler<Uuid>>) -> Self {
        self.handler = handler;
        self
    }

    /// Start managing a host model
    ///
    /// The host stays addressed by this name even if a later update renames it.
    pub async fn add_host(&self, model: HostModel) -> ServiceResult<()> {
        let name = model.name().to_string();
        let mut hosts = self.hosts.write().await;
        if hosts.contains_key(&name) {
            return Err(ServiceError::DuplicateHost(name));
        }
        hosts.insert(
            name.clone(),
            Arc::new(ModelStore::with_history_limit(model, self.history_limit)),
        );
        info!(host = %name, "Host added");
        Ok(())
    }

    /// Parse, validate and add a host document
    pub async fn add_host_document(&self, text: &str) -> ServiceResult<()> {
        let model: HostModel = document::parse(text)?;
        self.add_host(model).await
    }

    /// Record a live process as a member of `group`
    pub async fn register_server(&self, handle: ProcessHandle, group: impl Into<String>) {
        let group = group.into();
        info!(process = %handle, group = %group, "Server registered");
        self.inventory.write().await.register(handle, group);
    }

    pub async fn deregister_server(&self, handle: &ProcessHandle) -> bool {
        self.inventory.write().await.deregister(handle).is_some()
    }

    async fn host_store(&self, host: &str) -> ServiceResult<Arc<ModelStore<HostUpdate>>> {
        self.hosts
            .read()
            .await
            .get(host)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownHost(host.to_string()))
    }

    async fn propagate<U: ModelUpdate>(
        &self,
        execution: Execution<U>,
        tail: &mut DispatchTail,
    ) -> Propagation<U> {
        let targets = self.inventory.read().await.resolve(&execution.scope);
        let update = execution.server_update.clone().filter(|_| !targets.is_empty());

        let ordering = (!targets.is_empty()).then(|| {
            let (done, signal) = oneshot::channel();
            (tail.replace(signal), done)
        });

        let applier = self.applier.clone();
        let handler = Arc::clone(&self.handler);
        let context = execution.command_id;
        let dispatch_targets = targets.clone();
        let dispatch = tokio::spawn(async move {
            let done = match ordering {
                Some((previous, done)) => {
                    if let Some(previous) = previous {
                        // An error only means the earlier fan-out was torn down
                        let _ = previous.await;
                    }
                    Some(done)
                }
                None => None,
            };
            let outcome = applier.apply(update, dispatch_targets, handler, context).await;
            if let Some(done) = done {
                let _ = done.send(());
            }
            outcome
        });

        Propagation {
            execution,
            targets,
            dispatch,
        }
    }
}

/// Address host-scoped dispatch by the name the service manages the host under
fn addressed_to(mut execution: Execution<HostUpdate>, host: &str) -> Execution<HostUpdate> {
    if let TargetScope::Host(name) = &mut execution.scope {
        *name = host.to_string();
    }
    execution
}

#[async_trait]
impl<I: RemoteInvoker + ?Sized + 'static> ConfigurationService for PropagationService<I> {
    async fn update_domain(&self, operation: DomainUpdate) -> ServiceResult<Propagation<DomainUpdate>> {
        let mut tail = self.dispatch_tail.lock().await;
        let execution = self.domain.submit(operation).await?;
        Ok(self.propagate(execution, &mut tail).await)
    }

    async fn execute_domain_command(
        &self,
        command: DomainUpdateCommand,
    ) -> ServiceResult<Propagation<DomainUpdate>> {
        let mut tail = self.dispatch_tail.lock().await;
        let execution = self.domain.execute(command).await?;
        Ok(self.propagate(execution, &mut tail).await)
    }

    async fn update_host(
        &self,
        host: &str,
        operation: HostUpdate,
    ) -> ServiceResult<Propagation<HostUpdate>> {
        let store = self.host_store(host).await?;
        let mut tail = self.dispatch_tail.lock().await;
        let execution = store.submit(operation).await?;
        Ok(self.propagate(addressed_to(execution, host), &mut tail).await)
    }

    async fn rollback_domain(&self) -> ServiceResult<Option<Propagation<DomainUpdate>>> {
        let mut tail = self.dispatch_tail.lock().await;
        match self.domain.rollback_last().await? {
            Some(execution) => Ok(Some(self.propagate(execution, &mut tail).await)),
            None => Ok(None),
        }
    }

    async fn rollback_host(&self, host: &str) -> ServiceResult<Option<Propagation<HostUpdate>>> {
        let store = self.host_store(host).await?;
        let mut tail = self.dispatch_tail.lock().await;
        match store.rollback_last().await? {
            Some(execution) => {
                let execution = addressed_to(execution, host);
                Ok(Some(self.propagate(execution, &mut tail).await))
            }
            None => Ok(None),
        }
    }

    async fn domain_snapshot(&self) -> DomainModel {
        self.domain.snapshot().await
    }

    async fn host_snapshot(&self, host: &str) -> ServiceResult<HostModel> {
        Ok(self.host_store(host).await?.snapshot().await)
    }
}
