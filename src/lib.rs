// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration-change propagation for a multi-tier fleet
//!
//! A managed fleet is configured on three tiers: the domain (cluster-wide
//! profiles, server groups and deployments), hosts (JVMs, paths,
//! extensions), and the live server processes themselves. This crate keeps
//! the domain and host models, mutates them through checksum-guarded update
//! commands, and pushes the server-level consequences of each change to the
//! live processes that observe it.
//!
//! # Layers
//!
//! - [`checksum`]: deterministic structural checksums
//! - [`model`]: the three tiers' configuration models
//! - [`update`]: update commands, compensation and server-tier translation
//! - [`store`]: single-writer model execution with audit history
//! - [`applier`]: concurrent fan-out to live processes
//! - [`nats`]: NATS request/reply transport for server updates
//! - [`document`]: JSON configuration documents
//! - [`service`]: the propagation coordinator

pub mod applier;
pub mod checksum;
pub mod config;
pub mod document;
pub mod errors;
pub mod model;
pub mod nats;
pub mod service;
pub mod store;
pub mod update;

// Re-export commonly used types
pub use applier::{
    DispatchError, FanOutOutcome, LocalInvoker, LoggingResultHandler, ProcessHandle,
    RemoteInvoker, ServerInventory, ServerProcess, TargetOutcome, TargetResult, UpdateApplier,
    UpdateResultHandler,
};
pub use checksum::{Checksum, ChecksumBuilder};
pub use config::PropagationConfig;
pub use errors::{InfrastructureError, InfrastructureResult};
pub use model::{
    ConfigurationModel, DeploymentIdentity, DomainModel, HostModel, ModelElement, ServerModel,
    Tier,
};
pub use nats::{NatsClient, NatsConfig, NatsInvoker, UpdateListener};
pub use service::{ConfigurationService, Propagation, PropagationService, ServiceError, ServiceResult};
pub use store::{AppliedUpdate, Execution, ModelStore};
pub use update::{
    DomainUpdate, DomainUpdateCommand, HostUpdate, HostUpdateCommand, ModelUpdate, PropertyChange,
    ServerUpdate, ServerUpdateCommand, TargetScope, UpdateCommand, UpdateError,
};
