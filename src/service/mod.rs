// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Configuration Management
//!
//! Coordinates the pure update layer, the single-writer model stores and the
//! update applier.
//!
//! # Architecture
//!
//! ```text
//! Client Request
//!     ↓
//! Service Layer (this module)
//!     ↓
//! ModelStore: UpdateCommand → apply → compensation + translation
//!     ↓ (lock released)
//! ServerInventory: TargetScope → live process handles
//!     ↓
//! UpdateApplier → RemoteInvoker (in-memory or NATS) → live processes
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_fleet_config::service::{ConfigurationService, PropagationService};
//!
//! let service = PropagationService::new(domain, applier);
//! service.register_server(ProcessHandle::new("host-a", "server-one"), "main").await;
//!
//! let propagation = service.update_domain(update).await?;
//! // the domain model already reflects the change here
//! let outcome = propagation.outcome().await;
//! ```

pub mod propagation;

pub use propagation::{
    ConfigurationService, Propagation, PropagationService, ServiceError, ServiceResult,
};
