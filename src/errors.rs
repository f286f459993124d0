// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for infrastructure operations
//!
//! Covers the concerns around the update core: the NATS channel, the
//! configuration document, and runtime configuration. Update failures live in
//! [`crate::update::UpdateError`].

use thiserror::Error;

/// Errors that can occur in infrastructure operations
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// NATS publish or request error
    #[error("NATS publish error: {0}")]
    NatsPublish(String),

    /// NATS subscribe error
    #[error("NATS subscribe error: {0}")]
    NatsSubscribe(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration document could not be read or written
    #[error("Document I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsed document violates a model invariant
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] crate::model::ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for infrastructure operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl From<async_nats::Error> for InfrastructureError {
    fn from(err: async_nats::Error) -> Self {
        InfrastructureError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for InfrastructureError {
    fn from(err: serde_json::Error) -> Self {
        InfrastructureError::Serialization(err.to_string())
    }
}
