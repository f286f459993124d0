// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime configuration
//!
//! Environment variables:
//!
//! | Variable | Default |
//! |---|---|
//! | `FLEET_NATS_URL` | `nats://localhost:4222` (comma-separated list accepted) |
//! | `FLEET_CLIENT_NAME` | `fleet-config` |
//! | `FLEET_DISPATCH_TIMEOUT_MS` | `5000` |
//! | `FLEET_SUBJECT_PREFIX` | `fleet.servers` |
//! | `FLEET_HISTORY_LIMIT` | `256` |

use std::env;
use std::time::Duration;

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::nats::NatsConfig;
use crate::store::DEFAULT_HISTORY_LIMIT;

/// Default per-target dispatch timeout
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default subject prefix for server update requests
pub const DEFAULT_SUBJECT_PREFIX: &str = "fleet.servers";

/// Configuration for the propagation pipeline
#[derive(Debug, Clone)]
pub struct PropagationConfig {
    /// NATS connection settings
    pub nats: NatsConfig,
    /// Upper bound on one target's dispatch
    pub dispatch_timeout: Duration,
    /// Prefix of `{prefix}.{host}.{server}.update` subjects
    pub subject_prefix: String,
    /// History entries kept per model store
    pub history_limit: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                name: "fleet-config".to_string(),
                ..NatsConfig::default()
            },
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl PropagationConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> InfrastructureResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> InfrastructureResult<Self> {
        let mut config = Self::default();

        if let Some(urls) = lookup("FLEET_NATS_URL") {
            config.nats.servers = urls
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect();
            if config.nats.servers.is_empty() {
                return Err(InfrastructureError::Configuration(
                    "FLEET_NATS_URL contains no server URL".to_string(),
                ));
            }
        }

        if let Some(name) = lookup("FLEET_CLIENT_NAME") {
            config.nats.name = name;
        }

        if let Some(millis) = lookup("FLEET_DISPATCH_TIMEOUT_MS") {
            let millis: u64 = millis.parse().map_err(|_| {
                InfrastructureError::Configuration(format!(
                    "FLEET_DISPATCH_TIMEOUT_MS must be a whole number of milliseconds, got {millis:?}"
                ))
            })?;
            config.dispatch_timeout = Duration::from_millis(millis);
        }

        if let Some(prefix) = lookup("FLEET_SUBJECT_PREFIX") {
            config.subject_prefix = prefix;
        }

        if let Some(limit) = lookup("FLEET_HISTORY_LIMIT") {
            config.history_limit = limit.parse().map_err(|_| {
                InfrastructureError::Configuration(format!(
                    "FLEET_HISTORY_LIMIT must be a non-negative integer, got {limit:?}"
                ))
            })?;
        }

        Ok(config)
    }
}
