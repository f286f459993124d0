// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS transport for server updates
//!
//! Each live server process listens on its own request subject:
//!
//! ```text
//! {prefix}.{host}.{server}.update
//!
//! request:  UpdateRequest { update: ServerUpdate }
//! reply:    UpdateReply   { result: Ok(checksum) | Err(DispatchError) }
//! ```
//!
//! [`NatsInvoker`] is the controller side, [`UpdateListener`] the agent side.

use async_nats::{Client, ConnectOptions, RequestError, RequestErrorKind, Subscriber};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::applier::{DispatchError, ProcessHandle, RemoteInvoker, ServerProcess};
use crate::checksum::Checksum;
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::update::{ModelUpdate, ServerUpdate};

/// Configuration for NATS connection
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "fleet-client".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Request subject for one live process
pub fn update_subject(prefix: &str, handle: &ProcessHandle) -> String {
    format!("{}.{}.{}.update", prefix, handle.host, handle.server)
}

/// Wire request carrying one server update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub update: ServerUpdate,
}

/// Wire reply from a live process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReply {
    pub result: Result<Checksum, DispatchError>,
}

/// Thin JSON wrapper over the NATS client
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    pub async fn new(config: NatsConfig) -> InfrastructureResult<Self> {
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout)
            .request_timeout(Some(config.request_timeout));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| InfrastructureError::NatsConnection(e.to_string()))?;

        info!(servers = ?config.servers, name = %config.name, "Connected to NATS");

        Ok(Self { client })
    }

    /// Publish a JSON message to a subject
    pub async fn publish<T>(&self, subject: &str, message: &T) -> InfrastructureResult<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| InfrastructureError::NatsPublish(e.to_string()))?;

        debug!(subject, "Published message");
        Ok(())
    }

    pub async fn subscribe(&self, subject: &str) -> InfrastructureResult<Subscriber> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| InfrastructureError::NatsSubscribe(e.to_string()))?;

        info!(subject, "Subscribed");
        Ok(subscriber)
    }

    /// Underlying client for advanced operations
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// [`RemoteInvoker`] that reaches agents over NATS request/reply
#[derive(Clone)]
pub struct NatsInvoker {
    client: NatsClient,
    subject_prefix: String,
}

impl NatsInvoker {
    pub fn new(client: NatsClient, subject_prefix: impl Into<String>) -> Self {
        Self {
            client,
            subject_prefix: subject_prefix.into(),
        }
    }
}

#[async_trait]
impl RemoteInvoker for NatsInvoker {
    async fn invoke(
        &self,
        target: &ProcessHandle,
        update: &ServerUpdate,
    ) -> Result<Checksum, DispatchError> {
        let subject = update_subject(&self.subject_prefix, target);
        let payload = serde_json::to_vec(&UpdateRequest {
            update: update.clone(),
        })
        .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let response = self
            .client
            .inner()
            .request(subject.clone(), payload.into())
            .await
            .map_err(|e| request_failure(&e, &subject))?;

        let reply: UpdateReply = serde_json::from_slice(&response.payload)
            .map_err(|e| DispatchError::Transport(format!("malformed reply: {e}")))?;
        reply.result
    }
}

/// Classify a failed request so that a missing reply stays retryable
fn request_failure(error: &RequestError, subject: &str) -> DispatchError {
    match error.kind() {
        RequestErrorKind::NoResponders => {
            DispatchError::Unreachable(format!("no agent listening on {subject}"))
        }
        RequestErrorKind::TimedOut => DispatchError::TimedOut(format!("no reply on {subject}")),
        RequestErrorKind::Other => DispatchError::Transport(error.to_string()),
    }
}

/// Agent side: answers update requests for one server process
pub struct UpdateListener {
    client: NatsClient,
    process: Arc<ServerProcess>,
    subject: String,
}

impl UpdateListener {
    pub fn new(client: NatsClient, process: Arc<ServerProcess>, subject_prefix: &str) -> Self {
        let subject = update_subject(subject_prefix, process.handle());
        Self {
            client,
            process,
            subject,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Subscribe and answer requests on a background task
    ///
    /// The task ends when the subscription closes.
    pub async fn spawn(self) -> InfrastructureResult<JoinHandle<()>> {
        let mut subscriber = self.client.subscribe(&self.subject).await?;

        Ok(tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let Some(reply_to) = msg.reply.as_ref().map(|r| r.to_string()) else {
                    warn!(subject = %self.subject, "Dropping update request without reply subject");
                    continue;
                };

                let reply = self.handle(&msg.payload).await;
                if let Err(e) = self.client.publish(&reply_to, &reply).await {
                    error!(subject = %self.subject, error = %e, "Failed to send update reply");
                }
            }
            info!(subject = %self.subject, "Update subscription closed");
        }))
    }

    async fn handle(&self, payload: &[u8]) -> UpdateReply {
        let request: UpdateRequest = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(subject = %self.subject, error = %e, "Malformed update request");
                return UpdateReply {
                    result: Err(DispatchError::Rejected(format!("malformed request: {e}"))),
                };
            }
        };

        let operation = request.update.operation();
        let result = match self.process.apply(&request.update).await {
            Ok(checksum) => {
                info!(process = %self.process.handle(), operation, checksum = %checksum, "Applied server update");
                Ok(checksum)
            }
            Err(e) => {
                warn!(process = %self.process.handle(), operation, error = %e, "Rejected server update");
                Err(DispatchError::Rejected(e.to_string()))
            }
        };
        UpdateReply { result }
    }
}
