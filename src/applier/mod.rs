// Copyright (c) 2025 - Cowboy AI, Inc.
//! Update Applier
//!
//! Fans one server-tier update out to a set of live processes and reports
//! back per target and in aggregate.
//!
//! ```text
//! apply(update, targets, handler, context)
//!     ├── spawn invoke(target₁) ──┐
//!     ├── spawn invoke(target₂) ──┼── each bounded by dispatch_timeout
//!     └── spawn invoke(targetₙ) ──┘
//!              │ as each finishes
//!              ├── handler.on_target(outcome, context)      × n
//!              └── handler.on_complete(fan_out, context)    × 1, last
//! ```
//!
//! Targets run concurrently and independently: one failure or timeout never
//! cancels or affects the others. There is no partial rollback across
//! targets; the aggregate reports what happened and callers decide.
//!
//! Dispatch tasks belong to the fan-out future. Dropping it before it
//! completes aborts every dispatch still in flight.

pub mod inventory;
pub mod invoker;
pub mod outcome;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::PropagationConfig;
use crate::update::{ModelUpdate, ServerUpdate};

pub use inventory::ServerInventory;
pub use invoker::{LocalInvoker, RemoteInvoker, ServerProcess};
pub use outcome::{DispatchError, FanOutOutcome, ProcessHandle, TargetOutcome, TargetResult};

/// Receives fan-out results
///
/// `on_target` is called exactly once per target, in completion order;
/// `on_complete` exactly once after every target has reported.
pub trait UpdateResultHandler<P>: Send + Sync {
    fn on_target(&self, outcome: &TargetOutcome, context: &P);

    fn on_complete(&self, outcome: &FanOutOutcome, context: &P);
}

/// Handler that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingResultHandler;

impl<P: std::fmt::Debug> UpdateResultHandler<P> for LoggingResultHandler {
    fn on_target(&self, outcome: &TargetOutcome, context: &P) {
        match &outcome.result {
            TargetResult::Applied(checksum) => {
                debug!(target_process = %outcome.target, checksum = %checksum, ?context, "Applied")
            }
            TargetResult::Unchanged => {
                debug!(target_process = %outcome.target, ?context, "Unchanged")
            }
            TargetResult::Failed(e) => {
                warn!(target_process = %outcome.target, error = %e, ?context, "Update failed")
            }
            TargetResult::TimedOut => {
                warn!(target_process = %outcome.target, ?context, "Update timed out")
            }
        }
    }

    fn on_complete(&self, outcome: &FanOutOutcome, context: &P) {
        info!(
            total = outcome.total(),
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            timed_out = outcome.timed_out(),
            ?context,
            "Fan-out complete"
        );
    }
}

/// Concurrent dispatcher over a [`RemoteInvoker`]
pub struct UpdateApplier<I: ?Sized> {
    invoker: Arc<I>,
    dispatch_timeout: Duration,
}

impl<I: ?Sized> Clone for UpdateApplier<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
            dispatch_timeout: self.dispatch_timeout,
        }
    }
}

impl<I: RemoteInvoker + ?Sized + 'static> UpdateApplier<I> {
    pub fn new(invoker: Arc<I>, dispatch_timeout: Duration) -> Self {
        Self {
            invoker,
            dispatch_timeout,
        }
    }

    pub fn from_config(invoker: Arc<I>, config: &PropagationConfig) -> Self {
        Self::new(invoker, config.dispatch_timeout)
    }

    pub fn invoker(&self) -> &Arc<I> {
        &self.invoker
    }

    pub fn dispatch_timeout(&self) -> Duration {
        self.dispatch_timeout
    }

    /// Dispatch `update` to every target and wait for all of them
    ///
    /// With no update every target reports [`TargetResult::Unchanged`]
    /// without being contacted. With no targets only `on_complete` fires.
    /// A channel timeout reported by the invoker counts as
    /// [`TargetResult::TimedOut`], the same as exceeding `dispatch_timeout`.
    pub async fn apply<P, H>(
        &self,
        update: Option<ServerUpdate>,
        targets: Vec<ProcessHandle>,
        handler: Arc<H>,
        context: P,
    ) -> FanOutOutcome
    where
        H: UpdateResultHandler<P> + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(targets.len());

        let Some(update) = update else {
            for target in targets {
                let outcome = TargetOutcome {
                    target,
                    result: TargetResult::Unchanged,
                };
                handler.on_target(&outcome, &context);
                outcomes.push(outcome);
            }
            let fan_out = FanOutOutcome::new(outcomes);
            handler.on_complete(&fan_out, &context);
            return fan_out;
        };

        debug!(
            operation = update.operation(),
            targets = targets.len(),
            "Dispatching server update"
        );

        let update = Arc::new(update);
        let mut tasks = JoinSet::new();
        for target in &targets {
            tasks.spawn(Self::dispatch_one(
                Arc::clone(&self.invoker),
                target.clone(),
                Arc::clone(&update),
                self.dispatch_timeout,
            ));
        }

        let mut unreported = targets;
        let mut abort_reason = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let Some(index) = unreported.iter().position(|t| *t == outcome.target) {
                        unreported.swap_remove(index);
                    }
                    handler.on_target(&outcome, &context);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(error = %e, "Dispatch task died");
                    abort_reason.get_or_insert_with(|| e.to_string());
                }
            }
        }

        // A dead task cannot name its target; whatever never reported died
        let reason = abort_reason.unwrap_or_default();
        for target in unreported {
            let outcome = TargetOutcome {
                target,
                result: TargetResult::Failed(DispatchError::Aborted(reason.clone())),
            };
            handler.on_target(&outcome, &context);
            outcomes.push(outcome);
        }

        let fan_out = FanOutOutcome::new(outcomes);
        handler.on_complete(&fan_out, &context);
        fan_out
    }

    async fn dispatch_one(
        invoker: Arc<I>,
        target: ProcessHandle,
        update: Arc<ServerUpdate>,
        limit: Duration,
    ) -> TargetOutcome {
        let result = match tokio::time::timeout(limit, invoker.invoke(&target, &update)).await {
            Ok(Ok(checksum)) => TargetResult::Applied(checksum),
            Ok(Err(DispatchError::TimedOut(reason))) => {
                debug!(process = %target, %reason, "Channel timed out");
                TargetResult::TimedOut
            }
            Ok(Err(e)) => TargetResult::Failed(e),
            Err(_) => TargetResult::TimedOut,
        };
        TargetOutcome { target, result }
    }
}
