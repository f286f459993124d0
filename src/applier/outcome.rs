// Copyright (c) 2025 - Cowboy AI, Inc.
//! Per-target results and their aggregate

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::checksum::Checksum;

/// Address of one live server process
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessHandle {
    pub host: String,
    pub server: String,
}

impl ProcessHandle {
    pub fn new(host: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            server: server.into(),
        }
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.server)
    }
}

/// Why one target did not apply an update
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DispatchError {
    /// Nothing answered at the target's address
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// The target answered but refused the update
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Channel failure while talking to the target
    #[error("Transport error: {0}")]
    Transport(String),

    /// The channel gave up waiting for the target's answer
    #[error("Timed out: {0}")]
    TimedOut(String),

    /// The dispatch task itself died
    #[error("Dispatch aborted: {0}")]
    Aborted(String),
}

/// Result of dispatching to one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "kebab-case")]
pub enum TargetResult {
    /// Applied; carries the process model's new checksum
    Applied(Checksum),
    /// Nothing to apply
    Unchanged,
    Failed(DispatchError),
    TimedOut,
}

impl TargetResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TargetResult::Applied(_) | TargetResult::Unchanged)
    }
}

/// One target together with its result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target: ProcessHandle,
    pub result: TargetResult,
}

/// Aggregate of a completed fan-out, in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutOutcome {
    pub outcomes: Vec<TargetOutcome>,
}

impl FanOutOutcome {
    pub fn new(outcomes: Vec<TargetOutcome>) -> Self {
        Self { outcomes }
    }

    /// Every target failed with the same reason
    pub(crate) fn aborted(targets: Vec<ProcessHandle>, reason: &str) -> Self {
        Self::new(
            targets
                .into_iter()
                .map(|target| TargetOutcome {
                    target,
                    result: TargetResult::Failed(DispatchError::Aborted(reason.to_string())),
                })
                .collect(),
        )
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, TargetResult::Failed(_)))
            .count()
    }

    pub fn timed_out(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result == TargetResult::TimedOut)
            .count()
    }

    /// True when every target succeeded (vacuously true for no targets)
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_success())
    }

    /// Targets worth retrying
    pub fn timed_out_targets(&self) -> Vec<&ProcessHandle> {
        self.outcomes
            .iter()
            .filter(|o| o.result == TargetResult::TimedOut)
            .map(|o| &o.target)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ProcessHandle, &DispatchError)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            TargetResult::Failed(e) => Some((&o.target, e)),
            _ => None,
        })
    }

    pub fn result_for(&self, target: &ProcessHandle) -> Option<&TargetResult> {
        self.outcomes
            .iter()
            .find(|o| &o.target == target)
            .map(|o| &o.result)
    }
}
