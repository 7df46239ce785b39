//! Error types for the fan-in worker pool.
//!
//! This module defines the central `Error` enum, which captures every failure
//! a run can surface to its caller. Nothing here is retried: configuration
//! errors are rejected before any task is spawned, and every other variant is
//! a fatal condition that aborts the run.
//!
//! ## Error Cases
//! - `InvalidConfig`: The run configuration was rejected before spawning.
//! - `ChannelError`: A send or receive failed because the peer went away.
//! - `UnknownWorker`: A message or signal named a worker that was never
//!   spawned.
//! - `DuplicateCompletion`: A worker signalled completion more than once.
//! - `OutOfOrder`: A worker's payloads did not arrive in sequence order.
//! - `PayloadCountMismatch`: A worker delivered more or fewer payloads than
//!   its operation count implies.
//! - `Sink`: The aggregator could not write to its output sink.
//! - `TaskFailed`: A spawned task panicked or was aborted.
//! - `Cancelled`: The run was cancelled through its shutdown token.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for a fan-in run.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The run configuration is invalid.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Internal channel send/receive failure (e.g., closed stream).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// A message or completion signal carried an id that was never spawned.
    #[error("Unknown worker [{worker_id}]")]
    UnknownWorker { worker_id: String },

    /// A worker signalled completion twice.
    #[error("Duplicate completion signal from worker [{worker_id}]")]
    DuplicateCompletion { worker_id: String },

    /// A payload arrived with a sequence number other than the next expected
    /// one.
    #[error("Worker [{worker_id}] sent msg-{got}, expected msg-{expected}")]
    OutOfOrder {
        worker_id: String,
        expected: u64,
        got: u64,
    },

    /// A worker did not deliver exactly `operation_count + 1` payloads.
    #[error("Worker [{worker_id}] delivered {delivered} payloads, expected {expected}")]
    PayloadCountMismatch {
        worker_id: String,
        expected: u64,
        delivered: u64,
    },

    /// Writing an aggregated line to the output sink failed.
    #[error("Sink error: {context}")]
    Sink { context: String },

    /// A spawned task panicked or was aborted.
    #[error("Task failed: {context}")]
    TaskFailed { context: String },

    /// The run was cancelled before every worker completed.
    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn channel(context: impl Into<String>) -> Self {
        Self::ChannelError {
            context: context.into(),
        }
    }
}
