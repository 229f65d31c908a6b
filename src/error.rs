//! Error types surfaced across the move queue / flush boundary.
//!
//! Mirrors the error-handling design used elsewhere in this codebase: a small,
//! `thiserror`-derived enum per failure domain rather than one catch-all type, so a host
//! integrator can match on exactly the failure kind it cares about.

use thiserror::Error;

/// A failure reported by the external step sink when appending a step.
///
/// The solver does not interpret this value beyond propagating it; it is whatever the sink
/// chooses to report (a full hardware queue, an invalid move reference, etc).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("step sink rejected append (code {0})")]
pub struct SinkError(pub i32);

/// The move queue failed its sentinel precondition check.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// No queue has been attached to this stepper yet.
    #[error("no move queue attached to this stepper")]
    NotAttached,
    /// The queue's head/tail sentinels are missing or the moves are not contiguous in time.
    #[error("move queue sentinels are malformed")]
    MalformedSentinels,
    /// The arena's fixed capacity was exceeded.
    #[error("move queue is full")]
    Full,
}

/// The result of a `flush` call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushError {
    /// The step sink rejected an append; the flush stopped at that point.
    #[error("flush aborted by sink: {0}")]
    Sink(#[from] SinkError),
    /// The move queue was malformed; the flush could not proceed at all.
    #[error("flush aborted by queue error: {0}")]
    Queue(#[from] QueueError),
}
