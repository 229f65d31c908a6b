//! The reversal filter (component D).
//!
//! Near a velocity zero-crossing, the range solver's bracket can oscillate by a fraction of a
//! microsecond, producing a step in one direction immediately followed by a reversal back. Both
//! are artifacts, not real motor motion, and must never reach the sink. This filter holds back
//! one candidate step at a time and only commits it once it is sure a same-window reversal isn't
//! coming.

use crate::sink::{Direction, StepSink};
use tracing::trace;

/// How far past the last solved activity the flush driver keeps evaluating, so that a pending
/// step is either finalised or naturally discarded. Strictly greater than [`FILTER`].
pub const CHECK: f64 = 1.0e-3;

/// The filter window: two opposite-direction candidates closer than this (in combined
/// move-time + step-time distance) are both discarded as noise.
pub const FILTER: f64 = 0.75e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pending {
    dir: Direction,
    move_time: f64,
    step_time: f64,
}

/// Per-stepper reversal-suppression state machine.
#[derive(Debug, Default)]
pub struct ReversalFilter {
    pending: Option<Pending>,
}

impl ReversalFilter {
    pub fn new() -> Self {
        ReversalFilter { pending: None }
    }

    /// Offers a candidate step to the filter. May commit a previously pending step to `sink`,
    /// discard both the pending and the new step as a reversal artifact, or simply hold the new
    /// step as pending.
    pub fn append<S: StepSink>(
        &mut self,
        sink: &mut S,
        dir: Direction,
        move_time: f64,
        step_time: f64,
    ) -> Result<(), crate::error::SinkError> {
        if let Some(p) = self.pending {
            let gap = (move_time - p.move_time) + (step_time - p.step_time);
            if dir != p.dir && gap < FILTER {
                trace!(gap, "reversal filter suppressed step pair");
                self.pending = None;
                return Ok(());
            }
            self.commit(sink)?;
        }
        self.pending = Some(Pending {
            dir,
            move_time,
            step_time,
        });
        Ok(())
    }

    /// Called at the end of a range solve: finalises the pending step if enough time has passed
    /// that no reversal can still arrive within the filter window, otherwise leaves it pending
    /// for the next range.
    pub fn flush<S: StepSink>(
        &mut self,
        sink: &mut S,
        move_time: f64,
        step_time: f64,
    ) -> Result<(), crate::error::SinkError> {
        if let Some(p) = self.pending {
            let gap = (move_time - p.move_time) + (step_time - p.step_time);
            if gap >= FILTER {
                self.commit(sink)?;
            }
        }
        Ok(())
    }

    /// Whether a step is currently held back, awaiting either commit or discard.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Commits the pending step immediately, bypassing the window check in [`Self::flush`].
    ///
    /// Used when the range solver can prove no reversal is coming (the projection has stopped
    /// moving), so holding the step back any longer would only risk losing it to a later,
    /// unrelated direction change.
    pub fn force_commit<S: StepSink>(&mut self, sink: &mut S) -> Result<(), crate::error::SinkError> {
        self.commit(sink)
    }

    fn commit<S: StepSink>(&mut self, sink: &mut S) -> Result<(), crate::error::SinkError> {
        if let Some(p) = self.pending.take() {
            sink.append(p.dir, p.move_time, p.step_time)?;
        }
        Ok(())
    }
}
