//! The step sink (component C) — the external step compressor this crate feeds.
//!
//! The sink is out of scope for this crate (it turns `(direction, time)` events into
//! hardware-ready instructions); only the contract it must satisfy lives here.

use crate::error::SinkError;

/// A stepper's logical direction. Flips between runs of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }
}

/// Consumes surviving `(direction, move print_time, step_time)` triples.
///
/// `step_time` is relative to the move's `print_time`, matching the reversal filter and range
/// solver's internal bookkeeping. Implementations may fail (hardware-queue overflow, an invalid
/// move reference); the solver propagates that failure without retry or rollback.
pub trait StepSink {
    /// Appends one step. `step_time` is relative to `move_print_time`.
    fn append(
        &mut self,
        direction: Direction,
        move_print_time: f64,
        step_time: f64,
    ) -> Result<(), SinkError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A step as recorded by [`RecordingSink`], in absolute time.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct RecordedStep {
        pub direction: Direction,
        pub time: f64,
    }

    /// An in-memory sink used throughout this crate's test suite. Optionally fails on a given
    /// call index, to exercise the sink-error path.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub steps: Vec<RecordedStep>,
        pub fail_on_call: Option<usize>,
        calls: usize,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(call_index: usize) -> Self {
            RecordingSink {
                fail_on_call: Some(call_index),
                ..Default::default()
            }
        }
    }

    impl StepSink for RecordingSink {
        fn append(
            &mut self,
            direction: Direction,
            move_print_time: f64,
            step_time: f64,
        ) -> Result<(), SinkError> {
            let idx = self.calls;
            self.calls += 1;
            if self.fail_on_call == Some(idx) {
                return Err(SinkError(7));
            }
            self.steps.push(RecordedStep {
                direction,
                time: move_print_time + step_time,
            });
            Ok(())
        }
    }
}
