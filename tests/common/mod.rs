//! Shared fixtures for the integration test suite.

use itersolve::{Direction, SinkError, StepSink};

/// A step as recorded by [`RecordingSink`], in absolute time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedStep {
    pub direction: Direction,
    pub time: f64,
}

/// An in-memory sink. Optionally fails on a given call index to exercise the error path.
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
