//! The flush driver (component G) — `StepperKinematics`, the type external callers hold.
//!
//! Ties every other component together: given a target absolute time, decides which moves (and
//! which sub-ranges of each) are worth handing to the range solver, including the pre- and
//! post-activity padding that primes the downstream step compressor.

use tracing::{debug, trace, warn};

use crate::error::FlushError;
use crate::projection::{Axis, Projection};
use crate::queue::{Move, MoveQueue};
use crate::range_solver::{solve_range, SolverState};
use crate::reversal_filter::{ReversalFilter, CHECK};
use crate::sink::StepSink;
use crate::EPSILON;

/// Per-motor state and the entry point for solving.
///
/// `P` is the kinematic projection this stepper tracks; `S` is the step sink steps are forwarded
/// to. Both are bound statically (no `dyn`) so a hot flush loop never pays for virtual dispatch.
pub struct StepperKinematics<P, S> {
    projection: P,
    sink: S,
    queue: Option<MoveQueue>,
    cursor: usize,

    active_flags: Axis,
    step_dist: f64,
    commanded_pos: f64,

    last_flush_time: f64,
    last_move_time: f64,
    gen_steps_pre_active: f64,
    gen_steps_post_active: f64,

    filter: ReversalFilter,
    solver_state: SolverState,
}

impl<P, S> StepperKinematics<P, S>
where
    P: Projection,
    S: StepSink,
{
    /// Creates a stepper with no padding and no queue attached yet.
    pub fn new(projection: P, sink: S, step_dist: f64, active_flags: Axis) -> Self {
        StepperKinematics {
            projection,
            sink,
            queue: None,
            cursor: 0,
            active_flags,
            step_dist,
            commanded_pos: 0.0,
            last_flush_time: 0.0,
            last_move_time: 0.0,
            gen_steps_pre_active: 0.0,
            gen_steps_post_active: 0.0,
            filter: ReversalFilter::new(),
            solver_state: SolverState::default(),
        }
    }

    /// Sets the pre- and post-activity padding windows, in seconds.
    pub fn with_padding(mut self, pre_active: f64, post_active: f64) -> Self {
        self.gen_steps_pre_active = pre_active;
        self.gen_steps_post_active = post_active;
        self
    }

    /// Attaches (or replaces) the move queue this stepper solves against. Resets the internal
    /// cursor to the queue's start; callers are expected to also reset `last_flush_time` if the
    /// new queue doesn't pick up exactly where the old one left off.
    pub fn set_queue(&mut self, queue: MoveQueue) {
        self.queue = Some(queue);
        self.cursor = 0;
    }

    /// Replaces the step sink and the scalar distance per full step.
    pub fn set_sink(&mut self, sink: S, step_dist: f64) {
        self.sink = sink;
        self.step_dist = step_dist;
    }

    /// Whether this stepper is registered for the given Cartesian axis letter.
    pub fn is_active_axis(&self, axis: char) -> bool {
        Axis::from_letter(axis)
            .map(|a| self.active_flags.contains(a))
            .unwrap_or(false)
    }

    /// The motor's scalar position as last ordered.
    pub fn get_commanded_pos(&self) -> f64 {
        self.commanded_pos
    }

    /// Evaluates the projection at a stationary point, without affecting `commanded_pos`.
    pub fn calc_position_from_coord(&self, x: f64, y: f64, z: f64) -> f64 {
        let mv = Move::stationary(0.0, 1.0, [x, y, z]);
        self.projection.eval(&mv, mv.move_t / 2.0)
    }

    /// Sets `commanded_pos` to the projection of the given Cartesian point.
    pub fn set_position(&mut self, x: f64, y: f64, z: f64) {
        self.commanded_pos = self.calc_position_from_coord(x, y, z);
    }

    /// Borrows the step sink, mainly so host integrators and tests can read back whatever state
    /// their sink implementation records.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrows the step sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Returns the `print_time` of the first move, within `[last_flush_time, flush_time]`, for
    /// which this stepper is active; `0.0` if there is none.
    pub fn check_active(&self, flush_time: f64) -> f64 {
        let queue = match &self.queue {
            Some(q) => q,
            None => return 0.0,
        };
        let mut idx = self.cursor;
        while let Some(mv) = queue.get(idx) {
            if mv.print_time >= flush_time {
                break;
            }
            if mv.end_time() > self.last_flush_time && mv.active_for(self.active_flags) {
                return mv.print_time;
            }
            idx += 1;
        }
        0.0
    }

    /// Drives solving up to `flush_time`, emitting every required step for moves already queued.
    ///
    /// A no-op (not an error) if no queue has been attached yet.
    pub fn flush(&mut self, flush_time: f64) -> Result<(), FlushError> {
        if self.queue.is_none() {
            trace!("flush called with no queue attached, nothing to do");
            return Ok(());
        }
        self.queue.as_ref().unwrap().check_sentinels()?;
        debug!(flush_time, "starting flush");

        while let Some(mv) = self.queue.as_ref().unwrap().get(self.cursor) {
            if mv.end_time() <= self.last_flush_time {
                self.cursor += 1;
            } else {
                break;
            }
        }

        let post = self.gen_steps_post_active.max(CHECK);
        let mut force_steps_time = self.last_move_time + post;

        loop {
            if self.last_flush_time >= flush_time {
                break;
            }
            let mv: Move = match self.queue.as_ref().unwrap().get(self.cursor) {
                Some(mv) => *mv,
                None => break,
            };

            let start = mv.print_time.max(self.last_flush_time);
            let end = (mv.print_time + mv.move_t).min(flush_time);

            if mv.active_for(self.active_flags) {
                if self.gen_steps_pre_active > 0.0 && start > self.last_flush_time + EPSILON {
                    trace!(start, "backfilling pre-active padding");
                    force_steps_time = start;
                    self.last_flush_time =
                        self.last_flush_time.max(start - self.gen_steps_pre_active);
                    while self.cursor > 0 {
                        let current = *self
                            .queue
                            .as_ref()
                            .unwrap()
                            .get(self.cursor)
                            .expect("cursor is within bounds");
                        if current.print_time > self.last_flush_time {
                            self.cursor -= 1;
                        } else {
                            break;
                        }
                    }
                    continue;
                }
                solve_range(
                    &mv,
                    start,
                    end,
                    &mut self.commanded_pos,
                    &mut self.solver_state,
                    self.step_dist,
                    &mut self.projection,
                    &mut self.filter,
                    &mut self.sink,
                )
                .map_err(|e| {
                    warn!(error = %e, "step sink rejected append during active range");
                    e
                })?;
                self.last_move_time = end;
                self.last_flush_time = end;
                force_steps_time = end + post;
            } else if start < force_steps_time {
                let clipped_end = end.min(force_steps_time);
                solve_range(
                    &mv,
                    start,
                    clipped_end,
                    &mut self.commanded_pos,
                    &mut self.solver_state,
                    self.step_dist,
                    &mut self.projection,
                    &mut self.filter,
                    &mut self.sink,
                )?;
                self.last_flush_time = clipped_end;
            }

            if flush_time + self.gen_steps_pre_active <= mv.print_time + mv.move_t {
                break;
            }
            self.cursor += 1;
        }

        // Once the queue has nothing left to offer up to `flush_time`, no further range solve
        // will ever get a chance to widen the reversal filter's window past a step still held
        // pending from the last range. Finalise it now rather than lose it.
        let queue_exhausted = match self.queue.as_ref().unwrap().get(self.cursor) {
            None => true,
            Some(mv) => {
                self.queue.as_ref().unwrap().get(self.cursor + 1).is_none()
                    && mv.end_time() <= flush_time
            }
        };
        if queue_exhausted && self.filter.has_pending() {
            trace!("queue exhausted, force-committing pending reversal-filter step");
            self.filter.force_commit(&mut self.sink).map_err(|e| {
                warn!(error = %e, "step sink rejected force-committed step");
                e
            })?;
        }

        Ok(())
    }
}
