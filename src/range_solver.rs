//! The range solver (component F) — the largest single piece of the core.
//!
//! Walks one move across `[move_start, move_end]` in absolute time, maintaining a search
//! bracket, the current direction, and an adaptive probe size ("seek delta"), emitting
//! candidate steps through the reversal filter as it goes.

use crate::error::SinkError;
use crate::projection::Projection;
use crate::queue::Move;
use crate::reversal_filter::ReversalFilter;
use crate::rootfind::{false_position, Bracket};
use crate::sink::{Direction, StepSink};
use crate::{EPSILON, SEEK_DELTA_INITIAL};

/// Persistent per-stepper solver state, carried across range-solver calls (and across moves).
#[derive(Debug, Clone, Copy)]
pub struct SolverState {
    pub sdir: Direction,
    pub seek_delta: f64,
    is_dir_change: bool,
}

impl Default for SolverState {
    fn default() -> Self {
        SolverState {
            sdir: Direction::Positive,
            seek_delta: SEEK_DELTA_INITIAL,
            is_dir_change: false,
        }
    }
}

/// Solves `mv` between absolute times `move_start` and `move_end`.
///
/// `commanded_pos` and `state` are read on entry and updated on a successful return; they are
/// left unmodified if the sink rejects a step, per the "no partial rollback, but no further
/// progress either" error contract.
#[allow(clippy::too_many_arguments)]
pub fn solve_range<P, S>(
    mv: &Move,
    move_start: f64,
    move_end: f64,
    commanded_pos: &mut f64,
    state: &mut SolverState,
    step_dist: f64,
    projection: &mut P,
    filter: &mut ReversalFilter,
    sink: &mut S,
) -> Result<(), SinkError>
where
    P: Projection,
    S: StepSink,
{
    let start = move_start - mv.print_time;
    let end = move_end - mv.print_time;
    let half = step_dist.abs() / 2.0;

    let mut last_t = start;
    let mut last_p = *commanded_pos;
    let mut low = Bracket { t: last_t, p: last_p };
    let mut high = low;

    'walk: loop {
        let diff = high.p - last_p;
        let dist = match state.sdir {
            Direction::Positive => diff,
            Direction::Negative => -diff,
        };

        if dist >= half {
            let signed_half = if state.sdir == Direction::Positive {
                half
            } else {
                -half
            };
            let target = last_p + signed_half;
            let next = false_position(low, high, target, |t| projection.eval(mv, t));

            filter.append(sink, state.sdir, mv.print_time, next.t)?;

            state.seek_delta = (next.t - last_t).max(EPSILON);
            if state.is_dir_change && state.seek_delta > SEEK_DELTA_INITIAL {
                state.seek_delta = SEEK_DELTA_INITIAL;
            }
            state.is_dir_change = false;

            last_t = next.t;
            last_p = target + signed_half;
            low = next;

            if low.t < high.t {
                continue 'walk;
            }
            // else: bracket is exhausted, fall through to widen below.
        } else if dist > 0.0 && dist < half {
            // Partial progress. If a step is pending in the filter and the projection has
            // flattened out (no further motion toward `high`), commit it now rather than risk
            // it being rolled back by a later spurious oscillation.
            if filter.has_pending() && diff.abs() < EPSILON {
                filter.force_commit(sink)?;
            }
        } else if dist < -(half + EPSILON) {
            state.is_dir_change = true;
            if state.seek_delta > SEEK_DELTA_INITIAL {
                state.seek_delta = SEEK_DELTA_INITIAL;
            }
            if low.t > last_t {
                state.sdir = state.sdir.opposite();
            } else {
                high.t = last_t + (high.t - last_t) / 2.0;
                high.p = projection.eval(mv, high.t);
            }
            continue 'walk;
        }

        if high.t >= end {
            break;
        }
        low = high;
        let mut candidate = last_t + state.seek_delta;
        while candidate <= low.t {
            state.seek_delta *= 2.0;
            candidate = last_t + state.seek_delta;
        }
        let clamped_t = candidate.min(end);
        high = Bracket {
            t: clamped_t,
            p: projection.eval(mv, clamped_t),
        };
        debug_assert!(high.p.is_finite(), "projection must be finite on its domain");
    }

    filter.flush(sink, mv.print_time, end)?;
    *commanded_pos = last_p;
    projection.post_step();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::CartesianProjection;
    use crate::sink::test_support::RecordingSink;

    fn linear_move(v: f64, duration: f64) -> Move {
        Move {
            print_time: 0.0,
            move_t: duration,
            start_pos: [0.0, 0.0, 0.0],
            axes_r: [1.0, 0.0, 0.0],
            c1: v,
            c2: 0.0,
            c3: 0.0,
        }
    }

    #[test]
    fn linear_motion_emits_evenly_spaced_steps() {
        let mv = linear_move(10.0, 1.0);
        let mut proj = CartesianProjection { axis: 0 };
        let mut filter = ReversalFilter::new();
        let mut sink = RecordingSink::new();
        let mut state = SolverState::default();
        let mut commanded_pos = 0.0;

        solve_range(
            &mv,
            0.0,
            1.0,
            &mut commanded_pos,
            &mut state,
            0.01,
            &mut proj,
            &mut filter,
            &mut sink,
        )
        .unwrap();
        // The last half-step crossing lands within the filter window of the move's end, so it is
        // still held pending here; a driver that knows no further activity is coming finalises it
        // the same way once the queue is exhausted (see `StepperKinematics::flush`).
        if filter.has_pending() {
            filter.force_commit(&mut sink).unwrap();
        }

        assert_eq!(sink.steps.len(), 1000);
        for (k, step) in sink.steps.iter().enumerate() {
            let expected = (k as f64 + 0.5) * 0.001;
            assert!(
                (step.time - expected).abs() < 1e-6,
                "step {k} at {} expected near {expected}",
                step.time
            );
            assert_eq!(step.direction, Direction::Positive);
        }
        assert!((commanded_pos - 10.0).abs() < 1e-6);
    }

    #[test]
    fn stationary_move_emits_nothing() {
        let mv = linear_move(0.0, 1.0);
        let mut proj = CartesianProjection { axis: 0 };
        let mut filter = ReversalFilter::new();
        let mut sink = RecordingSink::new();
        let mut state = SolverState::default();
        let mut commanded_pos = 0.0;

        solve_range(
            &mv,
            0.0,
            1.0,
            &mut commanded_pos,
            &mut state,
            0.01,
            &mut proj,
            &mut filter,
            &mut sink,
        )
        .unwrap();

        assert!(sink.steps.is_empty());
        assert_eq!(commanded_pos, 0.0);
    }

    #[test]
    fn sink_error_aborts_without_updating_commanded_pos() {
        let mv = linear_move(10.0, 1.0);
        let mut proj = CartesianProjection { axis: 0 };
        let mut filter = ReversalFilter::new();
        let mut sink = RecordingSink::failing_on(4);
        let mut state = SolverState::default();
        let mut commanded_pos = 0.0;

        let result = solve_range(
            &mv,
            0.0,
            1.0,
            &mut commanded_pos,
            &mut state,
            0.01,
            &mut proj,
            &mut filter,
            &mut sink,
        );

        assert!(result.is_err());
        assert_eq!(commanded_pos, 0.0);
    }

    #[test]
    fn reversal_flips_direction_once() {
        // p(t) = sin(2*pi*t) mm, one full period, step_dist = 0.1mm.
        struct Sine;
        impl Projection for Sine {
            fn eval(&self, _mv: &Move, t: f64) -> f64 {
                let two_pi = 2.0 * core::f64::consts::PI;
                (two_pi * t).sin()
            }
        }
        let mv = linear_move(0.0, 1.0); // coefficients unused by Sine
        let mut proj = Sine;
        let mut filter = ReversalFilter::new();
        let mut sink = RecordingSink::new();
        let mut state = SolverState::default();
        let mut commanded_pos = 0.0;

        solve_range(
            &mv,
            0.0,
            1.0,
            &mut commanded_pos,
            &mut state,
            0.1,
            &mut proj,
            &mut filter,
            &mut sink,
        )
        .unwrap();

        let mut flips = 0;
        let mut last_dir = sink.steps[0].direction;
        for step in &sink.steps[1..] {
            if step.direction != last_dir {
                flips += 1;
                last_dir = step.direction;
            }
        }
        // Up leg, then down leg, then back up: two reversals over a full period.
        assert_eq!(flips, 2);
    }
}
