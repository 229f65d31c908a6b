//! The move queue view (component B).
//!
//! The original design is an intrusive doubly-linked list of moves terminated by sentinels at
//! both ends, so the solver can step one past either end unconditionally. This implementation
//! uses a fixed-capacity arena (`heapless::Vec<Move, N>`) with index-based links instead of raw
//! pointers: index `0` and index `len()` play the role of the two sentinels. Stepping past either
//! end yields an index outside `0..len()`, which every lookup (`get`) turns into `None` rather
//! than a read — the core never dereferences a sentinel, it just stops walking when `get` comes
//! back empty.
//!
//! The queue is read-only to the solver; the external planner owns mutation and must not shrink
//! or reorder moves the solver still depends on (see the concurrency notes in the crate's
//! top-level spec).

use heapless::Vec;

use crate::error::QueueError;
use crate::projection::Axis;

/// Default capacity of the move arena when a stepper doesn't name one explicitly. Sized well
/// past the largest lookahead window any test or bench in this crate pushes through a single
/// queue; a host integrator who needs more can name `N` explicitly (`MoveQueue::<8192>::new()`).
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// A single planned move: a smooth Cartesian trajectory with a start time and duration.
///
/// The scalar distance travelled along `axes_r` at time `t` (measured from `print_time`) is
/// `c1*t + c2*t^2 + c3*t^3`. Only [`crate::projection::Projection`] implementations read these
/// coefficients; the solver core treats them as opaque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    /// Absolute start time of the move on the master clock.
    pub print_time: f64,
    /// Duration; the move is live on `[print_time, print_time + move_t]`.
    pub move_t: f64,
    /// Cartesian position at the start of the move.
    pub start_pos: [f64; 3],
    /// Unit vector giving the Cartesian direction of the move; a component is zero iff that
    /// axis does not change during the move.
    pub axes_r: [f64; 3],
    /// Linear, quadratic, and cubic coefficients of the scalar distance-along-`axes_r`
    /// polynomial.
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
}

impl Move {
    /// A zero-velocity move that sits motionless at `pos` for `duration` seconds, used to
    /// implement `calc_position_from_coord` / `set_position` on an ephemeral move.
    pub fn stationary(print_time: f64, duration: f64, pos: [f64; 3]) -> Self {
        Move {
            print_time,
            move_t: duration,
            start_pos: pos,
            axes_r: [0.0, 0.0, 0.0],
            c1: 0.0,
            c2: 0.0,
            c3: 0.0,
        }
    }

    /// Absolute time at which this move ends.
    pub fn end_time(&self) -> f64 {
        self.print_time + self.move_t
    }

    /// Scalar distance travelled along `axes_r` at `t` seconds into the move.
    pub fn distance(&self, t: f64) -> f64 {
        t * (self.c1 + t * (self.c2 + t * self.c3))
    }

    /// Whether any of the axes in `mask` are non-zero for this move, i.e. whether a stepper
    /// registered for those axes could move during this move.
    pub fn active_for(&self, mask: Axis) -> bool {
        (mask.contains(Axis::X) && self.axes_r[0] != 0.0)
            || (mask.contains(Axis::Y) && self.axes_r[1] != 0.0)
            || (mask.contains(Axis::Z) && self.axes_r[2] != 0.0)
    }
}

/// A time-ordered arena of moves, read-only to the solver.
///
/// Backed by a fixed-capacity `heapless::Vec` rather than a growable one: this crate's no_std
/// path has no allocator, and the design notes call for no heap allocation anywhere in the hot
/// path. `N` is the arena's capacity in moves; it defaults to [`DEFAULT_QUEUE_CAPACITY`].
#[derive(Debug, Clone)]
pub struct MoveQueue<const N: usize = DEFAULT_QUEUE_CAPACITY> {
    moves: Vec<Move, N>,
}

impl<const N: usize> Default for MoveQueue<N> {
    fn default() -> Self {
        MoveQueue { moves: Vec::new() }
    }
}

impl<const N: usize> MoveQueue<N> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        MoveQueue { moves: Vec::new() }
    }

    /// Appends a move to the tail of the queue.
    ///
    /// Returns [`QueueError::MalformedSentinels`] if the move does not start exactly where the
    /// current tail ends, preserving the contiguity invariant the solver relies on.
    /// Returns [`QueueError::Full`] if the arena's capacity `N` is already exhausted.
    pub fn push(&mut self, mv: Move) -> Result<(), QueueError> {
        if let Some(tail) = self.moves.last() {
            let gap = mv.print_time - tail.end_time();
            if gap.abs() > crate::EPSILON {
                return Err(QueueError::MalformedSentinels);
            }
        }
        self.moves.push(mv).map_err(|_| QueueError::Full)?;
        Ok(())
    }

    /// Verifies the queue's well-formedness: moves are contiguous and non-decreasing in time.
    /// An empty queue is well-formed (there is simply nothing to solve).
    pub fn check_sentinels(&self) -> Result<(), QueueError> {
        for pair in self.moves.windows(2) {
            let gap = pair[1].print_time - pair[0].end_time();
            if gap.abs() > crate::EPSILON {
                return Err(QueueError::MalformedSentinels);
            }
        }
        Ok(())
    }

    /// Number of moves currently resident.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether the queue holds no moves.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Borrows the move at `index`, or `None` if `index` has walked past either sentinel
    /// (`index >= len()` past the tail, there is no "before index 0" representation since
    /// indices are unsigned — callers check `index == 0` before decrementing).
    pub fn get(&self, index: usize) -> Option<&Move> {
        self.moves.get(index)
    }

    /// Index of the first move, or `None` if the queue is empty (both sentinels coincide).
    pub fn first_index(&self) -> Option<usize> {
        if self.moves.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(print_time: f64, move_t: f64) -> Move {
        Move {
            print_time,
            move_t,
            start_pos: [0.0, 0.0, 0.0],
            axes_r: [1.0, 0.0, 0.0],
            c1: 1.0,
            c2: 0.0,
            c3: 0.0,
        }
    }

    #[test]
    fn contiguous_pushes_succeed() {
        let mut q = MoveQueue::new();
        q.push(mv(0.0, 1.0)).unwrap();
        q.push(mv(1.0, 1.0)).unwrap();
        assert_eq!(q.len(), 2);
        assert!(q.check_sentinels().is_ok());
    }

    #[test]
    fn gap_is_rejected() {
        let mut q = MoveQueue::new();
        q.push(mv(0.0, 1.0)).unwrap();
        assert_eq!(q.push(mv(1.5, 1.0)), Err(QueueError::MalformedSentinels));
    }

    #[test]
    fn walking_past_either_end_yields_none() {
        let mut q = MoveQueue::new();
        q.push(mv(0.0, 1.0)).unwrap();
        assert!(q.get(1).is_none());
        assert_eq!(q.first_index(), Some(0));
    }

    #[test]
    fn push_past_capacity_is_rejected() {
        let mut q: MoveQueue<2> = MoveQueue::new();
        q.push(mv(0.0, 1.0)).unwrap();
        q.push(mv(1.0, 1.0)).unwrap();
        assert_eq!(q.push(mv(2.0, 1.0)), Err(QueueError::Full));
    }

    #[test]
    fn empty_queue_is_well_formed() {
        let q = MoveQueue::new();
        assert!(q.check_sentinels().is_ok());
        assert_eq!(q.first_index(), None);
    }
}
