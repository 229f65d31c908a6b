//! # itersolve
//!
//! The iterative step-time solver at the heart of a 3D-printer motion controller.
//!
//! Given a time-ordered queue of planned Cartesian [`Move`]s and a [`Projection`] that maps
//! Cartesian position (at a time within a move) to the scalar position of one physical stepper
//! motor, this crate produces the exact sequence of step times and directions the motor must
//! execute so that its position follows the trajectory to within half a step.
//!
//! ## What this crate is not
//!
//! It does not plan moves (that's the trajectory planner, an external collaborator), does not
//! compress steps into hardware instructions (the step sink, also external), does not know the
//! physical units of any motor, and does not perform any I/O. It is a pure, allocation-free
//! library (the move arena is a fixed-capacity `heapless::Vec`) meant to be linked into a larger
//! host process.
//!
//! ## Layout
//!
//! - [`queue`]: the move arena and its sentinel-bounded cursor (component B).
//! - [`projection`]: the `Projection` trait and two reference kinematic projections (component A).
//! - [`sink`]: the `StepSink` trait consumed by the range solver (component C).
//! - [`reversal_filter`]: suppression of spurious step/anti-step pairs near a reversal (D).
//! - [`rootfind`]: the false-position root finder (E).
//! - [`range_solver`]: walks one move across a time range, calling E and D (F).
//! - [`stepper`]: `StepperKinematics`, the flush driver tying everything together (G).

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod projection;
pub mod queue;
pub mod range_solver;
pub mod reversal_filter;
pub mod rootfind;
pub mod sink;
pub mod stepper;

pub use error::{FlushError, QueueError, SinkError};
pub use projection::{Axis, CartesianProjection, CoreXyProjection, Projection};
pub use queue::{Move, MoveQueue};
pub use sink::{Direction, StepSink};
pub use stepper::StepperKinematics;

/// Numerical tolerance shared by the root finder's convergence check and several tie-breakers
/// throughout the solver. Bound to one constant per the design notes, rather than re-derived at
/// each call site.
pub const EPSILON: f64 = 1e-9;

/// The initial (and post-reversal-clamped) adaptive bracket probe size, in seconds.
pub const SEEK_DELTA_INITIAL: f64 = 100e-6;
