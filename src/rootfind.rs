//! The false-position root finder (component E).
//!
//! Locates the time at which a (not necessarily monotone, not necessarily invertible)
//! projection first crosses a target value, given a bracket `[low, high]` that is assumed to
//! have been produced by the range solver's adaptive widening.

use crate::EPSILON;

/// One endpoint of a root-finder bracket: a time and the projection's value there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub t: f64,
    pub p: f64,
}

fn same_sign(a: f64, b: f64) -> bool {
    (a >= 0.0) == (b >= 0.0)
}

/// Finds the time at which `projection(t) == target`, searching within `[low.t, high.t]`.
///
/// `projection` is evaluated only at times within the bracket. Returns the converged bracket
/// point `(t, projection(t))` — not `(t, target)` — so callers can compute an accurate residual.
///
/// If `low` and `high` share the same sign of `f(t) = projection(t) - target`, the target is not
/// bracketed; this is not an error, it signals "step at the bracket's low time" to the caller
/// (used during direction-change retries in the range solver), and `(low.t, target)` is returned.
pub fn false_position<F>(low: Bracket, high: Bracket, target: f64, projection: F) -> Bracket
where
    F: Fn(f64) -> f64,
{
    let f_low = low.p - target;
    let f_high = high.p - target;

    if f_high == 0.0 {
        return Bracket {
            t: high.t,
            p: target,
        };
    }
    if same_sign(f_low, f_high) {
        return Bracket {
            t: low.t,
            p: target,
        };
    }

    let mut lo = low;
    let mut hi = high;
    let mut f_lo = f_low;
    let mut f_hi = f_high;
    let mut prev_t_g = f64::INFINITY;

    loop {
        let t_g = (lo.t * f_hi - hi.t * f_lo) / (f_hi - f_lo);
        let p_g = projection(t_g);
        let f_g = p_g - target;

        if same_sign(f_g, f_hi) {
            hi = Bracket { t: t_g, p: p_g };
            f_hi = f_g;
        } else {
            lo = Bracket { t: t_g, p: p_g };
            f_lo = f_g;
        }

        if (t_g - prev_t_g).abs() < EPSILON {
            return Bracket { t: t_g, p: p_g };
        }
        prev_t_g = t_g;
    }
}
