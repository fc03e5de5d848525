use thiserror::Error;
use tracing::trace;

/// Stopping rules for [`bisect`].
///
/// The search stops once the bracket half-width drops below
/// `tolerance + relative_tolerance · |x|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BisectionOptions {
    /// Absolute tolerance on the root, in the units of `x`.
    pub tolerance: f64,
    /// Relative tolerance on the root.
    pub relative_tolerance: f64,
    /// Maximum number of halvings before giving up.
    pub max_iterations: u32,
}

impl Default for BisectionOptions {
    fn default() -> Self {
        Self {
            tolerance: 2e-12,
            relative_tolerance: 4.0 * f64::EPSILON,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub x: f64,
    pub iterations: u32,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RootError {
    #[error("Invalid bracket [{lower}, {upper}]")]
    InvalidBracket { lower: f64, upper: f64 },

    #[error(
        "Function has the same sign at both ends of [{lower}, {upper}] (f = {f_lower:.3e}, {f_upper:.3e})"
    )]
    NoSignChange {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    #[error("Function is not finite at x = {x}: {value}")]
    NonFinite { x: f64, value: f64 },

    #[error("Bisection did not converge after {iterations} iterations (bracket width {width:.3e})")]
    NotConverged { iterations: u32, width: f64 },
}

/// Finds a root of `f` inside `[lower, upper]` by bisection.
///
/// # Errors
///
/// Fails if the bracket is empty, `f` has the same sign at both ends, `f` returns a
/// non-finite value, or the tolerance is not met within `max_iterations` halvings.
pub fn bisect<F>(mut f: F, lower: f64, upper: f64, options: &BisectionOptions) -> Result<Root, RootError>
where
    F: FnMut(f64) -> f64,
{
    if !lower.is_finite() || !upper.is_finite() || upper <= lower {
        return Err(RootError::InvalidBracket { lower, upper });
    }

    let f_lower = finite(lower, f(lower))?;
    let f_upper = finite(upper, f(upper))?;
    if f_lower == 0.0 {
        return Ok(Root { x: lower, iterations: 0 });
    }
    if f_upper == 0.0 {
        return Ok(Root { x: upper, iterations: 0 });
    }
    if f_lower.signum() == f_upper.signum() {
        return Err(RootError::NoSignChange {
            lower,
            upper,
            f_lower,
            f_upper,
        });
    }

    let mut a = lower;
    let mut width = upper - lower;
    for iteration in 1..=options.max_iterations {
        width *= 0.5;
        let mid = a + width;
        let f_mid = finite(mid, f(mid))?;
        trace!(iteration, x = mid, residual = f_mid, "bisection step");
        if f_mid.signum() == f_lower.signum() {
            a = mid;
        }
        if f_mid == 0.0 || width.abs() < options.tolerance + options.relative_tolerance * mid.abs() {
            return Ok(Root {
                x: mid,
                iterations: iteration,
            });
        }
    }

    Err(RootError::NotConverged {
        iterations: options.max_iterations,
        width,
    })
}

#[inline]
fn finite(x: f64, value: f64) -> Result<f64, RootError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RootError::NonFinite { x, value })
    }
}
