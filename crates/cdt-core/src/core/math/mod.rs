//! Numerical kernels used by the thermodynamic layer.
//!
//! - [`quadrature`] - Composite adaptive Simpson integration
//! - [`roots`] - Bracketing bisection with absolute and relative stopping rules

pub mod quadrature;
pub mod roots;

pub use roots::{BisectionOptions, Root, RootError, bisect};
