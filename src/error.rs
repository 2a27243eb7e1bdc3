// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Errors raised while mixing a new iterate into the history
pub enum AccelerationError {
    /// The flattened length of an argument disagrees with the established dimension
    #[error("{argument} has {found} elements, expected {expected}")]
    #[diagnostic(code(transporter_anderson::shape_mismatch))]
    ShapeMismatch {
        /// Which argument was rejected
        argument: &'static str,
        /// The flattened length the accelerator expected
        expected: usize,
        /// The flattened length it received
        found: usize,
    },
    /// The iterate and the residual were passed with different shapes
    #[error("iterate has shape {iterate}, residual has shape {residual}")]
    #[diagnostic(code(transporter_anderson::shape_mismatch))]
    IncompatibleShapes {
        /// Debug rendering of the iterate shape
        iterate: String,
        /// Debug rendering of the residual shape
        residual: String,
    },
    /// A flat vector could not be restored to the caller's shape
    #[error("Failed to reshape: {0}")]
    Reshape(String),
    /// The history no longer satisfies its invariants, this is a defect in the accelerator
    #[error("Anderson history is corrupted: {0}")]
    #[diagnostic(
        code(transporter_anderson::invariant_violation),
        help("this is a bug in the accelerator, not in the calling solver")
    )]
    InvariantViolation(String),
}

impl From<ndarray::ShapeError> for AccelerationError {
    fn from(e: ndarray::ShapeError) -> Self {
        Self::Reshape(e.to_string())
    }
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Errors raised by the fixed-point loop
pub enum SolverError {
    /// Mixing failed
    #[error(transparent)]
    Acceleration(#[from] AccelerationError),
    /// The problem could not evaluate its preconditioned residual
    #[error("Failed to evaluate the residual: {0}")]
    Problem(String),
    /// The loop reached its iteration limit
    #[error("Reached maximum iteration count {iterations} with residual norm {residual_norm}")]
    Unconverged {
        /// Iterations carried out
        iterations: usize,
        /// Norm of the last preconditioned residual
        residual_norm: f64,
    },
}
